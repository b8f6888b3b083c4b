use std::fmt;

use payrule_decimal::{normalize, Decimal};

/// A runtime value. The DSL has no richer type system: booleans are the
/// numbers 1 and 0, and text is coerced permissively whenever it meets an
/// arithmetic operator. The empty string doubles as the DSL's null (what
/// `COALESCE` skips and `SQRT(-4)` returns).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(Decimal),
    Text(String),
}

impl Value {
    pub fn from_bool(b: bool) -> Self {
        Value::Number(if b { Decimal::ONE } else { Decimal::ZERO })
    }

    /// The DSL null: an empty text value.
    pub fn null() -> Self {
        Value::Text(String::new())
    }

    /// Numeric view; text goes through the permissive [`normalize`].
    pub fn as_decimal(&self) -> Decimal {
        match self {
            Value::Number(d) => *d,
            Value::Text(s) => normalize(Some(s)),
        }
    }

    /// Boolean view: anything comparing nonzero is true.
    pub fn is_truthy(&self) -> bool {
        !self.as_decimal().is_zero()
    }

    /// True for the empty/whitespace text that stands in for null.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Strip trailing zeros so `2 + 3 * 4` reads "14", not "14.00".
            Value::Number(d) => write!(f, "{}", d.normalize()),
            Value::Text(s) => f.write_str(s),
        }
    }
}
