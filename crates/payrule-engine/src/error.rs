use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Byte range in the formula source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A lex/parse fault, carrying the offending source range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at offset {})", span.start)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Stable machine-readable codes surfaced to formula authors and audit tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    #[serde(rename = "SYNTAX_ERROR")]
    SyntaxError,
    #[serde(rename = "UNDEFINED_VARIABLE")]
    UndefinedVariable,
    #[serde(rename = "UNDEFINED_FUNCTION")]
    UndefinedFunction,
    #[serde(rename = "DIVISION_BY_ZERO")]
    DivisionByZero,
    #[serde(rename = "PARAM_NOT_FOUND")]
    ParamNotFound,
    /// Reserved for future typed comparisons; never produced today.
    #[serde(rename = "TYPE_MISMATCH")]
    TypeMismatch,
}

impl ErrorCode {
    pub fn as_code(self) -> &'static str {
        match self {
            ErrorCode::SyntaxError => "SYNTAX_ERROR",
            ErrorCode::UndefinedVariable => "UNDEFINED_VARIABLE",
            ErrorCode::UndefinedFunction => "UNDEFINED_FUNCTION",
            ErrorCode::DivisionByZero => "DIVISION_BY_ZERO",
            ErrorCode::ParamNotFound => "PARAM_NOT_FOUND",
            ErrorCode::TypeMismatch => "TYPE_MISMATCH",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Any fault an evaluation can raise. The facade converts these into the
/// result struct; they never escape as panics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Syntax(#[from] ParseError),
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
    #[error("unknown function `{0}`")]
    UndefinedFunction(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("parameter `{key}` has no value on {date}")]
    ParamNotFound { key: String, date: NaiveDate },
    #[error("{function} expects {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: &'static str,
        got: usize,
    },
    #[error("invalid argument to {function}: {message}")]
    InvalidArgument { function: String, message: String },
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Syntax(_) => ErrorCode::SyntaxError,
            EngineError::UndefinedVariable(_) => ErrorCode::UndefinedVariable,
            EngineError::UndefinedFunction(_) => ErrorCode::UndefinedFunction,
            EngineError::DivisionByZero => ErrorCode::DivisionByZero,
            EngineError::ParamNotFound { .. } => ErrorCode::ParamNotFound,
            // Malformed calls are source-level mistakes, same bucket as a
            // parse failure.
            EngineError::Arity { .. } | EngineError::InvalidArgument { .. } => {
                ErrorCode::SyntaxError
            }
        }
    }
}

impl From<payrule_decimal::DecimalError> for EngineError {
    fn from(err: payrule_decimal::DecimalError) -> Self {
        match err {
            payrule_decimal::DecimalError::DivisionByZero => EngineError::DivisionByZero,
        }
    }
}
