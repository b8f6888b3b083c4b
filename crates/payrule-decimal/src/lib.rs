#![forbid(unsafe_code)]

//! Exact-decimal arithmetic for payroll/tax formulas.
//!
//! Every operation works on [`rust_decimal::Decimal`] at an explicit scale;
//! native floating point never appears in the computation path. Inputs from
//! loosely-typed external systems go through [`normalize`], which coerces
//! anything vaguely numeric into a decimal and everything else into zero.
//!
//! Expected financial edge cases (zero divisor, negative square root, percent
//! change against a zero base) yield `None` rather than an error so callers
//! can guard with their own fallback logic. The fail-fast variants ([`div`])
//! return [`DecimalError`] instead.

mod allocate;
mod financial;
mod ops;
mod round;

pub use allocate::allocate;
pub use financial::{
    apply_discount, discount_amount, gross_from_net, net_from_gross, percent, percent_change,
    tax_from_net,
};
pub use ops::{
    add, cmp_at, div, eq, gt, gte, lt, lte, max, min, mul, normalize, pow, rem, sqrt, sub, try_div,
};
pub use round::{round, RoundingMode};

pub use rust_decimal::Decimal;

/// Internal scale used when the caller does not supply one.
///
/// Large enough that chained formulas (rates of rates, prorated fractions)
/// do not truncate prematurely; final presentation rounding is a separate,
/// explicit [`round`] step.
pub const DEFAULT_SCALE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    #[error("division by zero")]
    DivisionByZero,
}
