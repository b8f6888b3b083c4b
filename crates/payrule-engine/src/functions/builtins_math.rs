//! Numeric builtins, all backed by the decimal library's primitives.

use payrule_decimal as dec;
use payrule_decimal::{Decimal, RoundingMode};
use rust_decimal::prelude::ToPrimitive;

use crate::ast::Expr;
use crate::error::EngineError;
use crate::eval::Evaluator;
use crate::functions::expect_args;
use crate::value::Value;

const VAR_ARGS: usize = 255;

pub(super) fn min_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("MIN", args, 1, VAR_ARGS, "at least 1")?;
    let values = eval_optional_decimals(ev, args)?;
    Ok(Value::Number(dec::min(values)))
}

pub(super) fn max_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("MAX", args, 1, VAR_ARGS, "at least 1")?;
    let values = eval_optional_decimals(ev, args)?;
    Ok(Value::Number(dec::max(values)))
}

pub(super) fn abs_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("ABS", args, 1, 1, "exactly 1")?;
    let value = ev.eval(&args[0])?.as_decimal();
    Ok(Value::Number(value.abs()))
}

pub(super) fn floor_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("FLOOR", args, 1, 1, "exactly 1")?;
    let value = ev.eval(&args[0])?.as_decimal();
    Ok(Value::Number(dec::round(value, 0, RoundingMode::Floor)))
}

pub(super) fn ceil_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("CEIL", args, 1, 1, "exactly 1")?;
    let value = ev.eval(&args[0])?.as_decimal();
    Ok(Value::Number(dec::round(value, 0, RoundingMode::Ceil)))
}

pub(super) fn truncate_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("TRUNCATE", args, 1, 2, "1 or 2")?;
    let value = ev.eval(&args[0])?.as_decimal();
    let precision = optional_precision(ev, args.get(1), "TRUNCATE")?;
    Ok(Value::Number(dec::round(
        value,
        precision,
        RoundingMode::Truncate,
    )))
}

pub(super) fn round_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("ROUND", args, 1, 3, "1 to 3")?;
    let value = ev.eval(&args[0])?.as_decimal();
    let precision = optional_precision(ev, args.get(1), "ROUND")?;
    let mode = match args.get(2) {
        None => RoundingMode::default(),
        Some(arg) => {
            let name = super::text_arg(ev, arg, "ROUND")?;
            RoundingMode::parse(&name).ok_or_else(|| EngineError::InvalidArgument {
                function: "ROUND".to_string(),
                message: format!("unknown rounding mode `{name}`"),
            })?
        }
    };
    Ok(Value::Number(dec::round(value, precision, mode)))
}

pub(super) fn mod_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("MOD", args, 2, 2, "exactly 2")?;
    let a = ev.eval(&args[0])?.as_decimal();
    let b = ev.eval(&args[1])?.as_decimal();
    dec::rem(a, b)
        .map(Value::Number)
        .ok_or(EngineError::DivisionByZero)
}

pub(super) fn pow_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("POW", args, 2, 2, "exactly 2")?;
    let base = ev.eval(&args[0])?.as_decimal();
    let exp = ev.eval(&args[1])?.as_decimal();
    dec::pow(base, exp, ev.scale())
        .map(Value::Number)
        .ok_or_else(|| EngineError::InvalidArgument {
            function: "POW".to_string(),
            message: format!("{base}^{exp} is out of range"),
        })
}

/// Negative input is an expected financial edge case: the result is the DSL
/// null, so `COALESCE(SQRT(x), 0)` works as a guard.
pub(super) fn sqrt_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("SQRT", args, 1, 1, "exactly 1")?;
    let value = ev.eval(&args[0])?.as_decimal();
    Ok(dec::sqrt(value, ev.scale())
        .map(Value::Number)
        .unwrap_or_else(Value::null))
}

pub(super) fn percent_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("PERCENT", args, 2, 2, "exactly 2")?;
    let base = ev.eval(&args[0])?.as_decimal();
    let rate = ev.eval(&args[1])?.as_decimal();
    Ok(Value::Number(dec::percent(base, rate, ev.scale())))
}

/// Evaluate variadic arguments, mapping the null (empty-text) value to
/// `None` so the decimal `min`/`max` filters skip it.
fn eval_optional_decimals(
    ev: &mut Evaluator<'_>,
    args: &[Expr],
) -> Result<Vec<Option<Decimal>>, EngineError> {
    args.iter()
        .map(|arg| {
            let value = ev.eval(arg)?;
            Ok((!value.is_empty()).then(|| value.as_decimal()))
        })
        .collect()
}

fn optional_precision(
    ev: &mut Evaluator<'_>,
    arg: Option<&Expr>,
    function: &str,
) -> Result<i32, EngineError> {
    let Some(arg) = arg else { return Ok(0) };
    let value = ev.eval(arg)?.as_decimal();
    value
        .to_i32()
        .filter(|p| (-28..=28).contains(p))
        .ok_or_else(|| EngineError::InvalidArgument {
            function: function.to_string(),
            message: format!("precision {value} is out of range"),
        })
}
