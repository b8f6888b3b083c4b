//! Fixed builtin dispatch.
//!
//! The DSL's function set is closed: a name either matches a builtin below,
//! is a country-specific tax function the configured collaborator claims, or
//! fails with `UNDEFINED_FUNCTION`. Builtins receive unevaluated argument
//! expressions so the non-strict forms (`IF`, `COALESCE`) can evaluate only
//! what they need.

mod builtins_logical;
mod builtins_math;
mod builtins_payroll;

use crate::ast::{CallExpr, Expr};
use crate::error::EngineError;
use crate::eval::Evaluator;
use crate::value::Value;

pub(crate) fn dispatch(ev: &mut Evaluator<'_>, call: &CallExpr) -> Result<Value, EngineError> {
    let args = call.args.as_slice();
    match call.name.as_str() {
        "MIN" => builtins_math::min_fn(ev, args),
        "MAX" => builtins_math::max_fn(ev, args),
        "ABS" => builtins_math::abs_fn(ev, args),
        "FLOOR" => builtins_math::floor_fn(ev, args),
        "CEIL" => builtins_math::ceil_fn(ev, args),
        "TRUNCATE" => builtins_math::truncate_fn(ev, args),
        "ROUND" => builtins_math::round_fn(ev, args),
        "MOD" => builtins_math::mod_fn(ev, args),
        "POW" => builtins_math::pow_fn(ev, args),
        "SQRT" => builtins_math::sqrt_fn(ev, args),
        "PERCENT" => builtins_math::percent_fn(ev, args),
        "IF" | "IIF" => builtins_logical::if_fn(ev, &call.name, args),
        "COALESCE" => builtins_logical::coalesce_fn(ev, args),
        "PARAM" => builtins_payroll::param_fn(ev, args),
        "EMP_PARAM" => builtins_payroll::emp_param_fn(ev, args),
        "SUM_GROUP" => builtins_payroll::sum_group_fn(ev, args),
        "TIER_CALC" => builtins_payroll::tier_calc_fn(ev, args),
        name => builtins_payroll::named_tax_fn(ev, name, args),
    }
}

/// Enforce an argument-count range for `function`.
fn expect_args(
    function: &str,
    args: &[Expr],
    min: usize,
    max: usize,
    expected: &'static str,
) -> Result<(), EngineError> {
    if args.len() < min || args.len() > max {
        return Err(EngineError::Arity {
            function: function.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

/// Evaluate an argument that must carry text (a key, a mode name, a date).
fn text_arg(ev: &mut Evaluator<'_>, expr: &Expr, function: &str) -> Result<String, EngineError> {
    match ev.eval(expr)? {
        Value::Text(s) => Ok(s),
        Value::Number(d) => Err(EngineError::InvalidArgument {
            function: function.to_string(),
            message: format!("expected a string argument, got the number {d}"),
        }),
    }
}
