//! Conditional builtins. Both are non-strict: only the branch/argument the
//! outcome needs is ever evaluated, so a formula can guard an expensive or
//! failing resolution behind a condition.

use crate::ast::Expr;
use crate::error::EngineError;
use crate::eval::Evaluator;
use crate::functions::expect_args;
use crate::value::Value;

pub(super) fn if_fn(
    ev: &mut Evaluator<'_>,
    name: &str,
    args: &[Expr],
) -> Result<Value, EngineError> {
    expect_args(name, args, 3, 3, "exactly 3")?;
    let condition = ev.eval(&args[0])?;
    let branch = if condition.is_truthy() { &args[1] } else { &args[2] };
    ev.eval(branch)
}

pub(super) fn coalesce_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("COALESCE", args, 1, 255, "at least 1")?;
    for arg in args {
        let value = ev.eval(arg)?;
        if !value.is_empty() {
            return Ok(value);
        }
    }
    Ok(Value::null())
}
