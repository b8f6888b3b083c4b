//! External-value builtins: parameters, concept groups, and progressive tax
//! delegation. Resolution order is always resolver callback first, static
//! fallback second, hard error last — a missing parameter is a configuration
//! problem, not something to paper over with zero.

use chrono::NaiveDate;
use payrule_decimal as dec;

use crate::ast::Expr;
use crate::error::EngineError;
use crate::eval::{Evaluator, ParamScope, ParamUsage, TierMode};
use crate::functions::{expect_args, text_arg};
use crate::value::Value;

pub(super) fn param_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("PARAM", args, 1, 2, "1 or 2")?;
    let key = text_arg(ev, &args[0], "PARAM")?;
    let date = optional_date(ev, args.get(1), "PARAM")?.unwrap_or_else(|| ev.date());

    let resolved = ev
        .opts()
        .param_resolver
        .and_then(|r| r.resolve(&key, date))
        .or_else(|| ev.opts().fallback_params.get(&key).cloned());

    let Some(raw) = resolved else {
        return Err(EngineError::ParamNotFound { key, date });
    };
    let value = dec::normalize(Some(&raw));
    ev.trace(format!("param {key}@{date} = {value}"));
    ev.record_param(
        key,
        ParamUsage {
            value: raw,
            date,
            scope: ParamScope::Global,
            employee_id: None,
        },
    );
    Ok(Value::Number(value))
}

pub(super) fn emp_param_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("EMP_PARAM", args, 1, 3, "1 to 3")?;
    let key = text_arg(ev, &args[0], "EMP_PARAM")?;
    let employee_id = match args.get(1) {
        Some(arg) => Some(ev.eval(arg)?.to_string()),
        None => ev.ctx().employee_id.clone(),
    };
    let date = optional_date(ev, args.get(2), "EMP_PARAM")?.unwrap_or_else(|| ev.date());

    let resolved = ev
        .opts()
        .emp_param_resolver
        .and_then(|r| r.resolve(&key, employee_id.as_deref(), date))
        .or_else(|| {
            let emp = employee_id.clone()?;
            ev.opts()
                .fallback_emp_params
                .get(&(emp, key.clone()))
                .cloned()
        });

    let Some(raw) = resolved else {
        return Err(EngineError::ParamNotFound { key, date });
    };
    let value = dec::normalize(Some(&raw));
    let emp_display = employee_id.as_deref().unwrap_or("-");
    ev.trace(format!("emp_param {key}@{date} [{emp_display}] = {value}"));
    ev.record_param(
        key,
        ParamUsage {
            value: raw,
            date,
            scope: ParamScope::Employee,
            employee_id,
        },
    );
    Ok(Value::Number(value))
}

pub(super) fn sum_group_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("SUM_GROUP", args, 1, 1, "exactly 1")?;
    let code = text_arg(ev, &args[0], "SUM_GROUP")?;

    if let Some(resolver) = ev.opts().group_resolver {
        if let Some(raw) = resolver.resolve(&code, &ev.ctx().concepts) {
            let value = dec::normalize(Some(&raw));
            ev.trace(format!("sum_group {code} = {value} (resolver)"));
            return Ok(Value::Number(value));
        }
    }
    Ok(Value::Number(ev.sum_group_fallback(&code)))
}

pub(super) fn tier_calc_fn(ev: &mut Evaluator<'_>, args: &[Expr]) -> Result<Value, EngineError> {
    expect_args("TIER_CALC", args, 3, 3, "exactly 3")?;
    let base = ev.eval(&args[0])?.as_decimal();
    let table = text_arg(ev, &args[1], "TIER_CALC")?;
    let mode_name = text_arg(ev, &args[2], "TIER_CALC")?;
    let mode = TierMode::parse(&mode_name).ok_or_else(|| EngineError::InvalidArgument {
        function: "TIER_CALC".to_string(),
        message: format!("unknown tier mode `{mode_name}`"),
    })?;

    let Some(tables) = ev.opts().tax_tables else {
        // No collaborator wired in: the function does not exist in this
        // installation.
        return Err(EngineError::UndefinedFunction("TIER_CALC".to_string()));
    };
    let Some(outcome) = tables.calculate(base, &table, mode) else {
        return Err(EngineError::ParamNotFound {
            key: table,
            date: ev.date(),
        });
    };
    ev.trace(format!(
        "tier_calc {table} {mode:?} base={base} amount={} rate={}",
        outcome.amount, outcome.effective_rate
    ));
    Ok(Value::Number(outcome.amount))
}

/// Country-specific tax functions are whatever the collaborator claims to
/// support; anything else is an unknown name.
pub(super) fn named_tax_fn(
    ev: &mut Evaluator<'_>,
    name: &str,
    args: &[Expr],
) -> Result<Value, EngineError> {
    let supported = ev
        .opts()
        .tax_tables
        .is_some_and(|tables| tables.supports(name));
    if !supported {
        return Err(EngineError::UndefinedFunction(name.to_string()));
    }
    expect_args(name, args, 1, 1, "exactly 1")?;
    let base = ev.eval(&args[0])?.as_decimal();
    let date = ev.date();
    let employee_id = ev.ctx().employee_id.clone();

    let outcome = ev
        .opts()
        .tax_tables
        .and_then(|tables| tables.calculate_named(name, base, date, employee_id.as_deref()))
        .ok_or_else(|| EngineError::ParamNotFound {
            key: name.to_string(),
            date,
        })?;
    ev.trace(format!(
        "{name} base={base} amount={} rate={}",
        outcome.amount, outcome.effective_rate
    ));
    Ok(Value::Number(outcome.amount))
}

fn optional_date(
    ev: &mut Evaluator<'_>,
    arg: Option<&Expr>,
    function: &str,
) -> Result<Option<NaiveDate>, EngineError> {
    let Some(arg) = arg else { return Ok(None) };
    let raw = text_arg(ev, arg, function)?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|_| EngineError::InvalidArgument {
            function: function.to_string(),
            message: format!("invalid date `{raw}`, expected YYYY-MM-DD"),
        })
}
