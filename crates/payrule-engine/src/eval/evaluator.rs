use std::collections::BTreeMap;

use chrono::NaiveDate;
use payrule_decimal as dec;
use payrule_decimal::Decimal;

use crate::ast::{BinaryExpr, BinaryOp, Expr, UnaryExpr, UnaryOp, VariablePath};
use crate::error::EngineError;
use crate::eval::context::{EvalContext, EvalOptions, ParamUsage};
use crate::functions;
use crate::value::Value;

/// Tree-walking evaluator. One instance per call: it owns the trace and
/// parameter-usage ledgers and is discarded (via [`Evaluator::into_ledgers`])
/// when the call finishes, so concurrent evaluations never share state.
pub struct Evaluator<'a> {
    ctx: &'a EvalContext,
    opts: &'a EvalOptions<'a>,
    scale: u32,
    date: NaiveDate,
    trace: Vec<String>,
    params_used: BTreeMap<String, ParamUsage>,
}

impl<'a> Evaluator<'a> {
    pub fn new(ctx: &'a EvalContext, opts: &'a EvalOptions<'a>) -> Self {
        let date = ctx
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        Self {
            ctx,
            opts,
            scale: opts.internal_scale(),
            date,
            trace: Vec::new(),
            params_used: BTreeMap::new(),
        }
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<Value, EngineError> {
        match expr {
            Expr::Number(d) => Ok(Value::Number(*d)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::Bool(b) => Ok(Value::from_bool(*b)),
            Expr::Variable(path) => self.eval_variable(path),
            Expr::Unary(unary) => self.eval_unary(unary),
            Expr::Binary(binary) => self.eval_binary(binary),
            Expr::Call(call) => functions::dispatch(self, call),
        }
    }

    /// Drain the ledgers once evaluation is done (or has failed — the
    /// partial trace is part of the contract either way).
    pub fn into_ledgers(self) -> (Vec<String>, BTreeMap<String, ParamUsage>) {
        (self.trace, self.params_used)
    }

    pub(crate) fn ctx(&self) -> &EvalContext {
        self.ctx
    }

    pub(crate) fn opts(&self) -> &EvalOptions<'a> {
        self.opts
    }

    pub(crate) fn scale(&self) -> u32 {
        self.scale
    }

    pub(crate) fn date(&self) -> NaiveDate {
        self.date
    }

    pub(crate) fn trace(&mut self, entry: String) {
        log::trace!("{entry}");
        self.trace.push(entry);
    }

    pub(crate) fn record_param(&mut self, key: String, usage: ParamUsage) {
        self.params_used.insert(key, usage);
    }

    fn eval_variable(&mut self, path: &VariablePath) -> Result<Value, EngineError> {
        let ctx = self.ctx;

        // Concept values shadow variables: they are the amounts this very
        // payroll run already computed.
        let concept_key = path.concept_key();
        if let Some(raw) = ctx.concepts.get(&concept_key) {
            let value = dec::normalize(Some(raw));
            self.trace(format!("concept {concept_key} = {value}"));
            return Ok(Value::Number(value));
        }

        let mut node: Option<&serde_json::Value> = None;
        for (i, segment) in path.segments.iter().enumerate() {
            let map = if i == 0 {
                Some(&ctx.variables)
            } else {
                match node {
                    Some(serde_json::Value::Object(map)) => Some(map),
                    _ => None,
                }
            };
            node = map.and_then(|m| lookup_case_insensitive(m, segment));
            if node.is_none() {
                return Err(EngineError::UndefinedVariable(path.dotted()));
            }
        }

        let value = match node {
            Some(serde_json::Value::Number(n)) => Value::Number(dec::normalize(Some(&n.to_string()))),
            Some(serde_json::Value::String(s)) => Value::Text(s.clone()),
            Some(serde_json::Value::Bool(b)) => Value::from_bool(*b),
            _ => return Err(EngineError::UndefinedVariable(path.dotted())),
        };
        self.trace(format!("var {} = {}", path.dotted(), value));
        Ok(value)
    }

    fn eval_unary(&mut self, unary: &UnaryExpr) -> Result<Value, EngineError> {
        let operand = self.eval(&unary.expr)?;
        match unary.op {
            UnaryOp::Neg => Ok(Value::Number(-operand.as_decimal())),
            UnaryOp::Not => Ok(Value::from_bool(!operand.is_truthy())),
        }
    }

    fn eval_binary(&mut self, binary: &BinaryExpr) -> Result<Value, EngineError> {
        // AND/OR short-circuit: the right side only runs when the left has
        // not already decided the outcome.
        match binary.op {
            BinaryOp::And => {
                if !self.eval(&binary.left)?.is_truthy() {
                    return Ok(Value::from_bool(false));
                }
                let right = self.eval(&binary.right)?;
                return Ok(Value::from_bool(right.is_truthy()));
            }
            BinaryOp::Or => {
                if self.eval(&binary.left)?.is_truthy() {
                    return Ok(Value::from_bool(true));
                }
                let right = self.eval(&binary.right)?;
                return Ok(Value::from_bool(right.is_truthy()));
            }
            _ => {}
        }

        let left = self.eval(&binary.left)?.as_decimal();
        let right = self.eval(&binary.right)?.as_decimal();
        let scale = self.scale;
        let value = match binary.op {
            BinaryOp::Add => Value::Number(dec::add(left, right, scale)),
            BinaryOp::Sub => Value::Number(dec::sub(left, right, scale)),
            BinaryOp::Mul => Value::Number(dec::mul(left, right, scale)),
            // Formula evaluation prefers explicit failure over a silently
            // propagating null.
            BinaryOp::Div => Value::Number(dec::div(left, right, scale)?),
            BinaryOp::Eq => Value::from_bool(dec::eq(left, right, scale)),
            BinaryOp::Ne => Value::from_bool(!dec::eq(left, right, scale)),
            BinaryOp::Lt => Value::from_bool(dec::lt(left, right, scale)),
            BinaryOp::Le => Value::from_bool(dec::lte(left, right, scale)),
            BinaryOp::Gt => Value::from_bool(dec::gt(left, right, scale)),
            BinaryOp::Ge => Value::from_bool(dec::gte(left, right, scale)),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        };
        Ok(value)
    }

    /// Weighted concept sum, the built-in fallback behind `SUM_GROUP`.
    pub(crate) fn sum_group_fallback(&mut self, code: &str) -> Decimal {
        let ctx = self.ctx;
        let members = ctx
            .groups
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(code))
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[]);
        let mut sum = Decimal::ZERO;
        for member in members {
            let value = ctx
                .concepts
                .get(&member.concept_code.to_lowercase())
                .map(|raw| dec::normalize(Some(raw)))
                .unwrap_or(Decimal::ZERO);
            let weight = dec::normalize(Some(&member.weight));
            sum = dec::add(sum, dec::mul(value, weight, self.scale), self.scale);
        }
        self.trace(format!(
            "sum_group {code} = {sum} ({} member(s))",
            members.len()
        ));
        sum
    }
}

fn lookup_case_insensitive<'v>(
    map: &'v serde_json::Map<String, serde_json::Value>,
    segment: &str,
) -> Option<&'v serde_json::Value> {
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(segment))
        .map(|(_, v)| v)
}
