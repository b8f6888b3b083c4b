//! Stateless entry points. Each call tokenizes, parses, and evaluates from
//! scratch with a fresh evaluator; the only state that survives a call is
//! whatever the caller keeps from the returned trace and usage ledgers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ast::{collect_dependencies, Dependencies, Expr};
use crate::error::{EngineError, ErrorCode};
use crate::eval::{EvalContext, EvalOptions, Evaluator, ParamUsage};
use crate::parser;

/// Outcome of one [`evaluate`] call. Serializes for audit consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub success: bool,
    /// Canonical decimal-string result when `success`.
    pub value: Option<String>,
    pub error: Option<String>,
    pub error_code: Option<ErrorCode>,
    /// Resolution audit log, preserved (partially) on failure.
    pub trace: Vec<String>,
    /// Every external parameter touched, keyed by parameter key.
    pub params_used: BTreeMap<String, ParamUsage>,
}

impl Evaluation {
    fn failure(
        err: EngineError,
        trace: Vec<String>,
        params_used: BTreeMap<String, ParamUsage>,
    ) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(err.to_string()),
            error_code: Some(err.code()),
            trace,
            params_used,
        }
    }
}

/// Outcome of one [`validate`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Validation {
    pub valid: bool,
    /// The parsed tree, for callers that want to inspect or cache it.
    #[serde(skip)]
    pub ast: Option<Expr>,
    pub error: Option<String>,
    pub error_code: Option<ErrorCode>,
    pub dependencies: Dependencies,
}

/// Evaluate a formula against a caller-owned context.
///
/// Never panics and never lets an error escape: every tokenizer, parser, and
/// evaluator fault comes back as `{success: false, error, error_code}` with
/// whatever trace had accumulated by then.
pub fn evaluate(expression: &str, ctx: &EvalContext, opts: &EvalOptions<'_>) -> Evaluation {
    log::debug!("evaluating formula ({} chars)", expression.len());
    let expr = match parser::parse(expression) {
        Ok(expr) => expr,
        Err(err) => {
            return Evaluation::failure(EngineError::from(err), Vec::new(), BTreeMap::new())
        }
    };

    let mut evaluator = Evaluator::new(ctx, opts);
    let outcome = evaluator.eval(&expr);
    let (trace, params_used) = evaluator.into_ledgers();

    match outcome {
        Ok(value) => Evaluation {
            success: true,
            value: Some(value.to_string()),
            error: None,
            error_code: None,
            trace,
            params_used,
        },
        Err(err) => {
            log::debug!("evaluation failed: {err}");
            Evaluation::failure(err, trace, params_used)
        }
    }
}

/// Parse a formula and extract everything it references, without evaluating.
///
/// Used by callers to pre-resolve parameters and concept values before a
/// payroll run.
pub fn validate(expression: &str) -> Validation {
    match parser::parse(expression) {
        Ok(expr) => {
            let dependencies = collect_dependencies(&expr);
            Validation {
                valid: true,
                ast: Some(expr),
                error: None,
                error_code: None,
                dependencies,
            }
        }
        Err(err) => Validation {
            valid: false,
            ast: None,
            error: Some(err.to_string()),
            error_code: Some(ErrorCode::SyntaxError),
            dependencies: Dependencies::default(),
        },
    }
}
