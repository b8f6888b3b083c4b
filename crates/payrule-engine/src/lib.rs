#![forbid(unsafe_code)]
#![deny(unreachable_patterns)]

//! Formula evaluation engine for payroll/tax business rules.
//!
//! The DSL is a small, side-effect-free expression language: decimal
//! arithmetic, short-circuit boolean logic, and a fixed set of functions for
//! reaching external values (effective-dated parameters, employee-scoped
//! parameters, pre-computed concept values, weighted concept groups, and
//! country-specific progressive tax tables).
//!
//! Entry points are the stateless [`evaluate`] and [`validate`] free
//! functions; each call builds its own tokenizer, parser, and evaluator, so
//! a payroll run can evaluate formulas for many employees in parallel simply
//! by making independent calls. External values reach the engine through the
//! capability traits in [`eval`] ([`ParamResolver`], [`EmpParamResolver`],
//! [`GroupResolver`], [`TaxTables`]), which makes the whole engine testable
//! against deterministic fakes.
//!
//! All arithmetic goes through [`payrule_decimal`]; results are returned as
//! canonical decimal strings and booleans as `"1"`/`"0"`.

mod ast;
mod engine;
mod error;
mod functions;
mod value;

pub mod eval;
pub mod parser;

pub use ast::{
    collect_dependencies, BinaryExpr, BinaryOp, CallExpr, Dependencies, Expr, UnaryExpr, UnaryOp,
    VariablePath,
};
pub use engine::{evaluate, validate, Evaluation, Validation};
pub use error::{EngineError, ErrorCode, ParseError, Span};
pub use eval::{
    EmpParamResolver, EvalContext, EvalOptions, GroupMember, GroupResolver, ParamResolver,
    ParamScope, ParamUsage, TaxOutcome, TaxTables, TierMode,
};
pub use parser::{lex, parse, Token, TokenKind};
pub use value::Value;
