//! The immutable expression tree produced by the parser.
//!
//! Identifier semantics (dotted variable path, function call, boolean
//! literal) are resolved once during parsing into distinct node kinds; the
//! evaluator never re-inspects lexemes.

use std::collections::BTreeSet;

use payrule_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

/// A dotted reference like `CONTRACT.BASE_SALARY`. Segments are stored in
/// the tokenizer's upcased form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariablePath {
    pub segments: Vec<String>,
}

impl VariablePath {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Canonical dotted form, upcased.
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// The flat lowercase key used against the concept-value map.
    pub fn concept_key(&self) -> String {
        self.dotted().to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Decimal),
    Text(String),
    Bool(bool),
    Variable(VariablePath),
    Call(CallExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
}

/// Everything a formula references externally, extracted without evaluating.
///
/// Callers use this to pre-resolve values (bulk-load parameters, compute
/// concept values) before a payroll run. `concepts` lists the lowercased
/// dotted form of every referenced path: resolution tries the concept-value
/// map before the nested variable map, so each path is a candidate concept
/// key as well as a variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dependencies {
    pub variables: Vec<String>,
    pub params: Vec<String>,
    pub emp_params: Vec<String>,
    pub groups: Vec<String>,
    pub concepts: Vec<String>,
}

pub fn collect_dependencies(expr: &Expr) -> Dependencies {
    let mut acc = DepAccumulator::default();
    acc.walk(expr);
    Dependencies {
        variables: acc.variables.into_iter().collect(),
        params: acc.params.into_iter().collect(),
        emp_params: acc.emp_params.into_iter().collect(),
        groups: acc.groups.into_iter().collect(),
        concepts: acc.concepts.into_iter().collect(),
    }
}

#[derive(Default)]
struct DepAccumulator {
    variables: BTreeSet<String>,
    params: BTreeSet<String>,
    emp_params: BTreeSet<String>,
    groups: BTreeSet<String>,
    concepts: BTreeSet<String>,
}

impl DepAccumulator {
    fn walk(&mut self, expr: &Expr) {
        match expr {
            Expr::Number(_) | Expr::Text(_) | Expr::Bool(_) => {}
            Expr::Variable(path) => {
                self.variables.insert(path.concept_key());
                self.concepts.insert(path.concept_key());
            }
            Expr::Unary(u) => self.walk(&u.expr),
            Expr::Binary(b) => {
                self.walk(&b.left);
                self.walk(&b.right);
            }
            Expr::Call(call) => {
                // Only literal keys can be extracted statically; computed
                // keys still show up through the argument walk below.
                if let Some(Expr::Text(key)) = call.args.first() {
                    match call.name.as_str() {
                        "PARAM" => {
                            self.params.insert(key.clone());
                        }
                        "EMP_PARAM" => {
                            self.emp_params.insert(key.clone());
                        }
                        "SUM_GROUP" => {
                            self.groups.insert(key.clone());
                        }
                        _ => {}
                    }
                }
                for arg in &call.args {
                    self.walk(arg);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(path: &[&str]) -> Expr {
        Expr::Variable(VariablePath::new(
            path.iter().map(|s| s.to_string()).collect(),
        ))
    }

    #[test]
    fn variable_path_forms() {
        let p = VariablePath::new(vec!["CONTRACT".into(), "BASE".into()]);
        assert_eq!(p.dotted(), "CONTRACT.BASE");
        assert_eq!(p.concept_key(), "contract.base");
    }

    #[test]
    fn dependencies_are_deduplicated_and_sorted() {
        let expr = Expr::Binary(BinaryExpr {
            op: BinaryOp::Add,
            left: Box::new(var(&["B", "X"])),
            right: Box::new(Expr::Binary(BinaryExpr {
                op: BinaryOp::Add,
                left: Box::new(var(&["A"])),
                right: Box::new(var(&["B", "X"])),
            })),
        });
        let deps = collect_dependencies(&expr);
        assert_eq!(deps.variables, vec!["a".to_string(), "b.x".to_string()]);
        assert_eq!(deps.concepts, deps.variables);
    }
}
