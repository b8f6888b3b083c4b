//! Per-call evaluation state and the external-value resolution protocol.
//!
//! Everything here is owned by exactly one evaluation. Any caching that
//! legitimately crosses calls (parameter effective-dating, tax tables)
//! belongs inside the resolver implementations, never in the engine.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use payrule_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Caller-supplied inputs for one evaluation. Deserializes from JSON so rule
/// runners can hand over request payloads directly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EvalContext {
    /// Evaluation date for effective-dated parameter lookups. Defaults to
    /// today when absent.
    pub date: Option<NaiveDate>,
    /// Employee being processed, for `EMP_PARAM` without an explicit id.
    pub employee_id: Option<String>,
    /// Nested name-to-value mapping reachable through dotted paths.
    pub variables: serde_json::Map<String, serde_json::Value>,
    /// Pre-computed payroll amounts, keyed by flat lowercase concept code.
    pub concepts: BTreeMap<String, String>,
    /// Concept groupings used by `SUM_GROUP`'s built-in weighted fallback.
    pub groups: BTreeMap<String, Vec<GroupMember>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupMember {
    pub concept_code: String,
    /// Decimal-string weight; defaults to 1.
    #[serde(default = "default_weight")]
    pub weight: String,
}

fn default_weight() -> String {
    "1".to_string()
}

/// Tuning and collaborator wiring for one evaluation.
#[derive(Default)]
pub struct EvalOptions<'a> {
    /// Internal scale for chained arithmetic; defaults to
    /// [`payrule_decimal::DEFAULT_SCALE`].
    pub scale: Option<u32>,
    pub param_resolver: Option<&'a dyn ParamResolver>,
    pub emp_param_resolver: Option<&'a dyn EmpParamResolver>,
    pub group_resolver: Option<&'a dyn GroupResolver>,
    pub tax_tables: Option<&'a dyn TaxTables>,
    /// Static parameter values tried when no resolver answers. Explicit
    /// per-call state: there is deliberately no process-wide parameter
    /// cache inside the engine.
    pub fallback_params: BTreeMap<String, String>,
    /// Employee-scoped static parameters, keyed `(employee_id, key)`.
    pub fallback_emp_params: BTreeMap<(String, String), String>,
}

impl EvalOptions<'_> {
    pub(crate) fn internal_scale(&self) -> u32 {
        self.scale.unwrap_or(payrule_decimal::DEFAULT_SCALE)
    }
}

/// Answers "what is `key` worth on `date`". Effective-dating and scope
/// priority live behind this interface, outside the engine.
pub trait ParamResolver {
    fn resolve(&self, key: &str, date: NaiveDate) -> Option<String>;
}

/// Same contract with an explicit employee scope.
pub trait EmpParamResolver {
    fn resolve(&self, key: &str, employee_id: Option<&str>, date: NaiveDate) -> Option<String>;
}

/// Overrides the built-in weighted-sum fallback for `SUM_GROUP`.
pub trait GroupResolver {
    fn resolve(&self, code: &str, concepts: &BTreeMap<String, String>) -> Option<String>;
}

/// How a progressive table applies to its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierMode {
    /// Each bracket taxes only the slice of the base inside it.
    Marginal,
    /// The bracket containing the base taxes the whole base.
    Flat,
}

impl TierMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "MARGINAL" => Some(Self::Marginal),
            "FLAT" => Some(Self::Flat),
            _ => None,
        }
    }
}

/// The only two fields the engine consumes from a bracket calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxOutcome {
    pub amount: Decimal,
    pub effective_rate: Decimal,
}

/// Country-specific progressive tax calculator. Bracket math is entirely the
/// collaborator's business; the engine only formats and traces the result.
pub trait TaxTables {
    /// Generic tiered calculation against a named table.
    fn calculate(&self, base: Decimal, table: &str, mode: TierMode) -> Option<TaxOutcome>;

    /// Whether `name` is a country-specific function this collaborator
    /// implements (e.g. a statutory withholding formula).
    fn supports(&self, _name: &str) -> bool {
        false
    }

    /// Evaluate a supported country-specific function.
    fn calculate_named(
        &self,
        _name: &str,
        _base: Decimal,
        _date: NaiveDate,
        _employee_id: Option<&str>,
    ) -> Option<TaxOutcome> {
        None
    }
}

/// Scope at which a recorded parameter value was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamScope {
    Global,
    Employee,
}

/// One entry in the parameter-usage ledger, consumed by downstream
/// audit/snapshot collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamUsage {
    pub value: String,
    pub date: NaiveDate,
    pub scope: ParamScope,
    pub employee_id: Option<String>,
}
