//! Dependency extraction and syntax checking through `validate`.

use payrule_engine::{validate, ErrorCode};
use pretty_assertions::assert_eq;

#[test]
fn extracts_variables_and_params() {
    let outcome = validate("MIN(a.b, PARAM('x'))");
    assert!(outcome.valid);
    assert!(outcome.ast.is_some());
    assert_eq!(outcome.dependencies.variables, vec!["a.b".to_string()]);
    assert_eq!(outcome.dependencies.params, vec!["x".to_string()]);
    assert!(outcome.dependencies.emp_params.is_empty());
    assert!(outcome.dependencies.groups.is_empty());
}

#[test]
fn extracts_all_dependency_kinds() {
    let outcome = validate(
        "IF(EMP_PARAM('irpf_rate') > 0, SUM_GROUP('gross') * contract.base, PARAM('default_rate'))",
    );
    assert!(outcome.valid);
    let deps = &outcome.dependencies;
    assert_eq!(deps.variables, vec!["contract.base".to_string()]);
    assert_eq!(deps.params, vec!["default_rate".to_string()]);
    assert_eq!(deps.emp_params, vec!["irpf_rate".to_string()]);
    assert_eq!(deps.groups, vec!["gross".to_string()]);
    // Every referenced path is also a candidate concept key.
    assert_eq!(deps.concepts, vec!["contract.base".to_string()]);
}

#[test]
fn deduplicates_repeated_references() {
    let outcome = validate("PARAM('x') + PARAM('x') + a.b * a.b");
    assert_eq!(outcome.dependencies.params, vec!["x".to_string()]);
    assert_eq!(outcome.dependencies.variables, vec!["a.b".to_string()]);
}

#[test]
fn computed_keys_are_not_extracted_but_their_parts_are() {
    let outcome = validate("PARAM(rate_key)");
    assert!(outcome.valid);
    assert!(outcome.dependencies.params.is_empty());
    assert_eq!(outcome.dependencies.variables, vec!["rate_key".to_string()]);
}

#[test]
fn invalid_formula_reports_syntax_error() {
    let outcome = validate("MIN(1,");
    assert!(!outcome.valid);
    assert!(outcome.ast.is_none());
    assert_eq!(outcome.error_code, Some(ErrorCode::SyntaxError));
    assert!(outcome.error.unwrap().contains("expected"));
    assert_eq!(outcome.dependencies, Default::default());
}

#[test]
fn validate_does_not_resolve_anything() {
    // Unknown names and unresolvable references are fine at validation
    // time; only syntax counts.
    let outcome = validate("NO_SUCH_FN(missing.var, PARAM('nope'))");
    assert!(outcome.valid);
}
