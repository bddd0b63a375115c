//! Tests for fidelity selection

use cellflow::prelude::*;
use cellflow::NotFound;
use pretty_assertions::assert_eq;

fn fidelities() -> FidelitySet {
    FidelitySet::new()
        .with("exact", Expression::parse("a * b").unwrap())
        .with("approx", Expression::parse("ROUND(a * b)").unwrap())
        .with("constant", 1.0)
}

fn scope() -> Scope {
    Scope::new().with("a", 1.5).unwrap().with("b", 2.5).unwrap()
}

/// The first registered alternative is used until another is selected
#[test]
fn test_default_fidelity() {
    let mut cell = Cell::with_source("area", fidelities()).with_scope(scope());

    assert_eq!(cell.selected_fidelity(), Some("exact"));
    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(3.75)));
}

/// A fidelity argument switches the alternative for this and later calls
#[test]
fn test_select_by_argument() {
    let mut cell = Cell::with_source("area", fidelities()).with_scope(scope());

    let result = cell.evaluate(&[Arg::fidelity("approx")]).unwrap();
    assert_eq!(result, Some(Value::Number(4.0)));
    assert_eq!(cell.selected_fidelity(), Some("approx"));

    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(4.0)));
    assert_eq!(
        cell.evaluate(&[Arg::fidelity("constant")]).unwrap(),
        Some(Value::Number(1.0))
    );
}

/// Selecting an unknown alternative fails substitution
#[test]
fn test_unknown_fidelity() {
    let mut cell = Cell::with_source("area", fidelities()).with_scope(scope());

    let err = cell.evaluate(&[Arg::fidelity("fast")]).unwrap_err();
    match err {
        EvaluationError::Setter(SetterError::Fidelity(NotFound { name, available })) => {
            assert_eq!(name, "fast");
            assert_eq!(available, vec!["exact", "approx", "constant"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(cell.selected_fidelity(), Some("exact"));
}

/// A name-valued alternative is looked up in the cell scope
#[test]
fn test_name_result_resolved_in_scope() {
    let scope = Scope::new()
        .with("x1", 20.0)
        .unwrap()
        .with("x2", Expression::parse("x1 * 4").unwrap())
        .unwrap();
    let set = FidelitySet::new().with("first", "x1").with("second", "x2");
    let mut cell = Cell::with_source("pick", set).with_scope(scope);

    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(20.0)));
    assert_eq!(
        cell.evaluate(&[Arg::fidelity("second")]).unwrap(),
        Some(Value::Number(80.0))
    );
}

/// A name that is not bound in the scope resolves to nothing
#[test]
fn test_unbound_name_result() {
    let set = FidelitySet::new().with("only", "nowhere");
    let mut cell = Cell::with_source("pick", set).with_scope(Scope::new());
    assert_eq!(cell.evaluate(&[]).unwrap(), None);

    // without a scope the text is returned as is
    let set = FidelitySet::new().with("only", "nowhere");
    let mut cell = Cell::with_source("pick", set);
    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::string("nowhere")));
}

/// Selecting through the cell invalidates it
#[test]
fn test_select_fidelity_method() {
    let mut cell = Cell::with_source("area", fidelities()).with_scope(scope());
    cell.evaluate(&[]).unwrap();

    cell.select_fidelity("constant").unwrap();
    assert!(!cell.is_valid());
    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(1.0)));
    assert!(cell.select_fidelity("nope").is_err());
}

/// Choosing a fidelity marks the set changed even when it is already selected
#[test]
fn test_fidelity_argument_marks_set_changed() {
    let mut cell = Cell::with_source("area", fidelities()).with_scope(scope());

    cell.evaluate(&[Arg::fidelity("exact")]).unwrap();
    match cell.implementation() {
        Some(Source::Fidelities(set)) => {
            assert_eq!(set.selected_name(), Some("exact"));
            assert!(set.is_changed());
        }
        other => panic!("unexpected implementation: {other:?}"),
    }
}
