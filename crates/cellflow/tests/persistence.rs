//! Tests for persistent cells writing through to a store

use std::rc::Rc;

use cellflow::prelude::*;
use cellflow::StoreError;
use pretty_assertions::assert_eq;

fn persistent(name: &str, store: &Rc<MemoryStore>) -> Cell {
    Cell::new(name)
        .with_options(CellOptions {
            persistent: true,
            ..Default::default()
        })
        .with_store(store.clone())
}

/// The first evaluation stores the value and keeps only the handle
#[test]
fn test_write_through_round_trip() {
    let store = Rc::new(MemoryStore::new());
    let mut cell = persistent("x", &store);
    cell.put_value("x", 42.0);

    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(42.0)));
    assert_eq!(store.writes(), 1);
    assert!(cell.as_is().is_none());

    let handle = cell.url().cloned().unwrap();
    assert!(handle.is_materialized());
    assert_eq!(handle.location, MemoryStore::DEFAULT_LOCATION);
    assert_eq!(store.read(&handle).unwrap().into_value(), Value::Number(42.0));
}

/// Later evaluations read the object back without writing again
#[test]
fn test_read_through() {
    let store = Rc::new(MemoryStore::new());
    let mut cell = persistent("x", &store);
    cell.put_value("x", "payload");
    cell.evaluate(&[]).unwrap();
    let handle = cell.url().cloned();

    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::string("payload")));
    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::string("payload")));
    assert_eq!(store.writes(), 1);
    assert_eq!(store.reads(), 2);
    assert_eq!(cell.url().cloned(), handle);
}

/// Computed values are persisted too, replacing the computation
#[test]
fn test_computed_value_is_persisted() {
    let store = Rc::new(MemoryStore::new());
    let scope = Scope::new().with("a", 6.0).unwrap();
    let mut cell = persistent("x", &store).with_scope(scope);
    cell.set_implementation(Expression::parse("a * 7").unwrap());

    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(42.0)));
    assert!(cell.url().is_some());
    assert!(matches!(cell.implementation(), Some(Source::Constant(Value::Handle(_)))));
}

/// The cell's store location overrides the store default
#[test]
fn test_store_location_override() {
    let store = Rc::new(MemoryStore::new());
    let mut cell = persistent("x", &store).with_store_location("mem://archive");
    cell.put_value("x", 1.0);

    cell.evaluate(&[]).unwrap();
    assert_eq!(cell.url().unwrap().location, "mem://archive");
    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(1.0)));
}

/// Setting a plain value before a handle exists does nothing
#[test]
fn test_set_value_without_handle_is_noop() {
    let store = Rc::new(MemoryStore::new());
    let mut cell = persistent("x", &store);

    cell.set_value(5.0).unwrap();
    assert!(cell.as_is().is_none());
    assert!(cell.implementation().is_none());
    assert!(store.is_empty());
}

/// Setting a value once a handle exists updates the stored object in place
#[test]
fn test_set_value_updates_in_place() {
    let store = Rc::new(MemoryStore::new());
    let mut cell = persistent("x", &store);
    cell.put_value("x", 1.0);
    cell.evaluate(&[]).unwrap();
    let handle = cell.url().cloned().unwrap();

    cell.set_value(2.0).unwrap();
    assert_eq!(store.updates(), 1);
    assert_eq!(store.len(), 1);
    assert_eq!(cell.url(), Some(&handle));
    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(2.0)));
}

/// A handle without an object gets written rather than updated
#[test]
fn test_set_value_materializes_handle() {
    let store = Rc::new(MemoryStore::new());
    let mut cell = persistent("x", &store);

    cell.set_value(Handle::unmaterialized("mem://objects")).unwrap();
    assert_eq!(cell.url(), Some(&Handle::unmaterialized("mem://objects")));

    cell.set_value(7.0).unwrap();
    assert_eq!(store.writes(), 1);
    assert_eq!(store.updates(), 0);
    assert!(cell.url().unwrap().is_materialized());
    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(7.0)));
}

/// Handing a persistent cell an existing handle points it at that object
#[test]
fn test_set_handle_replaces_implementation() {
    let store = Rc::new(MemoryStore::new());
    let existing = store.write(&Value::string("shared")).unwrap();
    let mut cell = persistent("x", &store);

    cell.set_value(existing.clone()).unwrap();
    assert_eq!(cell.url(), Some(&existing));
    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::string("shared")));
}

/// A failed write leaves the implementation alone and clears the cache
#[test]
fn test_failed_write_keeps_implementation() {
    let store = Rc::new(MemoryStore::new());
    let scope = Scope::new().with("a", 2.0).unwrap();
    let mut cell = persistent("x", &store).with_scope(scope);
    cell.set_implementation(Expression::parse("a + 1").unwrap());

    store.fail_next();
    let err = cell.evaluate(&[]).unwrap_err();
    assert!(matches!(err, EvaluationError::Store(StoreError::Unavailable(_))));
    assert!(matches!(cell.implementation(), Some(Source::Expression(_))));
    assert!(cell.as_is().is_none());
    assert!(!cell.is_valid());
    assert!(store.is_empty());

    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(3.0)));
    assert!(cell.url().is_some());
}

/// A failed read surfaces as an error
#[test]
fn test_failed_read() {
    let store = Rc::new(MemoryStore::new());
    let mut cell = persistent("x", &store);
    cell.put_value("x", 1.0);
    cell.evaluate(&[]).unwrap();

    store.fail_next();
    assert!(matches!(
        cell.evaluate(&[]),
        Err(EvaluationError::Store(StoreError::Unavailable(_)))
    ));
    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(1.0)));
}

/// A persistent cell with no store cannot write through
#[test]
fn test_missing_store() {
    let mut cell = Cell::with_value("x", 1.0).with_options(CellOptions {
        persistent: true,
        ..Default::default()
    });

    assert!(matches!(
        cell.evaluate(&[]),
        Err(EvaluationError::NoStore(name)) if name == "x"
    ));
}

/// Non-persistent cells never report a handle
#[test]
fn test_url_only_for_persistent_cells() {
    let mut cell = Cell::with_source("x", Handle::materialized("mem://objects", "abc"));
    assert!(cell.url().is_none());
    cell.set_persistent(true);
    assert_eq!(cell.url().unwrap().to_string(), "mem://objects#abc");
}

fn counting_invoker() -> Rc<Invoker> {
    Rc::new(Invoker::new(
        "compute",
        |_: &Scope, _: &[Arg]| -> Result<Value, InvocationError> { Ok(Value::Number(9.0)) },
    ))
}

/// Without a handle, a computed value is neither run nor stored
#[test]
fn test_set_value_without_handle_skips_computation() {
    let store = Rc::new(MemoryStore::new());
    let mut cell = persistent("x", &store);
    let invoker = counting_invoker();

    cell.set_value(Source::Invoker(Rc::clone(&invoker))).unwrap();
    assert_eq!(invoker.calls(), 0);
    assert!(cell.implementation().is_none());
    assert!(store.is_empty());

    let failing = Invoker::new(
        "broken",
        |_: &Scope, _: &[Arg]| -> Result<Value, InvocationError> {
            Err(InvocationError::Failed("unreachable".into()))
        },
    );
    assert!(cell.set_value(failing).is_ok());
}

/// Once a handle exists, a computed value is run and stored in place
#[test]
fn test_set_value_with_handle_runs_computation() {
    let store = Rc::new(MemoryStore::new());
    let mut cell = persistent("x", &store);
    cell.put_value("x", 1.0);
    cell.evaluate(&[]).unwrap();
    let invoker = counting_invoker();

    cell.set_value(Source::Invoker(Rc::clone(&invoker))).unwrap();
    assert_eq!(invoker.calls(), 1);
    assert_eq!(store.updates(), 1);
    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(9.0)));
}

/// A cell made persistent after its first evaluation writes on the next one
#[test]
fn test_becoming_persistent_round_trip() {
    let store = Rc::new(MemoryStore::new());
    let mut cell = Cell::with_value("x", 42.0).with_store(store.clone());

    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(42.0)));
    assert!(cell.url().is_none());
    assert!(store.is_empty());

    cell.set_persistent(true);
    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(42.0)));
    assert_eq!(store.writes(), 1);

    let handle = cell.url().cloned().unwrap();
    assert_eq!(store.read(&handle).unwrap().into_value(), Value::Number(42.0));
    assert_eq!(cell.evaluate(&[]).unwrap(), Some(Value::Number(42.0)));
}
