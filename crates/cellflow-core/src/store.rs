//! Durable object store indirection
//!
//! A persistent cell does not keep its value; it keeps a [`Handle`] and
//! goes through a [`Store`] to read or replace the object behind it. The
//! store's storage engine is not part of this crate: [`MemoryStore`] is an
//! in-process implementation for embedding and tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::handle::Handle;
use crate::value::Value;

/// Object returned by a store read
///
/// Stores may hand back the value itself or a wrapper carrying the object's
/// identity. Callers that only want the data use [`Stored::into_value`],
/// which unwraps one level.
#[derive(Debug, Clone, PartialEq)]
pub enum Stored {
    /// Bare value
    Value(Value),
    /// Value wrapped with its object id
    Object(StoredObject),
}

/// A stored value together with its identity
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub id: Uuid,
    pub value: Value,
}

impl Stored {
    /// Get the data, unwrapping an object wrapper if present
    pub fn into_value(self) -> Value {
        match self {
            Stored::Value(v) => v,
            Stored::Object(obj) => obj.value,
        }
    }
}

/// Durable key/value indirection reachable by handle
///
/// Every call is a single blocking round trip. Implementations enforce
/// their own deadlines; callers do not retry.
pub trait Store {
    /// Default location new objects are written to
    fn location(&self) -> &str;

    /// Check whether a value is a handle this store understands
    fn is_handle(&self, value: &Value) -> bool {
        value.is_handle()
    }

    /// Store a new object at the default location
    fn write(&self, value: &Value) -> StoreResult<Handle> {
        self.write_at(self.location(), value)
    }

    /// Store a new object at an explicit location
    fn write_at(&self, location: &str, value: &Value) -> StoreResult<Handle>;

    /// Fetch the object behind a handle
    fn read(&self, handle: &Handle) -> StoreResult<Stored>;

    /// Replace the object behind an existing handle
    ///
    /// The handle must already reference a stored object; there is no
    /// implicit create.
    fn update(&self, handle: &Handle, value: &Value) -> StoreResult<()>;
}

/// In-process store keyed by UUID locators
#[derive(Debug)]
pub struct MemoryStore {
    location: String,
    /// fragment -> (location, value)
    objects: RefCell<HashMap<String, (String, Value)>>,
    writes: Cell<usize>,
    reads: Cell<usize>,
    updates: Cell<usize>,
    fail_next: Cell<bool>,
}

impl MemoryStore {
    /// Default location for in-memory stores
    pub const DEFAULT_LOCATION: &'static str = "mem://objects";

    /// Create an empty store at the default location
    pub fn new() -> Self {
        Self::with_location(Self::DEFAULT_LOCATION)
    }

    /// Create an empty store at a custom location
    pub fn with_location(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            objects: RefCell::new(HashMap::new()),
            writes: Cell::new(0),
            reads: Cell::new(0),
            updates: Cell::new(0),
            fail_next: Cell::new(false),
        }
    }

    /// Make the next store call fail as if the store were unreachable
    pub fn fail_next(&self) {
        self.fail_next.set(true);
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Number of successful reads
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    /// Number of successful updates
    pub fn updates(&self) -> usize {
        self.updates.get()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.borrow().len()
    }

    /// Check if the store holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.borrow().is_empty()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.fail_next.replace(false) {
            return Err(StoreError::Unavailable(self.location.clone()));
        }
        Ok(())
    }

    fn fragment<'h>(&self, handle: &'h Handle) -> StoreResult<&'h str> {
        handle
            .fragment
            .as_deref()
            .ok_or_else(|| StoreError::NotMaterialized(handle.clone()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn location(&self) -> &str {
        &self.location
    }

    fn write_at(&self, location: &str, value: &Value) -> StoreResult<Handle> {
        self.check_available()?;

        let id = Uuid::new_v4().to_string();
        self.objects
            .borrow_mut()
            .insert(id.clone(), (location.to_string(), value.clone()));
        self.writes.set(self.writes.get() + 1);

        Ok(Handle::materialized(location, id))
    }

    fn read(&self, handle: &Handle) -> StoreResult<Stored> {
        self.check_available()?;
        let fragment = self.fragment(handle)?;

        let objects = self.objects.borrow();
        let (location, value) = objects
            .get(fragment)
            .ok_or_else(|| StoreError::NotFound(handle.clone()))?;
        if *location != handle.location {
            return Err(StoreError::ForeignHandle {
                handle: handle.clone(),
                location: location.clone(),
            });
        }

        let id = Uuid::parse_str(fragment).map_err(|e| StoreError::Backend(e.to_string()))?;
        self.reads.set(self.reads.get() + 1);

        Ok(Stored::Object(StoredObject {
            id,
            value: value.clone(),
        }))
    }

    fn update(&self, handle: &Handle, value: &Value) -> StoreResult<()> {
        self.check_available()?;
        let fragment = self.fragment(handle)?;

        let mut objects = self.objects.borrow_mut();
        let entry = objects
            .get_mut(fragment)
            .ok_or_else(|| StoreError::NotFound(handle.clone()))?;
        if entry.0 != handle.location {
            return Err(StoreError::ForeignHandle {
                handle: handle.clone(),
                location: entry.0.clone(),
            });
        }
        entry.1 = value.clone();
        self.updates.set(self.updates.get() + 1);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_then_read() {
        let store = MemoryStore::new();
        let handle = store.write(&Value::from(7.0)).unwrap();

        assert!(handle.is_materialized());
        assert_eq!(handle.location, MemoryStore::DEFAULT_LOCATION);
        assert_eq!(store.read(&handle).unwrap().into_value(), Value::from(7.0));
        assert_eq!(store.writes(), 1);
        assert_eq!(store.reads(), 1);
    }

    #[test]
    fn test_update_in_place() {
        let store = MemoryStore::new();
        let handle = store.write(&Value::from("a")).unwrap();

        store.update(&handle, &Value::from("b")).unwrap();

        assert_eq!(store.read(&handle).unwrap().into_value(), Value::from("b"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_requires_existing_object() {
        let store = MemoryStore::new();

        let unmaterialized = Handle::unmaterialized(MemoryStore::DEFAULT_LOCATION);
        assert!(matches!(
            store.update(&unmaterialized, &Value::Empty),
            Err(StoreError::NotMaterialized(_))
        ));

        let missing = Handle::materialized(MemoryStore::DEFAULT_LOCATION, "nope");
        assert!(matches!(
            store.update(&missing, &Value::Empty),
            Err(StoreError::NotFound(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_foreign_location() {
        let store = MemoryStore::new();
        let handle = store.write_at("mem://other", &Value::from(1)).unwrap();
        assert_eq!(handle.location, "mem://other");

        let forged = Handle {
            location: "mem://elsewhere".into(),
            fragment: handle.fragment.clone(),
        };
        assert!(matches!(
            store.read(&forged),
            Err(StoreError::ForeignHandle { .. })
        ));
    }

    #[test]
    fn test_fail_next() {
        let store = MemoryStore::new();
        store.fail_next();

        assert!(matches!(
            store.write(&Value::from(1)),
            Err(StoreError::Unavailable(_))
        ));
        // Only the next call fails
        assert!(store.write(&Value::from(1)).is_ok());
    }

    #[test]
    fn test_stored_unwrap() {
        let bare = Stored::Value(Value::from(1));
        assert_eq!(bare.into_value(), Value::from(1));

        let wrapped = Stored::Object(StoredObject {
            id: Uuid::new_v4(),
            value: Value::from(2),
        });
        assert_eq!(wrapped.into_value(), Value::from(2));
    }
}
