//! # cellflow-core
//!
//! Core data types for the cellflow evaluation engine.
//!
//! This crate provides:
//! - [`Value`] - Plain data carried by cells (numbers, strings, lists, handles)
//! - [`Handle`] - Reference to an object held by a store
//! - [`Store`] - The durable object store a persistent cell writes through
//! - [`MemoryStore`] - An in-process [`Store`]
//!
//! ## Example
//!
//! ```rust
//! use cellflow_core::{MemoryStore, Store, Value};
//!
//! let store = MemoryStore::new();
//! let handle = store.write(&Value::from(42.0)).unwrap();
//! assert_eq!(store.read(&handle).unwrap().into_value(), Value::from(42.0));
//! ```

pub mod error;
pub mod handle;
pub mod store;
pub mod value;

pub use error::{StoreError, StoreResult};
pub use handle::Handle;
pub use store::{MemoryStore, Store, Stored, StoredObject};
pub use value::Value;
