//! Error types for cellflow-core

use thiserror::Error;

use crate::handle::Handle;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while talking to a store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Handle has no object locator yet
    #[error("Handle {0} does not reference a stored object")]
    NotMaterialized(Handle),

    /// No object behind the handle
    #[error("No stored object for handle {0}")]
    NotFound(Handle),

    /// Handle belongs to a different store location
    #[error("Handle {handle} does not belong to store at {location}")]
    ForeignHandle { handle: Handle, location: String },

    /// Malformed handle text
    #[error("Invalid handle: {0:?}")]
    InvalidHandle(String),

    /// Backend-specific failure
    #[error("Store backend error: {0}")]
    Backend(String),
}
