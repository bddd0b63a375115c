//! Store handles
//!
//! A handle is the opaque reference a cell keeps in place of a persisted
//! value. It is rendered as `location#fragment`, where the fragment is the
//! object locator assigned by the store. A handle without a fragment points
//! at a store location but at no object yet.

use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Reference to an object held by a [`Store`](crate::Store)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Handle {
    /// Store location (e.g. "mem://objects")
    pub location: String,
    /// Object locator within the store, if the object exists
    pub fragment: Option<String>,
}

impl Handle {
    /// Create a handle to a location with no object behind it yet
    pub fn unmaterialized(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            fragment: None,
        }
    }

    /// Create a handle to a stored object
    pub fn materialized(location: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            fragment: Some(fragment.into()),
        }
    }

    /// Check if the handle references an existing object
    pub fn is_materialized(&self) -> bool {
        self.fragment.is_some()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fragment {
            Some(fragment) => write!(f, "{}#{}", self.location, fragment),
            None => write!(f, "{}", self.location),
        }
    }
}

impl FromStr for Handle {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(StoreError::InvalidHandle(s.to_string()));
        }

        match s.split_once('#') {
            Some((location, fragment)) => {
                if location.is_empty() {
                    return Err(StoreError::InvalidHandle(s.to_string()));
                }
                if fragment.is_empty() {
                    Ok(Handle::unmaterialized(location))
                } else {
                    Ok(Handle::materialized(location, fragment))
                }
            }
            None => Ok(Handle::unmaterialized(s)),
        }
    }
}
