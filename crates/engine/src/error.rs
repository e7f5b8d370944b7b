//! Error taxonomy for component state operations.
//!
//! Every variant is local and recoverable: it is returned to the caller that
//! triggered the operation and never escalated through the notification
//! channel.

use thiserror::Error;

/// Errors returned by registry, selection and control operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The instance id has not been registered (or was already unregistered).
    #[error("instance not registered: {id}")]
    NotFound { id: String },

    /// The requested key is not among the instance's current items.
    #[error("key '{key}' is not an item of instance '{id}'")]
    InvalidKey { id: String, key: String },

    /// A mount or render supplied no items, so no selection can exist.
    #[error("instance '{id}' has no items")]
    EmptyItems { id: String },

    /// Two items of the same instance share a key.
    #[error("instance '{id}' lists key '{key}' more than once")]
    DuplicateKey { id: String, key: String },
}

impl StateError {
    pub(crate) fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    pub(crate) fn invalid_key(id: &str, key: &str) -> Self {
        Self::InvalidKey {
            id: id.to_string(),
            key: key.to_string(),
        }
    }
}
