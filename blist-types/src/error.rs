//! Error types for the buddy-list core.

use crate::{AccountId, NodeId, ValueKind};
use thiserror::Error;

/// Errors that can occur in buddy-list and presence operations.
///
/// Most of these are recovered locally by the caller (a default value is
/// returned, or the mutation is dropped); they are still surfaced as
/// values so that strict callers and tests can observe them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlistError {
    /// A setting or attribute was read with the wrong type
    #[error("type mismatch for {key}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Setting key or attribute id.
        key: String,
        /// The type the caller asked for.
        expected: ValueKind,
        /// The type actually stored.
        found: ValueKind,
    },

    /// Direct deactivation of an exclusive status
    #[error("cannot deactivate exclusive status {status}")]
    InvalidTransition {
        /// Id of the status.
        status: String,
    },

    /// Attribute id not present in the status type schema
    #[error("status {status} has no attribute {attribute}")]
    UnknownAttribute {
        /// Id of the status.
        status: String,
        /// Id of the attribute.
        attribute: String,
    },

    /// Status id not present in the presence
    #[error("unknown status: {status}")]
    UnknownStatus {
        /// Id of the status.
        status: String,
    },

    /// Node handle does not resolve (destroyed or never allocated)
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// Account id is not registered
    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),

    /// A group of that name already exists
    #[error("group already exists: {0}")]
    DuplicateGroup(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = BlistError::InvalidTransition {
            status: "available".into(),
        };
        assert_eq!(err.to_string(), "cannot deactivate exclusive status available");
    }

    #[test]
    fn type_mismatch_display() {
        let err = BlistError::TypeMismatch {
            key: "last_seen".into(),
            expected: ValueKind::Int,
            found: ValueKind::String,
        };
        assert_eq!(
            err.to_string(),
            "type mismatch for last_seen: expected int, found string"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BlistError>();
    }
}
