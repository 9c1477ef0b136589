//! Identity types for buddy-list nodes and accounts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a node inside a buddy list arena.
///
/// Handles are allocated monotonically by the owning list and never
/// reused, so a stale handle can only miss, never alias another node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a NodeId from its raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value of this NodeId.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The handle following this one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A unique identifier for an account.
///
/// UUID v4 format (16 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(uuid::Uuid);

impl AccountId {
    /// Create a new random AccountId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Create an AccountId from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        uuid::Uuid::from_slice(bytes).ok().map(Self)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", &self.to_string()[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_ordering() {
        let a = NodeId::new(1);
        let b = NodeId::new(2);
        assert!(a < b);
        assert_eq!(a.next(), b);
    }

    #[test]
    fn node_id_saturates() {
        let id = NodeId::new(u64::MAX);
        assert_eq!(id.next().value(), u64::MAX);
    }

    #[test]
    fn account_id_is_uuid_v4() {
        let id = AccountId::new();
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn account_ids_differ() {
        assert_ne!(AccountId::new(), AccountId::new());
    }

    #[test]
    fn account_id_from_bytes() {
        let id = AccountId::new();
        let restored = AccountId::from_bytes(id.as_uuid().as_bytes()).unwrap();
        assert_eq!(id, restored);
        assert!(AccountId::from_bytes(&[0u8; 3]).is_none());
    }

    #[test]
    fn account_id_debug_is_short() {
        let id = AccountId::new();
        assert_eq!(format!("{:?}", id).len(), "AccountId()".len() + 8);
    }
}
