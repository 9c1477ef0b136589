//! Counters carried by contacts and groups.
//!
//! A contact counts its buddies; a group counts its contacts (and chats).
//! `online` is maintained incrementally at presence edges with a
//! threshold rule: a group's online count moves only when a contact's
//! count crosses between 0 and 1.

use serde::Serialize;

/// Aggregate child counters of a counting node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    /// Number of direct children.
    pub total_size: u32,
    /// Children on connected accounts.
    pub current_size: u32,
    /// Children that are online.
    pub online: u32,
}

impl Counts {
    /// Increment `online`; returns true on the 0→1 edge.
    pub(crate) fn online_inc(&mut self) -> bool {
        self.online += 1;
        self.online == 1
    }

    /// Decrement `online`; returns true on the 1→0 edge.
    pub(crate) fn online_dec(&mut self) -> bool {
        if self.online == 0 {
            tracing::warn!("online count underflow");
            return false;
        }
        self.online -= 1;
        self.online == 0
    }

    /// Increment `current_size`; returns true on the 0→1 edge.
    pub(crate) fn current_inc(&mut self) -> bool {
        self.current_size += 1;
        self.current_size == 1
    }

    /// Decrement `current_size`; returns true on the 1→0 edge.
    pub(crate) fn current_dec(&mut self) -> bool {
        if self.current_size == 0 {
            tracing::warn!("current size underflow");
            return false;
        }
        self.current_size -= 1;
        self.current_size == 0
    }

    pub(crate) fn total_inc(&mut self) {
        self.total_size += 1;
    }

    pub(crate) fn total_dec(&mut self) {
        self.total_size = self.total_size.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn online_edges() {
        let mut c = Counts::default();
        assert!(c.online_inc());
        assert!(!c.online_inc());
        assert!(!c.online_dec());
        assert!(c.online_dec());
        assert_eq!(c.online, 0);
    }

    #[test]
    fn underflow_is_clamped() {
        let mut c = Counts::default();
        assert!(!c.online_dec());
        assert!(!c.current_dec());
        c.total_dec();
        assert_eq!(c, Counts::default());
    }

    #[test]
    fn current_edges() {
        let mut c = Counts::default();
        assert!(c.current_inc());
        assert!(!c.current_inc());
        assert!(!c.current_dec());
        assert!(c.current_dec());
    }
}
