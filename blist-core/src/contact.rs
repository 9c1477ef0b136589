//! Contact nodes.

use crate::buddy::replace_alias;
use crate::counting::Counts;
use blist_types::NodeId;

/// A contact: a set of buddies shown as one person.
///
/// The priority buddy is cached; `priority_valid == false` means the
/// cached value is stale and will be recomputed on the next read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    alias: Option<String>,
    counts: Counts,
    priority_buddy: Option<NodeId>,
    priority_valid: bool,
}

impl Contact {
    /// Create an empty contact.
    pub fn new() -> Self {
        Self::default()
    }

    /// The user's alias for this contact.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub(crate) fn set_alias(&mut self, alias: Option<&str>) -> Option<Option<String>> {
        replace_alias(&mut self.alias, alias)
    }

    /// Child counters.
    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    pub(crate) fn counts_mut(&mut self) -> &mut Counts {
        &mut self.counts
    }

    /// Whether the priority cache is current.
    pub fn priority_valid(&self) -> bool {
        self.priority_valid
    }

    /// The cached priority buddy, current or not.
    pub fn cached_priority_buddy(&self) -> Option<NodeId> {
        self.priority_buddy
    }

    /// Mark the priority cache stale.
    pub fn invalidate_priority_buddy(&mut self) {
        self.priority_valid = false;
    }

    pub(crate) fn store_priority_buddy(&mut self, buddy: Option<NodeId>) {
        self.priority_buddy = buddy;
        self.priority_valid = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_contact_has_stale_cache() {
        let c = Contact::new();
        assert!(!c.priority_valid());
        assert_eq!(c.cached_priority_buddy(), None);
        assert_eq!(c.counts(), &Counts::default());
    }

    #[test]
    fn invalidate_is_idempotent() {
        let mut c = Contact::new();
        c.store_priority_buddy(Some(NodeId::new(4)));
        c.invalidate_priority_buddy();
        let once = c.clone();
        c.invalidate_priority_buddy();
        assert_eq!(c, once);
        assert_eq!(c.cached_priority_buddy(), Some(NodeId::new(4)));
    }

    #[test]
    fn alias_normalizes() {
        let mut c = Contact::new();
        assert_eq!(c.set_alias(Some(" Carol ")), Some(None));
        assert_eq!(c.alias(), Some("Carol"));
        assert_eq!(c.set_alias(Some("")), Some(Some("Carol".into())));
        assert_eq!(c.alias(), None);
    }
}
