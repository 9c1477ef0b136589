//! The buddy list manager.
//!
//! [`BuddyList`] owns the node arena, the account registry and the injected
//! [`Preferences`]. Every mutation goes through it so that counters,
//! priority caches and notifications stay consistent with the tree:
//!
//! - structural edits (add, move, remove, merge) live in `tree_ops`
//! - presence and account state in `status_ops`
//! - per-node setters and lookups in `node_ops`
//!
//! Observer hooks run synchronously after the change they report has been
//! committed. Signals are emitted on the list's [`SignalBus`].

mod node_ops;
mod snapshot;
mod status_ops;
mod tree_ops;

pub use snapshot::{BuddySnapshot, ChatSnapshot, ContactSnapshot, GroupSnapshot, MemberSnapshot, Snapshot};

use crate::account::{Account, Accounts};
use crate::node::{Node, NodeTree, NodeType};
use crate::observer::{BlistObserver, NoopObserver};
use crate::prefs::Preferences;
use crate::priority::compute_priority_buddy;
use crate::signals::{BlistEvent, SignalBus};
use blist_types::{AccountId, BlistError, NodeId, Value};
use std::any::Any;
use std::fmt;

/// Setting written when a buddy signs off, in unix seconds.
pub const LAST_SEEN: &str = "last_seen";

/// Name of the group created when a buddy is added without one.
pub const DEFAULT_GROUP: &str = "Buddies";

/// The buddy list.
pub struct BuddyList {
    tree: NodeTree,
    accounts: Accounts,
    prefs: Preferences,
    observer: Box<dyn BlistObserver>,
    signals: SignalBus,
}

impl BuddyList {
    /// Create an empty list with no observer.
    pub fn new(prefs: Preferences) -> Self {
        Self::with_observer(prefs, NoopObserver)
    }

    /// Create an empty list reporting to `observer`.
    pub fn with_observer(prefs: Preferences, observer: impl BlistObserver + 'static) -> Self {
        Self {
            tree: NodeTree::new(),
            accounts: Accounts::new(),
            prefs,
            observer: Box::new(observer),
            signals: SignalBus::new(),
        }
    }

    /// The node tree.
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// The account registry.
    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    /// Look up an account.
    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    /// Current preferences.
    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Replace the preferences and invalidate every priority cache.
    pub fn set_preferences(&mut self, prefs: Preferences) {
        self.prefs = prefs;
        let contacts: Vec<NodeId> = self
            .tree
            .walk()
            .filter(|&id| self.tree.node_type(id) == Some(NodeType::Contact))
            .collect();
        tracing::debug!(contacts = contacts.len(), "preferences reloaded");
        for contact in contacts {
            self.invalidate_priority_buddy(contact);
        }
    }

    /// Signal bus for connecting handlers.
    pub fn signals_mut(&mut self) -> &mut SignalBus {
        &mut self.signals
    }

    /// Next visible node after `node`, see [`NodeTree::blist_next`].
    pub fn blist_next(&self, node: Option<NodeId>, include_offline: bool) -> Option<NodeId> {
        self.tree
            .blist_next(node, include_offline, |a| self.accounts.is_connected(a))
    }

    // Settings

    /// Store a bool setting.
    pub fn set_bool(&mut self, node: NodeId, key: &str, value: bool) -> Result<(), BlistError> {
        self.set_setting(node, key, Value::Bool(value))
    }

    /// Store an int setting.
    pub fn set_int(&mut self, node: NodeId, key: &str, value: i64) -> Result<(), BlistError> {
        self.set_setting(node, key, Value::Int(value))
    }

    /// Store a string setting.
    pub fn set_string(&mut self, node: NodeId, key: &str, value: &str) -> Result<(), BlistError> {
        self.set_setting(node, key, Value::String(value.to_string()))
    }

    fn set_setting(&mut self, node: NodeId, key: &str, value: Value) -> Result<(), BlistError> {
        self.node_mut(node)?.settings_mut().set(key, value);
        self.notify_save(node);
        Ok(())
    }

    /// Read a bool setting; `false` when absent or of another type.
    pub fn get_bool(&self, node: NodeId, key: &str) -> bool {
        self.tree
            .get(node)
            .is_some_and(|n| n.settings().get_bool(key))
    }

    /// Read an int setting; `0` when absent or of another type.
    pub fn get_int(&self, node: NodeId, key: &str) -> i64 {
        self.tree
            .get(node)
            .map_or(0, |n| n.settings().get_int(key))
    }

    /// Read a string setting; `None` when absent or of another type.
    pub fn get_string(&self, node: NodeId, key: &str) -> Option<&str> {
        self.tree.get(node)?.settings().get_string(key)
    }

    /// Whether `key` is set on `node`.
    pub fn has_setting(&self, node: NodeId, key: &str) -> bool {
        self.tree
            .get(node)
            .is_some_and(|n| n.settings().contains(key))
    }

    /// Remove a setting. Returns whether it was present.
    pub fn remove_setting(&mut self, node: NodeId, key: &str) -> Result<bool, BlistError> {
        let removed = self.node_mut(node)?.settings_mut().remove(key).is_some();
        if removed {
            self.notify_save(node);
        }
        Ok(removed)
    }

    /// Mark a node transient.
    pub fn set_transient(&mut self, node: NodeId, transient: bool) -> Result<(), BlistError> {
        self.node_mut(node)?.set_transient(transient);
        Ok(())
    }

    /// Attach UI shadow state, returning what was there.
    pub fn set_ui_data(
        &mut self,
        node: NodeId,
        data: Option<Box<dyn Any>>,
    ) -> Result<Option<Box<dyn Any>>, BlistError> {
        Ok(self.node_mut(node)?.set_ui_data(data))
    }

    // Priority buddy

    /// The contact's priority buddy, recomputed if the cache is stale.
    ///
    /// Each recompute emits [`BlistEvent::PriorityBuddyChanged`]; a cached
    /// read emits nothing.
    pub fn get_priority_buddy(&mut self, contact: NodeId) -> Option<NodeId> {
        let cached = self.tree.contact(contact)?;
        if cached.priority_valid() {
            return cached.cached_priority_buddy();
        }

        let best = compute_priority_buddy(&self.tree, &self.accounts, contact, &self.prefs);
        if let Some(c) = self.tree.contact_mut(contact) {
            c.store_priority_buddy(best);
        }
        self.emit(BlistEvent::PriorityBuddyChanged {
            contact,
            buddy: best,
        });
        best
    }

    /// Mark the contact's priority cache stale.
    pub fn invalidate_priority_buddy(&mut self, contact: NodeId) {
        if let Some(c) = self.tree.contact_mut(contact) {
            c.invalidate_priority_buddy();
        }
    }

    // Internals

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, BlistError> {
        self.tree.get_mut(id).ok_or(BlistError::UnknownNode(id))
    }

    /// `Ok(false)` (and a debug assertion) when `id` is not a `kind`.
    fn check_kind(&self, id: NodeId, kind: NodeType) -> Result<bool, BlistError> {
        let found = self.tree.node_type(id).ok_or(BlistError::UnknownNode(id))?;
        let valid = found == kind;
        debug_assert!(valid, "{id} is a {found}, expected a {kind}");
        if !valid {
            tracing::warn!(%id, %found, expected = %kind, "node of unexpected kind");
        }
        Ok(valid)
    }

    fn is_kind(&self, id: NodeId, kind: NodeType) -> bool {
        self.tree.node_type(id) == Some(kind)
    }

    fn invalidate_contact_of(&mut self, buddy: NodeId) {
        if let Some(contact) = self.tree.get_parent(Some(buddy)) {
            self.invalidate_priority_buddy(contact);
        }
    }

    fn notify_new(&mut self, node: NodeId) {
        self.observer.new_node(&self.tree, node);
    }

    fn notify_update(&mut self, node: NodeId) {
        self.observer.update(&self.tree, node);
    }

    fn notify_save(&mut self, node: NodeId) {
        self.observer.save_node(&self.tree, node);
    }

    fn emit(&mut self, event: BlistEvent) {
        self.signals.emit(&event);
    }
}

impl fmt::Debug for BuddyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuddyList")
            .field("nodes", &self.tree.len())
            .field("accounts", &self.accounts.len())
            .field("prefs", &self.prefs)
            .field("signals", &self.signals)
            .finish_non_exhaustive()
    }
}

/// Current time in unix seconds.
fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Saves(Rc<RefCell<Vec<NodeId>>>);

    impl BlistObserver for Saves {
        fn save_node(&mut self, _tree: &NodeTree, node: NodeId) {
            self.0.borrow_mut().push(node);
        }
    }

    #[test]
    fn settings_save_after_commit() {
        let saves = Saves::default();
        let mut list = BuddyList::with_observer(Preferences::default(), saves.clone());
        let group = list.new_group("Friends");

        list.set_int(group, "collapsed", 1).unwrap();
        list.set_string(group, "color", "red").unwrap();
        assert_eq!(saves.0.borrow().len(), 2);
        assert_eq!(list.get_int(group, "collapsed"), 1);
        assert_eq!(list.get_string(group, "color"), Some("red"));

        // mismatched reads default
        assert!(!list.get_bool(group, "color"));
        assert_eq!(list.get_int(group, "color"), 0);

        assert!(list.remove_setting(group, "color").unwrap());
        assert!(!list.remove_setting(group, "color").unwrap());
        assert_eq!(saves.0.borrow().len(), 3);
        assert!(!list.has_setting(group, "color"));
    }

    #[test]
    fn settings_on_unknown_node() {
        let mut list = BuddyList::new(Preferences::default());
        let missing = NodeId::new(404);
        assert_eq!(
            list.set_bool(missing, "k", true),
            Err(BlistError::UnknownNode(missing))
        );
        assert!(!list.get_bool(missing, "k"));
        assert_eq!(list.get_string(missing, "k"), None);
    }

    #[test]
    fn ui_data_is_opaque() {
        let mut list = BuddyList::new(Preferences::default());
        let group = list.new_group("g");
        assert!(list.set_ui_data(group, Some(Box::new("row-7"))).unwrap().is_none());
        let data = list.tree().get(group).unwrap().ui_data();
        assert_eq!(data.and_then(|d| d.downcast_ref::<&str>()), Some(&"row-7"));
    }
}
