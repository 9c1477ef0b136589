//! The buddy-list node tree.
//!
//! Nodes live in an arena keyed by [`NodeId`]. Each node knows its parent,
//! first child and both siblings; children of one parent form a doubly
//! linked list in insertion order. Top-level nodes (groups) form the root
//! sibling list and have no parent.
//!
//! This module only maintains links. Which kinds may be nested where, and
//! the counters that depend on it, are the list's business.

use crate::buddy::Buddy;
use crate::chat::Chat;
use crate::contact::Contact;
use crate::counting::Counts;
use crate::group::Group;
use crate::settings::SettingsStore;
use blist_types::{AccountId, NodeId};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Variant payload of a node.
#[derive(Debug)]
pub enum NodeKind {
    /// A buddy (leaf, child of a contact).
    Buddy(Buddy),
    /// A contact (child of a group, parent of buddies).
    Contact(Contact),
    /// A chat (leaf, child of a group).
    Chat(Chat),
    /// A group (top level).
    Group(Group),
}

/// Tag of a [`NodeKind`], for matching without borrowing the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// See [`NodeKind::Buddy`].
    Buddy,
    /// See [`NodeKind::Contact`].
    Contact,
    /// See [`NodeKind::Chat`].
    Chat,
    /// See [`NodeKind::Group`].
    Group,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Buddy => "buddy",
            NodeType::Contact => "contact",
            NodeType::Chat => "chat",
            NodeType::Group => "group",
        };
        f.write_str(name)
    }
}

impl NodeKind {
    /// The tag of this payload.
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Buddy(_) => NodeType::Buddy,
            NodeKind::Contact(_) => NodeType::Contact,
            NodeKind::Chat(_) => NodeType::Chat,
            NodeKind::Group(_) => NodeType::Group,
        }
    }
}

impl From<Buddy> for NodeKind {
    fn from(buddy: Buddy) -> Self {
        NodeKind::Buddy(buddy)
    }
}

impl From<Contact> for NodeKind {
    fn from(contact: Contact) -> Self {
        NodeKind::Contact(contact)
    }
}

impl From<Chat> for NodeKind {
    fn from(chat: Chat) -> Self {
        NodeKind::Chat(chat)
    }
}

impl From<Group> for NodeKind {
    fn from(group: Group) -> Self {
        NodeKind::Group(group)
    }
}

/// One node of the tree.
pub struct Node {
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    next: Option<NodeId>,
    prev: Option<NodeId>,
    settings: SettingsStore,
    transient: bool,
    ui_data: Option<Box<dyn Any>>,
    kind: NodeKind,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            first_child: None,
            next: None,
            prev: None,
            settings: SettingsStore::new(),
            transient: false,
            ui_data: None,
            kind,
        }
    }

    /// Parent node.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// First child.
    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    /// Next sibling.
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    /// Previous sibling.
    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    /// Node settings.
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub(crate) fn settings_mut(&mut self) -> &mut SettingsStore {
        &mut self.settings
    }

    /// Transient nodes are never written out.
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub(crate) fn set_transient(&mut self, transient: bool) {
        self.transient = transient;
    }

    /// UI shadow state; never inspected by the core.
    pub fn ui_data(&self) -> Option<&dyn Any> {
        self.ui_data.as_deref()
    }

    /// Replace the UI shadow state, returning the old one.
    pub fn set_ui_data(&mut self, data: Option<Box<dyn Any>>) -> Option<Box<dyn Any>> {
        std::mem::replace(&mut self.ui_data, data)
    }

    /// Variant payload.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// Variant tag.
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Counters, for contacts and groups.
    pub fn counts(&self) -> Option<&Counts> {
        match &self.kind {
            NodeKind::Contact(c) => Some(c.counts()),
            NodeKind::Group(g) => Some(g.counts()),
            _ => None,
        }
    }

    pub(crate) fn counts_mut(&mut self) -> Option<&mut Counts> {
        match &mut self.kind {
            NodeKind::Contact(c) => Some(c.counts_mut()),
            NodeKind::Group(g) => Some(g.counts_mut()),
            _ => None,
        }
    }

    /// Account of a buddy or chat node.
    pub fn account(&self) -> Option<AccountId> {
        match &self.kind {
            NodeKind::Buddy(b) => Some(b.account()),
            NodeKind::Chat(c) => Some(c.account()),
            _ => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("parent", &self.parent)
            .field("first_child", &self.first_child)
            .field("next", &self.next)
            .field("prev", &self.prev)
            .field("transient", &self.transient)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Arena of nodes plus the root sibling list.
#[derive(Debug)]
pub struct NodeTree {
    nodes: HashMap<NodeId, Node>,
    root: Option<NodeId>,
    next_id: NodeId,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! typed_accessors {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty) => {
        /// Typed view of a node; `None` if absent or of another kind.
        pub fn $get(&self, id: NodeId) -> Option<&$ty> {
            match &self.nodes.get(&id)?.kind {
                NodeKind::$variant(v) => Some(v),
                _ => None,
            }
        }

        pub(crate) fn $get_mut(&mut self, id: NodeId) -> Option<&mut $ty> {
            match &mut self.nodes.get_mut(&id)?.kind {
                NodeKind::$variant(v) => Some(v),
                _ => None,
            }
        }
    };
}

impl NodeTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            root: None,
            next_id: NodeId::new(1),
        }
    }

    /// First top-level node.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the handle resolves.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    typed_accessors!(buddy, buddy_mut, Buddy, Buddy);
    typed_accessors!(contact, contact_mut, Contact, Contact);
    typed_accessors!(chat, chat_mut, Chat, Chat);
    typed_accessors!(group, group_mut, Group, Group);

    /// Variant tag of a node.
    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.get(id).map(Node::node_type)
    }

    /// Allocate a detached node.
    pub(crate) fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = self.next_id;
        self.next_id = id.next();
        self.nodes.insert(id, Node::new(kind));
        id
    }

    /// Drop a node from the arena. It must already be detached and childless.
    pub(crate) fn take(&mut self, id: NodeId) -> Option<Node> {
        debug_assert!(
            self.get(id)
                .is_some_and(|n| n.parent.is_none() && n.first_child.is_none() && self.root != Some(id)),
            "taking an attached node"
        );
        self.nodes.remove(&id)
    }

    /// Parent of `node`.
    pub fn get_parent(&self, node: Option<NodeId>) -> Option<NodeId> {
        self.get(node?)?.parent
    }

    /// First child of `node`.
    pub fn get_first_child(&self, node: Option<NodeId>) -> Option<NodeId> {
        self.get(node?)?.first_child
    }

    /// Next sibling of `node`.
    pub fn get_sibling_next(&self, node: Option<NodeId>) -> Option<NodeId> {
        self.get(node?)?.next
    }

    /// Previous sibling of `node`.
    pub fn get_sibling_prev(&self, node: Option<NodeId>) -> Option<NodeId> {
        self.get(node?)?.prev
    }

    /// Depth-first successor of `node`.
    ///
    /// With `go_deep` the first child comes first; otherwise (and once a
    /// node has no children) the next sibling, then the next sibling of
    /// the nearest ancestor that has one. `None` past the last node.
    pub fn next_node(&self, node: Option<NodeId>, go_deep: bool) -> Option<NodeId> {
        let mut current = self.get(node?)?;
        if go_deep {
            if let Some(child) = current.first_child {
                return Some(child);
            }
        }
        loop {
            if let Some(next) = current.next {
                return Some(next);
            }
            current = self.get(current.parent?)?;
        }
    }

    /// Next visible node.
    ///
    /// With `include_offline` this is [`NodeTree::next_node`]; otherwise
    /// buddies whose account is not connected are skipped.
    pub fn blist_next(
        &self,
        node: Option<NodeId>,
        include_offline: bool,
        is_connected: impl Fn(AccountId) -> bool,
    ) -> Option<NodeId> {
        let mut current = self.next_node(node, true);
        if include_offline {
            return current;
        }
        while let Some(id) = current {
            match self.buddy(id) {
                Some(buddy) if !is_connected(buddy.account()) => {
                    current = self.next_node(Some(id), true);
                }
                _ => break,
            }
        }
        current
    }

    /// Iterate over the children of `parent` in order.
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(parent).and_then(|n| n.first_child),
        }
    }

    /// Iterate over the top-level nodes in order.
    pub fn roots(&self) -> Children<'_> {
        Children {
            tree: self,
            next: self.root,
        }
    }

    /// Every attached node in depth-first order.
    pub fn walk(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.root, move |&id| self.next_node(Some(id), true))
    }

    /// Last child of `parent`.
    pub fn last_child(&self, parent: NodeId) -> Option<NodeId> {
        self.children(parent).last()
    }

    fn last_root(&self) -> Option<NodeId> {
        self.roots().last()
    }

    /// True if `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get_parent(Some(id));
        }
        false
    }

    /// Whether `node` is linked into the tree.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.get(node)
            .is_some_and(|n| n.parent.is_some() || n.prev.is_some() || self.root == Some(node))
    }

    /// Link a detached node after `after`, or at the end of `parent`'s
    /// children (the root list when `parent` is `None`).
    ///
    /// `after` must be a child of `parent`; otherwise the node is appended.
    pub(crate) fn attach(&mut self, node: NodeId, parent: Option<NodeId>, after: Option<NodeId>) {
        debug_assert!(!self.is_attached(node), "attaching an attached node");
        let after = after
            .filter(|&a| a != node && self.is_attached(a) && self.get(a).is_some_and(|n| n.parent == parent))
            .or_else(|| match parent {
                Some(p) => self.last_child(p),
                None => self.last_root(),
            });
        let next = match after {
            Some(a) => self.get(a).and_then(|n| n.next),
            None => match parent {
                Some(p) => self.get(p).and_then(|n| n.first_child),
                None => self.root,
            },
        };

        if let Some(n) = self.get_mut(node) {
            n.parent = parent;
            n.prev = after;
            n.next = next;
        }
        match after {
            Some(a) => {
                if let Some(n) = self.get_mut(a) {
                    n.next = Some(node);
                }
            }
            None => match parent {
                Some(p) => {
                    if let Some(n) = self.get_mut(p) {
                        n.first_child = Some(node);
                    }
                }
                None => self.root = Some(node),
            },
        }
        if let Some(n) = next.and_then(|id| self.get_mut(id)) {
            n.prev = Some(node);
        }
    }

    /// Unlink a node from its parent and siblings. Its own children stay.
    pub(crate) fn detach(&mut self, node: NodeId) {
        let Some(n) = self.get(node) else {
            return;
        };
        let (parent, prev, next) = (n.parent, n.prev, n.next);

        match prev {
            Some(p) => {
                if let Some(p) = self.get_mut(p) {
                    p.next = next;
                }
            }
            None => match parent {
                Some(p) => {
                    if let Some(p) = self.get_mut(p) {
                        if p.first_child == Some(node) {
                            p.first_child = next;
                        }
                    }
                }
                None => {
                    if self.root == Some(node) {
                        self.root = next;
                    }
                }
            },
        }
        if let Some(n) = next.and_then(|id| self.get_mut(id)) {
            n.prev = prev;
        }
        if let Some(n) = self.get_mut(node) {
            n.parent = None;
            n.prev = None;
            n.next = None;
        }
    }
}

/// Iterator over a sibling list.
pub struct Children<'a> {
    tree: &'a NodeTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.get(id).and_then(|n| n.next);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(tree: &mut NodeTree, name: &str) -> NodeId {
        let id = tree.insert(Group::new(name).into());
        tree.attach(id, None, None);
        id
    }

    fn contact(tree: &mut NodeTree, parent: NodeId) -> NodeId {
        let id = tree.insert(Contact::new().into());
        tree.attach(id, Some(parent), None);
        id
    }

    /// Every child appears once under its parent and prev/next agree.
    fn assert_links(tree: &NodeTree) {
        for id in tree.walk() {
            let node = tree.get(id).unwrap();
            if let Some(next) = node.next() {
                assert_eq!(tree.get(next).unwrap().prev(), Some(id));
                assert_eq!(tree.get(next).unwrap().parent(), node.parent());
            }
            if let Some(prev) = node.prev() {
                assert_eq!(tree.get(prev).unwrap().next(), Some(id));
            }
            let siblings: Vec<NodeId> = match node.parent() {
                Some(p) => tree.children(p).collect(),
                None => tree.roots().collect(),
            };
            assert_eq!(siblings.iter().filter(|&&s| s == id).count(), 1);
        }
    }

    #[test]
    fn attach_appends_in_order() {
        let mut tree = NodeTree::new();
        let a = group(&mut tree, "a");
        let b = group(&mut tree, "b");
        let c1 = contact(&mut tree, a);
        let c2 = contact(&mut tree, a);

        assert_eq!(tree.roots().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(tree.children(a).collect::<Vec<_>>(), vec![c1, c2]);
        assert_eq!(tree.get_parent(Some(c2)), Some(a));
        assert_eq!(tree.get_sibling_prev(Some(c2)), Some(c1));
        assert_eq!(tree.get_sibling_next(Some(c1)), Some(c2));
        assert_eq!(tree.get_first_child(Some(a)), Some(c1));
        assert_links(&tree);
    }

    #[test]
    fn attach_after_sibling() {
        let mut tree = NodeTree::new();
        let g = group(&mut tree, "g");
        let c1 = contact(&mut tree, g);
        let c3 = contact(&mut tree, g);
        let c2 = tree.insert(Contact::new().into());
        tree.attach(c2, Some(g), Some(c1));
        assert_eq!(tree.children(g).collect::<Vec<_>>(), vec![c1, c2, c3]);
        assert_links(&tree);
    }

    #[test]
    fn detach_relinks_neighbours() {
        let mut tree = NodeTree::new();
        let g = group(&mut tree, "g");
        let c1 = contact(&mut tree, g);
        let c2 = contact(&mut tree, g);
        let c3 = contact(&mut tree, g);

        tree.detach(c2);
        assert_eq!(tree.children(g).collect::<Vec<_>>(), vec![c1, c3]);
        assert!(!tree.is_attached(c2));

        tree.detach(c1);
        assert_eq!(tree.get_first_child(Some(g)), Some(c3));
        assert_eq!(tree.get_sibling_prev(Some(c3)), None);
        assert_links(&tree);

        tree.detach(g);
        assert_eq!(tree.root(), None);
    }

    #[test]
    fn navigation_is_null_safe() {
        let tree = NodeTree::new();
        assert_eq!(tree.get_parent(None), None);
        assert_eq!(tree.get_first_child(Some(NodeId::new(99))), None);
        assert_eq!(tree.next_node(None, true), None);
    }

    #[test]
    fn next_node_depth_first() {
        let mut tree = NodeTree::new();
        let a = group(&mut tree, "a");
        let ca = contact(&mut tree, a);
        let b = group(&mut tree, "b");
        let cb = contact(&mut tree, b);

        assert_eq!(tree.next_node(Some(a), true), Some(ca));
        assert_eq!(tree.next_node(Some(a), false), Some(b));
        assert_eq!(tree.next_node(Some(ca), true), Some(b));
        assert_eq!(tree.next_node(Some(cb), true), None);
        assert_eq!(tree.walk().collect::<Vec<_>>(), vec![a, ca, b, cb]);
    }

    #[test]
    fn ancestry() {
        let mut tree = NodeTree::new();
        let g = group(&mut tree, "g");
        let c = contact(&mut tree, g);
        assert!(tree.is_ancestor_or_self(g, c));
        assert!(tree.is_ancestor_or_self(c, c));
        assert!(!tree.is_ancestor_or_self(c, g));
    }

    #[test]
    fn typed_accessors_check_kind() {
        let mut tree = NodeTree::new();
        let g = group(&mut tree, "Friends");
        assert_eq!(tree.group(g).unwrap().name(), "Friends");
        assert!(tree.contact(g).is_none());
        assert_eq!(tree.node_type(g), Some(NodeType::Group));
    }

    #[test]
    fn take_frees_handle_without_reuse() {
        let mut tree = NodeTree::new();
        let c = tree.insert(Contact::new().into());
        assert!(tree.take(c).is_some());
        let d = tree.insert(Contact::new().into());
        assert_ne!(c, d);
        assert!(!tree.contains(c));
    }
}
