//! Collaborator hooks invoked by the list.
//!
//! The list calls these synchronously, after the mutation they report has
//! been committed. Persistence and UI live behind this trait; the core
//! never inspects what they do.

use crate::buddy::Buddy;
use crate::node::NodeTree;
use blist_types::NodeId;
use std::any::Any;

/// Receiver of list lifecycle and persistence hooks.
///
/// Every method has a no-op default.
pub trait BlistObserver {
    /// A node was created.
    fn new_node(&mut self, _tree: &NodeTree, _node: NodeId) {}

    /// A node's display-relevant state changed.
    fn update(&mut self, _tree: &NodeTree, _node: NodeId) {}

    /// A node is about to be destroyed. It is already detached.
    fn remove(&mut self, _tree: &NodeTree, _node: NodeId) {}

    /// A persisted field of a node changed.
    fn save_node(&mut self, _tree: &NodeTree, _node: NodeId) {}

    /// A buddy was destroyed; release its protocol data.
    fn buddy_free(&mut self, _buddy: &Buddy, _protocol_data: Option<Box<dyn Any>>) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BlistObserver for NoopObserver {}
