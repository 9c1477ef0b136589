//! Structural edits and lookups.
//!
//! Every attach and detach of a buddy, contact or chat goes through
//! `attach_counted` / `detach_counted`, which move the child's contribution
//! to its parent's counters with the same threshold rule the presence path
//! uses. Moving a buddy is a detach followed by an attach, so counts stay
//! exact across moves.

use super::{BuddyList, DEFAULT_GROUP};
use crate::buddy::Buddy;
use crate::chat::Chat;
use crate::contact::Contact;
use crate::group::Group;
use crate::node::{Node, NodeKind, NodeType};
use blist_types::{AccountId, BlistError, NodeId};
use std::collections::BTreeMap;

/// What a child adds to its parent's counters besides `total_size`.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Contribution {
    pub(super) connected: bool,
    pub(super) online: bool,
}

impl BuddyList {
    /// Create a detached node and report it to the observer.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let node_type = kind.node_type();
        let id = self.tree.insert(kind);
        tracing::debug!(%id, kind = %node_type, "new node");
        self.notify_new(id);
        id
    }

    /// Create a detached group.
    pub fn new_group(&mut self, name: &str) -> NodeId {
        self.add_node(Group::new(name).into())
    }

    /// Create a detached contact.
    pub fn new_contact(&mut self) -> NodeId {
        self.add_node(Contact::new().into())
    }

    /// Create a detached buddy on `account`.
    pub fn new_buddy(
        &mut self,
        account: AccountId,
        name: &str,
        alias: Option<&str>,
    ) -> Result<NodeId, BlistError> {
        let account = self
            .accounts
            .get(account)
            .ok_or(BlistError::UnknownAccount(account))?;
        let buddy = Buddy::new(account, name, alias);
        Ok(self.add_node(buddy.into()))
    }

    /// Create a detached chat on `account`.
    pub fn new_chat(
        &mut self,
        account: AccountId,
        alias: Option<&str>,
        components: BTreeMap<String, String>,
    ) -> Result<NodeId, BlistError> {
        if self.accounts.get(account).is_none() {
            return Err(BlistError::UnknownAccount(account));
        }
        Ok(self.add_node(Chat::new(account, alias, components).into()))
    }

    /// The group named `name`, created at the end of the list if missing.
    pub fn find_or_add_group(&mut self, name: &str) -> NodeId {
        if let Some(existing) = self.find_group(name) {
            return existing;
        }
        let group = self.new_group(name);
        self.tree.attach(group, None, None);
        self.notify_update(group);
        self.notify_save(group);
        group
    }

    /// Attach a group at the top level, after `after` or at the end.
    ///
    /// A detached group whose name collides with an existing group is
    /// dropped and the existing group returned instead.
    pub fn add_group(&mut self, group: NodeId, after: Option<NodeId>) -> Result<NodeId, BlistError> {
        if !self.check_kind(group, NodeType::Group)? {
            return Ok(group);
        }
        let name = self
            .tree
            .group(group)
            .map(|g| g.name().to_string())
            .unwrap_or_default();
        if !self.tree.is_attached(group) {
            if let Some(existing) = self.find_group(&name) {
                tracing::debug!(%existing, name = %name, "group exists, dropping duplicate");
                self.destroy(group);
                return Ok(existing);
            }
        }

        self.tree.detach(group);
        self.tree.attach(group, None, after);
        self.notify_update(group);
        self.notify_save(group);
        Ok(group)
    }

    /// Attach or move a contact into `group` after `after`.
    ///
    /// Without a group the contact goes to `after`'s group, else the first
    /// group, else a new default group.
    pub fn add_contact(
        &mut self,
        contact: NodeId,
        group: Option<NodeId>,
        after: Option<NodeId>,
    ) -> Result<(), BlistError> {
        self.add_group_member(contact, NodeType::Contact, group, after)
    }

    /// Attach or move a chat into `group` after `after`.
    pub fn add_chat(
        &mut self,
        chat: NodeId,
        group: Option<NodeId>,
        after: Option<NodeId>,
    ) -> Result<(), BlistError> {
        self.add_group_member(chat, NodeType::Chat, group, after)
    }

    fn add_group_member(
        &mut self,
        node: NodeId,
        kind: NodeType,
        group: Option<NodeId>,
        after: Option<NodeId>,
    ) -> Result<(), BlistError> {
        if !self.check_kind(node, kind)? {
            return Ok(());
        }
        let group = self.resolve_group(group, after)?;
        if !self.check_kind(group, NodeType::Group)? {
            return Ok(());
        }
        self.detach_counted(node);
        self.attach_counted(node, group, after);
        self.notify_update(node);
        self.notify_save(node);
        Ok(())
    }

    /// Attach or move a buddy into a contact.
    ///
    /// The target is `contact`, else the contact of `after` when that is a
    /// buddy, else a new contact in `group` (see [`BuddyList::add_contact`]).
    /// A contact emptied by the move is removed. Returns the contact now
    /// holding the buddy, or `None` when the call was misused.
    pub fn add_buddy(
        &mut self,
        buddy: NodeId,
        contact: Option<NodeId>,
        group: Option<NodeId>,
        after: Option<NodeId>,
    ) -> Result<Option<NodeId>, BlistError> {
        if !self.check_kind(buddy, NodeType::Buddy)? {
            return Ok(None);
        }
        let target = match contact {
            Some(c) => {
                if !self.check_kind(c, NodeType::Contact)? {
                    return Ok(None);
                }
                c
            }
            None => {
                let sibling_contact = after
                    .filter(|&a| self.is_kind(a, NodeType::Buddy))
                    .and_then(|a| self.tree.get_parent(Some(a)));
                match sibling_contact {
                    Some(c) => c,
                    None => {
                        let c = self.new_contact();
                        self.add_contact(c, group, None)?;
                        c
                    }
                }
            }
        };
        let cyclic = self.tree.is_ancestor_or_self(buddy, target);
        debug_assert!(!cyclic, "cannot attach {buddy} under itself");
        if cyclic {
            tracing::warn!(%buddy, "refusing cyclic attach");
            return Ok(None);
        }

        let old_contact = self.tree.get_parent(Some(buddy));
        self.detach_counted(buddy);
        self.attach_counted(buddy, target, after);
        tracing::debug!(%buddy, contact = %target, "buddy attached");

        if let Some(old) = old_contact.filter(|&old| old != target) {
            if self.tree.children(old).next().is_none() {
                self.remove_contact(old)?;
            } else {
                self.notify_update(old);
            }
        }
        self.notify_update(buddy);
        self.notify_save(buddy);
        Ok(Some(target))
    }

    /// Remove and destroy a buddy. Its contact goes too if left empty.
    pub fn remove_buddy(&mut self, buddy: NodeId) -> Result<(), BlistError> {
        if !self.check_kind(buddy, NodeType::Buddy)? {
            return Ok(());
        }
        let contact = self.tree.get_parent(Some(buddy));
        self.detach_counted(buddy);
        self.destroy(buddy);
        if let Some(contact) = contact {
            if self.tree.children(contact).next().is_none() {
                self.remove_contact(contact)?;
            } else {
                self.notify_update(contact);
            }
        }
        Ok(())
    }

    /// Remove and destroy a contact and all its buddies.
    pub fn remove_contact(&mut self, contact: NodeId) -> Result<(), BlistError> {
        if !self.check_kind(contact, NodeType::Contact)? {
            return Ok(());
        }
        let group = self.tree.get_parent(Some(contact));
        self.detach_counted(contact);
        self.destroy(contact);
        if let Some(group) = group {
            self.notify_update(group);
        }
        Ok(())
    }

    /// Remove and destroy a chat.
    pub fn remove_chat(&mut self, chat: NodeId) -> Result<(), BlistError> {
        if !self.check_kind(chat, NodeType::Chat)? {
            return Ok(());
        }
        let group = self.tree.get_parent(Some(chat));
        self.detach_counted(chat);
        self.destroy(chat);
        if let Some(group) = group {
            self.notify_update(group);
        }
        Ok(())
    }

    /// Remove an empty group. A group with children is left alone and
    /// `Ok(false)` returned.
    pub fn remove_group(&mut self, group: NodeId) -> Result<bool, BlistError> {
        if !self.check_kind(group, NodeType::Group)? {
            return Ok(false);
        }
        if self.tree.get_first_child(Some(group)).is_some() {
            tracing::warn!(%group, "not removing non-empty group");
            return Ok(false);
        }
        self.tree.detach(group);
        self.destroy(group);
        Ok(true)
    }

    /// Move every buddy of `source` to the end of `target`, then drop
    /// `source`.
    pub fn merge_contact(&mut self, source: NodeId, target: NodeId) -> Result<(), BlistError> {
        if !self.check_kind(source, NodeType::Contact)? || !self.check_kind(target, NodeType::Contact)? {
            return Ok(());
        }
        if source == target {
            return Ok(());
        }
        let buddies: Vec<NodeId> = self.tree.children(source).collect();
        if buddies.is_empty() {
            return self.remove_contact(source);
        }
        for buddy in buddies {
            let last = self.tree.last_child(target);
            self.add_buddy(buddy, Some(target), None, last)?;
        }
        Ok(())
    }

    /// The group named `name`, compared case-insensitively.
    pub fn find_group(&self, name: &str) -> Option<NodeId> {
        self.tree
            .roots()
            .find(|&id| self.tree.group(id).is_some_and(|g| g.name_matches(name)))
    }

    /// The first buddy called `name` on `account`.
    pub fn find_buddy(&self, account: AccountId, name: &str) -> Option<NodeId> {
        self.find_buddies(account, Some(name)).into_iter().next()
    }

    /// Every buddy on `account`, optionally only those called `name`, in
    /// tree order.
    pub fn find_buddies(&self, account: AccountId, name: Option<&str>) -> Vec<NodeId> {
        self.tree
            .walk()
            .filter(|&id| {
                self.tree.buddy(id).is_some_and(|b| {
                    b.account() == account && (name.is_none() || name == Some(b.name()))
                })
            })
            .collect()
    }

    /// Every attached buddy on `account`.
    pub fn buddies_on_account(&self, account: AccountId) -> Vec<NodeId> {
        self.find_buddies(account, None)
    }

    /// Every attached chat on `account`.
    pub fn chats_on_account(&self, account: AccountId) -> Vec<NodeId> {
        self.tree
            .walk()
            .filter(|&id| self.tree.chat(id).is_some_and(|c| c.account() == account))
            .collect()
    }

    /// The chat on `account` whose display name is `name`.
    pub fn find_chat(&self, account: AccountId, name: &str) -> Option<NodeId> {
        self.chats_on_account(account)
            .into_iter()
            .find(|&id| self.chat_get_name(id) == Some(name))
    }

    fn resolve_group(&mut self, group: Option<NodeId>, after: Option<NodeId>) -> Result<NodeId, BlistError> {
        if let Some(group) = group {
            return Ok(group);
        }
        if let Some(parent) = after.and_then(|a| self.tree.get_parent(Some(a))) {
            return Ok(parent);
        }
        if let Some(first) = self.tree.roots().find(|&r| self.is_kind(r, NodeType::Group)) {
            return Ok(first);
        }
        Ok(self.find_or_add_group(DEFAULT_GROUP))
    }

    /// What `node` adds to its parent's counters.
    pub(super) fn contribution(&self, node: NodeId) -> Contribution {
        let Some(n) = self.tree.get(node) else {
            return Contribution::default();
        };
        match n.kind() {
            NodeKind::Buddy(b) => Contribution {
                connected: self.accounts.is_connected(b.account()),
                online: b.presence().is_online(),
            },
            NodeKind::Contact(c) => Contribution {
                connected: c.counts().current_size > 0,
                online: c.counts().online > 0,
            },
            NodeKind::Chat(c) => Contribution {
                connected: self.accounts.is_connected(c.account()),
                online: false,
            },
            NodeKind::Group(_) => Contribution::default(),
        }
    }

    /// Add a child's contribution to `parent`, passing 0→1 edges of a
    /// contact on to its group.
    pub(super) fn add_contribution(&mut self, parent: NodeId, c: Contribution, count_total: bool) {
        let Some(counts) = self.tree.get_mut(parent).and_then(Node::counts_mut) else {
            return;
        };
        if count_total {
            counts.total_inc();
        }
        let edge = Contribution {
            connected: c.connected && counts.current_inc(),
            online: c.online && counts.online_inc(),
        };
        tracing::debug!(%parent, counts = ?counts, "counts up");
        if (edge.connected || edge.online) && self.is_kind(parent, NodeType::Contact) {
            if let Some(group) = self.tree.get_parent(Some(parent)) {
                self.add_contribution(group, edge, false);
            }
        }
    }

    /// Inverse of [`BuddyList::add_contribution`], on 1→0 edges.
    pub(super) fn remove_contribution(&mut self, parent: NodeId, c: Contribution, count_total: bool) {
        let Some(counts) = self.tree.get_mut(parent).and_then(Node::counts_mut) else {
            return;
        };
        if count_total {
            counts.total_dec();
        }
        let edge = Contribution {
            connected: c.connected && counts.current_dec(),
            online: c.online && counts.online_dec(),
        };
        tracing::debug!(%parent, counts = ?counts, "counts down");
        if (edge.connected || edge.online) && self.is_kind(parent, NodeType::Contact) {
            if let Some(group) = self.tree.get_parent(Some(parent)) {
                self.remove_contribution(group, edge, false);
            }
        }
    }

    fn attach_counted(&mut self, node: NodeId, parent: NodeId, after: Option<NodeId>) {
        self.tree.attach(node, Some(parent), after);
        let contribution = self.contribution(node);
        self.add_contribution(parent, contribution, true);
        if self.is_kind(node, NodeType::Buddy) {
            self.invalidate_priority_buddy(parent);
        }
    }

    fn detach_counted(&mut self, node: NodeId) {
        if let Some(parent) = self.tree.get_parent(Some(node)) {
            let contribution = self.contribution(node);
            self.remove_contribution(parent, contribution, true);
            if self.is_kind(node, NodeType::Buddy) {
                self.invalidate_priority_buddy(parent);
            }
        }
        self.tree.detach(node);
    }

    /// Destroy a detached node and everything under it, children first.
    fn destroy(&mut self, node: NodeId) {
        let children: Vec<NodeId> = self.tree.children(node).collect();
        for child in children {
            self.tree.detach(child);
            self.destroy(child);
        }
        self.observer.remove(&self.tree, node);
        if let Some(mut removed) = self.tree.take(node) {
            if let NodeKind::Buddy(buddy) = removed.kind_mut() {
                let data = buddy.take_protocol_data();
                self.observer.buddy_free(buddy, data);
            }
        }
        tracing::debug!(%node, "node destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::counting::Counts;
    use crate::prefs::Preferences;
    use crate::status::StatusCatalog;
    use std::sync::Arc;

    fn list_with_account() -> (BuddyList, AccountId) {
        let mut list = BuddyList::new(Preferences::default());
        let account = list.add_account(Account::new("me", "xmpp", Arc::new(StatusCatalog::standard())));
        (list, account)
    }

    fn counts(list: &BuddyList, id: NodeId) -> Counts {
        *list.tree().get(id).unwrap().counts().unwrap()
    }

    #[test]
    fn add_group_dedupes_by_name() {
        let mut list = BuddyList::new(Preferences::default());
        let friends = list.new_group("Friends");
        assert_eq!(list.add_group(friends, None).unwrap(), friends);
        let dup = list.new_group("FRIENDS");
        assert_eq!(list.add_group(dup, None).unwrap(), friends);
        assert!(!list.tree().contains(dup));
        assert_eq!(list.tree().roots().count(), 1);
    }

    #[test]
    fn add_group_after_sibling() {
        let mut list = BuddyList::new(Preferences::default());
        let a = list.find_or_add_group("a");
        let c = list.find_or_add_group("c");
        let b = list.new_group("b");
        list.add_group(b, Some(a)).unwrap();
        assert_eq!(list.tree().roots().collect::<Vec<_>>(), vec![a, b, c]);
    }

    #[test]
    fn buddy_without_contact_or_group_lands_in_default_group() {
        let (mut list, account) = list_with_account();
        let buddy = list.new_buddy(account, "alice", None).unwrap();
        let contact = list.add_buddy(buddy, None, None, None).unwrap().unwrap();
        let group = list.tree().get_parent(Some(contact)).unwrap();
        assert_eq!(list.tree().group(group).unwrap().name(), DEFAULT_GROUP);
        assert_eq!(counts(&list, contact).total_size, 1);
        assert_eq!(counts(&list, group).total_size, 1);
    }

    #[test]
    fn buddy_after_sibling_joins_its_contact() {
        let (mut list, account) = list_with_account();
        let group = list.find_or_add_group("g");
        let first = list.new_buddy(account, "a", None).unwrap();
        let contact = list.add_buddy(first, None, Some(group), None).unwrap().unwrap();
        let second = list.new_buddy(account, "b", None).unwrap();
        assert_eq!(list.add_buddy(second, None, None, Some(first)).unwrap(), Some(contact));
        assert_eq!(list.tree().children(contact).collect::<Vec<_>>(), vec![first, second]);
    }

    #[test]
    fn moving_last_buddy_removes_old_contact() {
        let (mut list, account) = list_with_account();
        let group = list.find_or_add_group("g");
        let a = list.new_buddy(account, "a", None).unwrap();
        let b = list.new_buddy(account, "b", None).unwrap();
        let ca = list.add_buddy(a, None, Some(group), None).unwrap().unwrap();
        let cb = list.add_buddy(b, None, Some(group), None).unwrap().unwrap();
        assert_eq!(counts(&list, group).total_size, 2);

        list.add_buddy(b, Some(ca), None, None).unwrap();
        assert!(!list.tree().contains(cb));
        assert_eq!(counts(&list, ca).total_size, 2);
        assert_eq!(counts(&list, group).total_size, 1);
    }

    #[test]
    fn remove_buddy_frees_and_prunes() {
        let (mut list, account) = list_with_account();
        let group = list.find_or_add_group("g");
        let a = list.new_buddy(account, "a", None).unwrap();
        let contact = list.add_buddy(a, None, Some(group), None).unwrap().unwrap();
        list.remove_buddy(a).unwrap();
        assert!(!list.tree().contains(a));
        assert!(!list.tree().contains(contact));
        assert_eq!(counts(&list, group), Counts::default());
        assert!(list.remove_group(group).unwrap());
        assert_eq!(list.tree().root(), None);
    }

    #[test]
    fn non_empty_group_is_kept() {
        let (mut list, account) = list_with_account();
        let group = list.find_or_add_group("g");
        let a = list.new_buddy(account, "a", None).unwrap();
        list.add_buddy(a, None, Some(group), None).unwrap();
        assert!(!list.remove_group(group).unwrap());
        assert!(list.tree().contains(group));
    }

    #[test]
    fn merge_moves_all_buddies() {
        let (mut list, account) = list_with_account();
        let group = list.find_or_add_group("g");
        let a = list.new_buddy(account, "a", None).unwrap();
        let b = list.new_buddy(account, "b", None).unwrap();
        let c = list.new_buddy(account, "c", None).unwrap();
        let target = list.add_buddy(a, None, Some(group), None).unwrap().unwrap();
        let source = list.add_buddy(b, None, Some(group), None).unwrap().unwrap();
        list.add_buddy(c, Some(source), None, None).unwrap();

        list.merge_contact(source, target).unwrap();
        assert!(!list.tree().contains(source));
        assert_eq!(list.tree().children(target).collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(counts(&list, group).total_size, 1);
    }

    #[test]
    fn lookups() {
        let (mut list, account) = list_with_account();
        let group = list.find_or_add_group("Work");
        let a = list.new_buddy(account, "alice", None).unwrap();
        list.add_buddy(a, None, Some(group), None).unwrap();
        assert_eq!(list.find_group("work"), Some(group));
        assert_eq!(list.find_buddy(account, "alice"), Some(a));
        assert_eq!(list.find_buddy(account, "bob"), None);
        assert_eq!(list.buddies_on_account(account), vec![a]);
        assert!(list.find_buddies(AccountId::new(), None).is_empty());
    }

    #[test]
    fn chats_count_toward_group_size() {
        let (mut list, account) = list_with_account();
        let group = list.find_or_add_group("Rooms");
        let components = BTreeMap::from([("room".to_string(), "rust".to_string())]);
        let chat = list.new_chat(account, None, components).unwrap();
        list.add_chat(chat, Some(group), None).unwrap();
        assert_eq!(counts(&list, group).total_size, 1);
        assert_eq!(counts(&list, group).current_size, 0);
        assert_eq!(list.find_chat(account, "rust"), Some(chat));

        list.remove_chat(chat).unwrap();
        assert_eq!(counts(&list, group), Counts::default());
    }

    #[test]
    fn unknown_account_is_rejected() {
        let mut list = BuddyList::new(Preferences::default());
        let ghost = AccountId::new();
        assert_eq!(
            list.new_buddy(ghost, "x", None),
            Err(BlistError::UnknownAccount(ghost))
        );
    }
}
