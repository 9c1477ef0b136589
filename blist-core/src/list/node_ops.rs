//! Per-node setters and display lookups.

use super::BuddyList;
use crate::buddy::BuddyIcon;
use crate::group::names_collide;
use crate::node::NodeType;
use crate::signals::BlistEvent;
use blist_types::{AccountId, BlistError, MediaCaps, NodeId};
use std::any::Any;
use std::sync::Arc;

impl BuddyList {
    /// Rename a buddy. Unprintable characters are stripped.
    pub fn buddy_set_name(&mut self, buddy: NodeId, name: &str) -> Result<bool, BlistError> {
        let changed = self
            .tree
            .buddy_mut(buddy)
            .ok_or(BlistError::UnknownNode(buddy))?
            .set_name(name);
        if changed {
            self.notify_update(buddy);
            self.notify_save(buddy);
        }
        Ok(changed)
    }

    /// Set the user's alias for a buddy; empty clears it.
    pub fn buddy_set_local_alias(&mut self, buddy: NodeId, alias: Option<&str>) -> Result<bool, BlistError> {
        let old = self
            .tree
            .buddy_mut(buddy)
            .ok_or(BlistError::UnknownNode(buddy))?
            .set_local_alias(alias);
        Ok(self.aliased(buddy, old))
    }

    /// Set the server-published alias for a buddy; empty clears it.
    pub fn buddy_set_server_alias(&mut self, buddy: NodeId, alias: Option<&str>) -> Result<bool, BlistError> {
        let old = self
            .tree
            .buddy_mut(buddy)
            .ok_or(BlistError::UnknownNode(buddy))?
            .set_server_alias(alias);
        Ok(self.aliased(buddy, old))
    }

    fn aliased(&mut self, node: NodeId, old: Option<Option<String>>) -> bool {
        let Some(old_alias) = old else {
            return false;
        };
        self.notify_save(node);
        self.notify_update(node);
        if self.is_kind(node, NodeType::Buddy) {
            if let Some(contact) = self.tree.get_parent(Some(node)) {
                self.notify_update(contact);
            }
        }
        self.emit(BlistEvent::NodeAliased { node, old_alias });
        true
    }

    /// Local alias, else server alias, else name.
    pub fn buddy_get_alias(&self, buddy: NodeId) -> Option<&str> {
        self.tree.buddy(buddy).map(|b| b.alias())
    }

    /// Local alias, else the contact's alias, else server alias, else name.
    pub fn buddy_get_contact_alias(&self, buddy: NodeId) -> Option<&str> {
        let b = self.tree.buddy(buddy)?;
        let contact_alias = self
            .tree
            .get_parent(Some(buddy))
            .and_then(|c| self.tree.contact(c))
            .and_then(|c| c.alias());
        Some(b.contact_alias(contact_alias))
    }

    /// Local alias, else server alias.
    pub fn buddy_get_alias_only(&self, buddy: NodeId) -> Option<&str> {
        self.tree.buddy(buddy)?.alias_only()
    }

    /// Replace a buddy's icon.
    pub fn buddy_set_icon(&mut self, buddy: NodeId, icon: Option<Arc<BuddyIcon>>) -> Result<bool, BlistError> {
        let b = self
            .tree
            .buddy_mut(buddy)
            .ok_or(BlistError::UnknownNode(buddy))?;
        if b.icon() == icon.as_ref() {
            return Ok(false);
        }
        b.set_icon(icon);
        self.notify_update(buddy);
        self.emit(BlistEvent::BuddyIconChanged { buddy });
        Ok(true)
    }

    /// Replace a buddy's media capabilities.
    pub fn buddy_set_media_caps(&mut self, buddy: NodeId, caps: MediaCaps) -> Result<bool, BlistError> {
        let old = self
            .tree
            .buddy_mut(buddy)
            .ok_or(BlistError::UnknownNode(buddy))?
            .set_media_caps(caps);
        let Some(old) = old else {
            return Ok(false);
        };
        self.emit(BlistEvent::caps_changed(buddy, old, caps));
        Ok(true)
    }

    /// Attach protocol-private data to a buddy, returning what was there.
    ///
    /// Whatever is attached when the buddy is destroyed is handed to
    /// [`BlistObserver::buddy_free`](crate::observer::BlistObserver::buddy_free).
    pub fn buddy_set_protocol_data(
        &mut self,
        buddy: NodeId,
        data: Option<Box<dyn Any>>,
    ) -> Result<Option<Box<dyn Any>>, BlistError> {
        Ok(self
            .tree
            .buddy_mut(buddy)
            .ok_or(BlistError::UnknownNode(buddy))?
            .set_protocol_data(data))
    }

    /// Set a contact's alias; empty clears it.
    pub fn contact_set_alias(&mut self, contact: NodeId, alias: Option<&str>) -> Result<bool, BlistError> {
        let old = self
            .tree
            .contact_mut(contact)
            .ok_or(BlistError::UnknownNode(contact))?
            .set_alias(alias);
        let changed = self.aliased(contact, old);
        if changed {
            let buddies: Vec<NodeId> = self.tree.children(contact).collect();
            for buddy in buddies {
                self.notify_update(buddy);
            }
        }
        Ok(changed)
    }

    /// The contact's alias, else its priority buddy's alias.
    pub fn contact_get_alias(&mut self, contact: NodeId) -> Option<String> {
        if let Some(alias) = self.tree.contact(contact)?.alias() {
            return Some(alias.to_string());
        }
        let buddy = self.get_priority_buddy(contact)?;
        self.buddy_get_alias(buddy).map(str::to_string)
    }

    /// Whether any buddy of the contact is on `account`.
    pub fn contact_on_account(&self, contact: NodeId, account: AccountId) -> bool {
        self.tree
            .children(contact)
            .any(|b| self.tree.buddy(b).is_some_and(|b| b.account() == account))
    }

    /// Rename a group.
    ///
    /// Fails with [`BlistError::DuplicateGroup`] when another group
    /// already has the name; changing only the case is allowed.
    pub fn group_rename(&mut self, group: NodeId, name: &str) -> Result<bool, BlistError> {
        if !self.check_kind(group, NodeType::Group)? {
            return Ok(false);
        }
        let taken = self
            .tree
            .roots()
            .filter(|&g| g != group)
            .filter_map(|g| self.tree.group(g))
            .any(|g| names_collide(g.name(), name));
        if taken {
            return Err(BlistError::DuplicateGroup(name.trim().to_string()));
        }
        let old = self
            .tree
            .group_mut(group)
            .ok_or(BlistError::UnknownNode(group))?
            .set_name(name);
        let Some(old) = old else {
            return Ok(false);
        };
        tracing::debug!(%group, old = %old, new = name, "group renamed");
        self.notify_update(group);
        self.notify_save(group);
        Ok(true)
    }

    /// Whether the group holds a buddy or chat on `account`, or with
    /// `None`, on any connected account.
    pub fn group_on_account(&self, group: NodeId, account: Option<AccountId>) -> bool {
        let matches = |a: AccountId| match account {
            Some(account) => a == account,
            None => self.accounts.is_connected(a),
        };
        self.group_members_accounts(group).any(matches)
    }

    /// Connected accounts with a buddy or chat in the group, each once.
    pub fn group_accounts(&self, group: NodeId) -> Vec<AccountId> {
        let mut accounts = Vec::new();
        for account in self.group_members_accounts(group) {
            if self.accounts.is_connected(account) && !accounts.contains(&account) {
                accounts.push(account);
            }
        }
        accounts
    }

    fn group_members_accounts(&self, group: NodeId) -> impl Iterator<Item = AccountId> + '_ {
        self.tree.children(group).flat_map(move |member| {
            let direct = self.tree.chat(member).map(|c| c.account());
            let buddies = self
                .tree
                .children(member)
                .filter_map(move |b| self.tree.buddy(b).map(|b| b.account()));
            direct.into_iter().chain(buddies)
        })
    }

    /// Set a chat's alias; empty clears it.
    pub fn chat_set_alias(&mut self, chat: NodeId, alias: Option<&str>) -> Result<bool, BlistError> {
        let old = self
            .tree
            .chat_mut(chat)
            .ok_or(BlistError::UnknownNode(chat))?
            .set_alias(alias);
        Ok(self.aliased(chat, old))
    }

    /// Alias, else the component named by the account's chat name key,
    /// else the first component.
    pub fn chat_get_name(&self, chat: NodeId) -> Option<&str> {
        let c = self.tree.chat(chat)?;
        let key = self.accounts.get(c.account()).and_then(|a| a.chat_name_key());
        c.name(key)
    }

    /// Display name of any node.
    pub fn node_display_name(&mut self, node: NodeId) -> Option<String> {
        match self.tree.node_type(node)? {
            NodeType::Buddy => self.buddy_get_contact_alias(node).map(str::to_string),
            NodeType::Contact => self.contact_get_alias(node),
            NodeType::Chat => self.chat_get_name(node).map(str::to_string),
            NodeType::Group => self.tree.group(node).map(|g| g.name().to_string()),
        }
    }
}
