//! Serializable view of the list.
//!
//! Transient nodes are left out.

use super::BuddyList;
use crate::counting::Counts;
use crate::node::{Node, NodeKind};
use crate::settings::SettingsStore;
use blist_types::{NodeId, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// The whole list, group by group.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Top-level groups in order.
    pub groups: Vec<GroupSnapshot>,
}

/// A group and its members.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSnapshot {
    /// Group name.
    pub name: String,
    /// Counters.
    pub counts: Counts,
    /// Contacts and chats in order.
    pub members: Vec<MemberSnapshot>,
    /// Node settings.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, Value>,
}

/// A child of a group.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemberSnapshot {
    /// A contact.
    Contact(ContactSnapshot),
    /// A chat.
    Chat(ChatSnapshot),
}

/// A contact and its buddies.
#[derive(Debug, Clone, Serialize)]
pub struct ContactSnapshot {
    /// Display alias.
    pub alias: Option<String>,
    /// Counters.
    pub counts: Counts,
    /// Name of the priority buddy.
    pub priority_buddy: Option<String>,
    /// Buddies in order.
    pub buddies: Vec<BuddySnapshot>,
    /// Node settings.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, Value>,
}

/// One buddy.
#[derive(Debug, Clone, Serialize)]
pub struct BuddySnapshot {
    /// Account-normalized name.
    pub name: String,
    /// Display alias (local, server or name).
    pub alias: String,
    /// Username of the owning account.
    pub account: String,
    /// Active exclusive status id.
    pub status: Option<String>,
    /// Whether the buddy is online.
    pub online: bool,
    /// Whether the buddy is idle.
    pub idle: bool,
    /// Node settings.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, Value>,
}

/// One chat.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSnapshot {
    /// Display name.
    pub name: Option<String>,
    /// Username of the owning account.
    pub account: String,
    /// Node settings.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, Value>,
}

fn settings_map(settings: &SettingsStore) -> BTreeMap<String, Value> {
    settings
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn persistent(node: &Node) -> bool {
    !node.is_transient()
}

impl BuddyList {
    /// Capture the list.
    ///
    /// Stale priority caches are resolved first, which may emit
    /// `priority-buddy-changed`.
    pub fn snapshot(&mut self) -> Snapshot {
        let contacts: Vec<NodeId> = self
            .tree
            .walk()
            .filter(|&id| self.tree.contact(id).is_some())
            .collect();
        for contact in contacts {
            self.get_priority_buddy(contact);
        }

        let groups = self
            .tree
            .roots()
            .filter_map(|id| self.tree.get(id).filter(|n| persistent(n)).map(|n| (id, n)))
            .filter_map(|(id, node)| match node.kind() {
                NodeKind::Group(group) => Some(GroupSnapshot {
                    name: group.name().to_string(),
                    counts: *group.counts(),
                    members: self.member_snapshots(id),
                    settings: settings_map(node.settings()),
                }),
                _ => None,
            })
            .collect();
        Snapshot { groups }
    }

    fn member_snapshots(&self, group: NodeId) -> Vec<MemberSnapshot> {
        self.tree
            .children(group)
            .filter_map(|id| {
                let node = self.tree.get(id).filter(|n| persistent(n))?;
                match node.kind() {
                    NodeKind::Contact(contact) => Some(MemberSnapshot::Contact(ContactSnapshot {
                        alias: contact.alias().map(str::to_string),
                        counts: *contact.counts(),
                        priority_buddy: contact
                            .cached_priority_buddy()
                            .and_then(|b| self.tree.buddy(b))
                            .map(|b| b.name().to_string()),
                        buddies: self.buddy_snapshots(id),
                        settings: settings_map(node.settings()),
                    })),
                    NodeKind::Chat(chat) => Some(MemberSnapshot::Chat(ChatSnapshot {
                        name: self.chat_get_name(id).map(str::to_string),
                        account: self.username(chat.account()),
                        settings: settings_map(node.settings()),
                    })),
                    _ => None,
                }
            })
            .collect()
    }

    fn buddy_snapshots(&self, contact: NodeId) -> Vec<BuddySnapshot> {
        self.tree
            .children(contact)
            .filter_map(|id| {
                let node = self.tree.get(id).filter(|n| persistent(n))?;
                let NodeKind::Buddy(buddy) = node.kind() else {
                    return None;
                };
                let presence = buddy.presence();
                Some(BuddySnapshot {
                    name: buddy.name().to_string(),
                    alias: self
                        .buddy_get_contact_alias(id)
                        .unwrap_or(buddy.name())
                        .to_string(),
                    account: self.username(buddy.account()),
                    status: presence.get_active_status().map(|s| s.id().to_string()),
                    online: presence.is_online(),
                    idle: presence.is_idle(),
                    settings: settings_map(node.settings()),
                })
            })
            .collect()
    }

    fn username(&self, account: blist_types::AccountId) -> String {
        self.accounts
            .get(account)
            .map(|a| a.username().to_string())
            .unwrap_or_else(|| account.to_string())
    }
}
