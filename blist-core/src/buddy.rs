//! Buddy nodes.
//!
//! A buddy is one identity on one account. Its presence is owned here;
//! its account is shared by id. Alias lookups follow two different
//! precedence orders, see [`Buddy::alias`] and [`Buddy::contact_alias`].

use crate::account::Account;
use crate::presence::Presence;
use blist_types::{AccountId, MediaCaps};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A buddy icon, shared between buddies that use the same image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuddyIcon {
    data: Vec<u8>,
    checksum: Option<String>,
}

impl BuddyIcon {
    /// Create an icon from image bytes and an optional protocol checksum.
    pub fn new(data: Vec<u8>, checksum: Option<String>) -> Self {
        Self { data, checksum }
    }

    /// Image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Protocol-supplied checksum of the image.
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }
}

/// A buddy.
pub struct Buddy {
    name: String,
    local_alias: Option<String>,
    server_alias: Option<String>,
    account: AccountId,
    presence: Presence,
    icon: Option<Arc<BuddyIcon>>,
    media_caps: MediaCaps,
    protocol_data: Option<Box<dyn Any>>,
}

impl Buddy {
    /// Create a buddy on `account`.
    ///
    /// The presence is built from the account's status catalog and starts
    /// offline. `name` has unprintable characters stripped; an empty
    /// `alias` counts as none.
    pub fn new(account: &Account, name: &str, alias: Option<&str>) -> Self {
        Self {
            name: strip_unprintables(name),
            local_alias: normalize_alias(alias),
            server_alias: None,
            account: account.id(),
            presence: Presence::new(account.catalog()),
            icon: None,
            media_caps: MediaCaps::NONE,
            protocol_data: None,
        }
    }

    /// Account-normalized name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) -> bool {
        let name = strip_unprintables(name);
        if name == self.name {
            return false;
        }
        self.name = name;
        true
    }

    /// Alias set by the user.
    pub fn local_alias(&self) -> Option<&str> {
        self.local_alias.as_deref()
    }

    /// Replace the local alias; returns the old one when it changed.
    pub(crate) fn set_local_alias(&mut self, alias: Option<&str>) -> Option<Option<String>> {
        replace_alias(&mut self.local_alias, alias)
    }

    /// Alias published by the server.
    pub fn server_alias(&self) -> Option<&str> {
        self.server_alias.as_deref()
    }

    /// Replace the server alias; returns the old one when it changed.
    pub(crate) fn set_server_alias(&mut self, alias: Option<&str>) -> Option<Option<String>> {
        replace_alias(&mut self.server_alias, alias)
    }

    /// Local alias, else server alias, else name.
    pub fn alias(&self) -> &str {
        self.local_alias
            .as_deref()
            .or(self.server_alias.as_deref())
            .unwrap_or(&self.name)
    }

    /// Local alias, else the owning contact's alias, else server alias,
    /// else name.
    pub fn contact_alias<'a>(&'a self, contact_alias: Option<&'a str>) -> &'a str {
        self.local_alias
            .as_deref()
            .or(contact_alias)
            .or(self.server_alias.as_deref())
            .unwrap_or(&self.name)
    }

    /// Local alias, else server alias; never the bare name.
    pub fn alias_only(&self) -> Option<&str> {
        self.local_alias
            .as_deref()
            .or(self.server_alias.as_deref())
    }

    /// Owning account.
    pub fn account(&self) -> AccountId {
        self.account
    }

    /// The buddy's presence.
    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub(crate) fn presence_mut(&mut self) -> &mut Presence {
        &mut self.presence
    }

    /// Current icon.
    pub fn icon(&self) -> Option<&Arc<BuddyIcon>> {
        self.icon.as_ref()
    }

    pub(crate) fn set_icon(&mut self, icon: Option<Arc<BuddyIcon>>) {
        self.icon = icon;
    }

    /// Advertised media capabilities.
    pub fn media_caps(&self) -> MediaCaps {
        self.media_caps
    }

    pub(crate) fn set_media_caps(&mut self, caps: MediaCaps) -> Option<MediaCaps> {
        if caps == self.media_caps {
            return None;
        }
        Some(std::mem::replace(&mut self.media_caps, caps))
    }

    /// Protocol-private data, opaque to the list.
    pub fn protocol_data(&self) -> Option<&dyn Any> {
        self.protocol_data.as_deref()
    }

    /// Mutable protocol-private data.
    pub fn protocol_data_mut(&mut self) -> Option<&mut (dyn Any + 'static)> {
        self.protocol_data.as_deref_mut()
    }

    /// Attach protocol-private data, returning what was there.
    pub fn set_protocol_data(&mut self, data: Option<Box<dyn Any>>) -> Option<Box<dyn Any>> {
        std::mem::replace(&mut self.protocol_data, data)
    }

    pub(crate) fn take_protocol_data(&mut self) -> Option<Box<dyn Any>> {
        self.protocol_data.take()
    }
}

impl fmt::Debug for Buddy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buddy")
            .field("name", &self.name)
            .field("local_alias", &self.local_alias)
            .field("server_alias", &self.server_alias)
            .field("account", &self.account)
            .field("online", &self.presence.is_online())
            .field("media_caps", &self.media_caps)
            .finish_non_exhaustive()
    }
}

/// Trim an alias; empty means absent.
pub(crate) fn normalize_alias(alias: Option<&str>) -> Option<String> {
    alias
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

/// Store a normalized alias in `slot`; returns the old value if it changed.
pub(crate) fn replace_alias(slot: &mut Option<String>, alias: Option<&str>) -> Option<Option<String>> {
    let alias = normalize_alias(alias);
    if *slot == alias {
        return None;
    }
    Some(std::mem::replace(slot, alias))
}

/// Drop control and non-character code points, keeping tab, newline and
/// carriage return.
pub(crate) fn strip_unprintables(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || !(c.is_control() || c == '\u{FFFE}' || c == '\u{FFFF}')
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusCatalog;

    fn account() -> Account {
        Account::new("me", "xmpp", Arc::new(StatusCatalog::standard()))
    }

    fn buddy(local: Option<&str>, server: Option<&str>) -> Buddy {
        let mut b = Buddy::new(&account(), "N", local);
        b.set_server_alias(server);
        b
    }

    #[test]
    fn alias_precedence() {
        assert_eq!(buddy(Some("L"), Some("S")).alias(), "L");
        assert_eq!(buddy(None, Some("S")).alias(), "S");
        assert_eq!(buddy(None, None).alias(), "N");
    }

    #[test]
    fn contact_alias_ranks_between_local_and_server() {
        let b = buddy(None, Some("S"));
        assert_eq!(b.contact_alias(Some("C")), "C");
        assert_eq!(b.contact_alias(None), "S");
        let b = buddy(Some("L"), Some("S"));
        assert_eq!(b.contact_alias(Some("C")), "L");
        assert_eq!(buddy(None, None).contact_alias(None), "N");
    }

    #[test]
    fn alias_only_never_returns_name() {
        assert_eq!(buddy(None, None).alias_only(), None);
        assert_eq!(buddy(None, Some("S")).alias_only(), Some("S"));
    }

    #[test]
    fn empty_alias_is_none() {
        let mut b = buddy(Some("   "), None);
        assert_eq!(b.local_alias(), None);
        assert_eq!(b.set_local_alias(Some("  Bob  ")), Some(None));
        assert_eq!(b.local_alias(), Some("Bob"));
        assert_eq!(b.set_local_alias(Some("Bob")), None);
        assert_eq!(b.set_local_alias(Some("")), Some(Some("Bob".to_string())));
        assert_eq!(b.local_alias(), None);
    }

    #[test]
    fn name_strips_unprintables() {
        let b = Buddy::new(&account(), "al\u{0007}ice\u{FFFF}", None);
        assert_eq!(b.name(), "alice");
        assert_eq!(strip_unprintables("a\tb\nc"), "a\tb\nc");
    }

    #[test]
    fn set_name_reports_change() {
        let mut b = Buddy::new(&account(), "alice", None);
        assert!(!b.set_name("alice"));
        assert!(b.set_name("alice2"));
        assert_eq!(b.name(), "alice2");
    }

    #[test]
    fn media_caps_change_detection() {
        let mut b = buddy(None, None);
        assert_eq!(b.set_media_caps(MediaCaps::AUDIO), Some(MediaCaps::NONE));
        assert_eq!(b.set_media_caps(MediaCaps::AUDIO), None);
    }

    #[test]
    fn protocol_data_is_opaque() {
        let mut b = buddy(None, None);
        assert!(b.set_protocol_data(Some(Box::new(17u32))).is_none());
        assert_eq!(b.protocol_data().and_then(|d| d.downcast_ref::<u32>()), Some(&17));
        assert!(b.take_protocol_data().is_some());
        assert!(b.protocol_data().is_none());
    }

    #[test]
    fn new_buddy_is_offline() {
        let b = buddy(None, None);
        assert!(!b.presence().is_online());
        assert_eq!(b.presence().get_active_status().unwrap().id(), "offline");
    }
}
