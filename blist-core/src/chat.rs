//! Chat nodes.

use crate::buddy::replace_alias;
use blist_types::AccountId;
use std::collections::BTreeMap;

/// A saved chat room.
///
/// `components` are the protocol's join parameters (room, server,
/// handle, ...), opaque to the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    alias: Option<String>,
    account: AccountId,
    components: BTreeMap<String, String>,
}

impl Chat {
    /// Create a chat on `account`.
    pub fn new(account: AccountId, alias: Option<&str>, components: BTreeMap<String, String>) -> Self {
        let mut chat = Self {
            alias: None,
            account,
            components,
        };
        chat.set_alias(alias);
        chat
    }

    /// The user's alias.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub(crate) fn set_alias(&mut self, alias: Option<&str>) -> Option<Option<String>> {
        replace_alias(&mut self.alias, alias)
    }

    /// Owning account.
    pub fn account(&self) -> AccountId {
        self.account
    }

    /// Join parameters.
    pub fn components(&self) -> &BTreeMap<String, String> {
        &self.components
    }

    /// Display name: alias, else the component named by `name_key`, else
    /// the first component.
    pub fn name(&self, name_key: Option<&str>) -> Option<&str> {
        if let Some(alias) = self.alias() {
            return Some(alias);
        }
        name_key
            .and_then(|k| self.components.get(k))
            .or_else(|| self.components.values().next())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("handle".to_string(), "me".to_string()),
            ("room".to_string(), "rust".to_string()),
        ])
    }

    #[test]
    fn name_prefers_alias() {
        let chat = Chat::new(AccountId::new(), Some("Rustaceans"), components());
        assert_eq!(chat.name(Some("room")), Some("Rustaceans"));
    }

    #[test]
    fn name_falls_back_to_key_then_first() {
        let chat = Chat::new(AccountId::new(), None, components());
        assert_eq!(chat.name(Some("room")), Some("rust"));
        assert_eq!(chat.name(Some("missing")), Some("me"));
        assert_eq!(chat.name(None), Some("me"));
        let empty = Chat::new(AccountId::new(), Some(" "), BTreeMap::new());
        assert_eq!(empty.name(None), None);
    }
}
