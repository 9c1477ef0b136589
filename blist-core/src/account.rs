//! Accounts as seen by the buddy list.
//!
//! The account itself (connection, credentials) lives in the protocol
//! layer. The list only needs the handful of facts below, kept per account
//! in the list's registry and shared by id from every buddy and chat.

use crate::presence::{Presence, ScoreContext};
use crate::status::StatusCatalog;
use blist_types::AccountId;
use std::collections::HashMap;
use std::sync::Arc;

/// One of the user's accounts.
#[derive(Debug, Clone)]
pub struct Account {
    id: AccountId,
    username: String,
    protocol_id: String,
    catalog: Arc<StatusCatalog>,
    connected: bool,
    score: i32,
    supports_offline_message: bool,
    chat_name_key: Option<String>,
    presence: Presence,
}

impl Account {
    /// Create a disconnected account using the protocol's status catalog.
    pub fn new(username: &str, protocol_id: &str, catalog: Arc<StatusCatalog>) -> Self {
        let presence = Presence::new(&catalog);
        Self {
            id: AccountId::new(),
            username: username.to_string(),
            protocol_id: protocol_id.to_string(),
            catalog,
            connected: false,
            score: 0,
            supports_offline_message: false,
            chat_name_key: None,
            presence,
        }
    }

    /// Set the per-account score bonus applied to its buddies.
    pub fn with_score(mut self, score: i32) -> Self {
        self.score = score;
        self
    }

    /// Declare that the protocol delivers messages to offline buddies.
    pub fn with_offline_messages(mut self, supported: bool) -> Self {
        self.supports_offline_message = supported;
        self
    }

    /// Name the chat component that identifies a chat room.
    pub fn with_chat_name_key(mut self, key: &str) -> Self {
        self.chat_name_key = Some(key.to_string());
        self
    }

    /// Account id.
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Username on the protocol.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Protocol id, e.g. `"xmpp"`.
    pub fn protocol_id(&self) -> &str {
        &self.protocol_id
    }

    /// Status types of the account's protocol.
    pub fn catalog(&self) -> &Arc<StatusCatalog> {
        &self.catalog
    }

    /// Whether the account is connected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Score bonus applied to the account's buddies.
    pub fn score(&self) -> i32 {
        self.score
    }

    /// Whether offline messages can be delivered.
    pub fn supports_offline_message(&self) -> bool {
        self.supports_offline_message
    }

    /// Component that names a chat on this protocol.
    pub fn chat_name_key(&self) -> Option<&str> {
        self.chat_name_key.as_deref()
    }

    /// The account's own presence.
    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub(crate) fn presence_mut(&mut self) -> &mut Presence {
        &mut self.presence
    }

    /// Scoring inputs for this account's buddies.
    pub fn score_context(&self) -> ScoreContext {
        ScoreContext {
            account_score: self.score,
            offline_messageable: self.supports_offline_message,
        }
    }
}

/// The list's account registry.
#[derive(Debug, Clone, Default)]
pub struct Accounts {
    accounts: HashMap<AccountId, Account>,
}

impl Accounts {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account, replacing any with the same id.
    pub fn insert(&mut self, account: Account) -> AccountId {
        let id = account.id();
        self.accounts.insert(id, account);
        id
    }

    /// Look up an account.
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: AccountId) -> Option<&mut Account> {
        self.accounts.get_mut(&id)
    }

    /// Unknown accounts count as disconnected.
    pub fn is_connected(&self, id: AccountId) -> bool {
        self.get(id).is_some_and(Account::is_connected)
    }

    /// Scoring inputs for buddies of `id`.
    pub fn score_context(&self, id: AccountId) -> ScoreContext {
        self.get(id).map(Account::score_context).unwrap_or_default()
    }

    /// Find an account by protocol and username.
    pub fn find(&self, protocol_id: &str, username: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|a| a.protocol_id == protocol_id && a.username == username)
    }

    /// All accounts, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Check if no account is registered.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_is_disconnected_and_offline() {
        let account = Account::new("alice@example.org", "xmpp", Arc::new(StatusCatalog::standard()));
        assert!(!account.is_connected());
        assert!(!account.presence().is_online());
        assert_eq!(account.username(), "alice@example.org");
        assert_eq!(account.protocol_id(), "xmpp");
    }

    #[test]
    fn builder_sets_scoring_inputs() {
        let account = Account::new("bob", "irc", Arc::new(StatusCatalog::standard()))
            .with_score(5)
            .with_offline_messages(true)
            .with_chat_name_key("channel");
        assert_eq!(
            account.score_context(),
            ScoreContext {
                account_score: 5,
                offline_messageable: true
            }
        );
        assert_eq!(account.chat_name_key(), Some("channel"));
    }

    #[test]
    fn registry_lookups() {
        let mut accounts = Accounts::new();
        let catalog = Arc::new(StatusCatalog::standard());
        let id = accounts.insert(Account::new("carol", "xmpp", catalog).with_score(3));
        assert!(!accounts.is_connected(id));
        accounts.get_mut(id).unwrap().set_connected(true);
        assert!(accounts.is_connected(id));
        assert!(!accounts.is_connected(AccountId::new()));
        assert_eq!(accounts.score_context(id).account_score, 3);
        assert_eq!(accounts.find("xmpp", "carol").map(Account::id), Some(id));
        assert!(accounts.find("irc", "carol").is_none());
        assert_eq!(accounts.len(), 1);
    }
}
