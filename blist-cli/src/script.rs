//! Scenario scripts.
//!
//! A script declares accounts, then lists steps to replay against a
//! fresh `BuddyList`. Buddies are addressed by `(account, name)`;
//! contacts by a label local to the script.
//!
//! ```json
//! {
//!   "accounts": [{ "username": "me", "protocol": "xmpp", "connected": true }],
//!   "steps": [
//!     { "op": "add_buddy", "account": "me", "name": "alice", "group": "Friends", "contact": "alice" },
//!     { "op": "set_status", "account": "me", "buddy": "alice", "status": "available" }
//!   ]
//! }
//! ```

use anyhow::{bail, Context, Result};
use blist_core::{Account, BuddyList, StatusCatalog};
use blist_types::{AccountId, NodeId, Value};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A whole scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Accounts to register before the first step.
    #[serde(default)]
    pub accounts: Vec<AccountSpec>,
    /// Steps in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSpec {
    /// Username, unique within the script.
    pub username: String,
    /// Protocol id.
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Connected from the start.
    #[serde(default)]
    pub connected: bool,
    /// Account score added to every buddy presence.
    #[serde(default)]
    pub score: i32,
    /// Whether offline messages can be delivered.
    #[serde(default)]
    pub offline_messages: bool,
}

fn default_protocol() -> String {
    "xmpp".to_string()
}

fn default_true() -> bool {
    true
}

/// One replay step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Create a group if missing.
    AddGroup {
        /// Group name.
        name: String,
    },
    /// Add a buddy, or move an existing one.
    AddBuddy {
        /// Owning account username.
        account: String,
        /// Buddy name.
        name: String,
        /// Local alias.
        #[serde(default)]
        alias: Option<String>,
        /// Target group name.
        #[serde(default)]
        group: Option<String>,
        /// Contact label; buddies sharing a label share a contact.
        #[serde(default)]
        contact: Option<String>,
    },
    /// Remove a buddy.
    RemoveBuddy {
        /// Owning account username.
        account: String,
        /// Buddy name.
        buddy: String,
    },
    /// Activate or deactivate a buddy status.
    SetStatus {
        /// Owning account username.
        account: String,
        /// Buddy name.
        buddy: String,
        /// Status id.
        status: String,
        /// Activate (default) or deactivate.
        #[serde(default = "default_true")]
        active: bool,
        /// Status message attribute.
        #[serde(default)]
        message: Option<String>,
    },
    /// Set or clear idleness.
    SetIdle {
        /// Owning account username.
        account: String,
        /// Buddy name.
        buddy: String,
        /// Idle flag.
        idle: bool,
        /// Idle-since timestamp.
        #[serde(default)]
        since: Option<u64>,
    },
    /// Set a buddy's local alias.
    AliasBuddy {
        /// Owning account username.
        account: String,
        /// Buddy name.
        buddy: String,
        /// New alias; `null` clears.
        alias: Option<String>,
    },
    /// Set a contact's alias.
    AliasContact {
        /// Contact label.
        contact: String,
        /// New alias; `null` clears.
        alias: Option<String>,
    },
    /// Rename a group.
    RenameGroup {
        /// Current name.
        group: String,
        /// New name.
        name: String,
    },
    /// Mark an account connected.
    Connect {
        /// Account username.
        account: String,
    },
    /// Mark an account disconnected.
    Disconnect {
        /// Account username.
        account: String,
    },
}

impl Script {
    /// Load a script from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid script {}", path.display()))
    }
}

/// Replays a [`Script`] against a list.
pub struct Replay<'a> {
    list: &'a mut BuddyList,
    accounts: HashMap<String, AccountId>,
    contacts: HashMap<String, NodeId>,
}

impl<'a> Replay<'a> {
    /// Register the script's accounts on `list`.
    pub fn new(list: &'a mut BuddyList, script: &Script) -> Result<Self> {
        let catalog = Arc::new(StatusCatalog::standard());
        let mut accounts = HashMap::new();
        for spec in &script.accounts {
            if accounts.contains_key(&spec.username) {
                bail!("Duplicate account {}", spec.username);
            }
            let account = Account::new(&spec.username, &spec.protocol, catalog.clone())
                .with_score(spec.score)
                .with_offline_messages(spec.offline_messages);
            let id = list.add_account(account);
            list.set_account_connected(id, spec.connected)?;
            accounts.insert(spec.username.clone(), id);
        }
        Ok(Self {
            list,
            accounts,
            contacts: HashMap::new(),
        })
    }

    /// Run every step, stopping at the first failure.
    pub fn run(&mut self, steps: &[Step]) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            tracing::debug!(step = i, ?step, "replaying");
            self.apply(step)
                .with_context(|| format!("Step {} failed", i + 1))?;
        }
        Ok(())
    }

    fn apply(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::AddGroup { name } => {
                self.list.find_or_add_group(name);
            }
            Step::AddBuddy {
                account,
                name,
                alias,
                group,
                contact,
            } => self.add_buddy(account, name, alias.as_deref(), group.as_deref(), contact.as_deref())?,
            Step::RemoveBuddy { account, buddy } => {
                let buddy = self.buddy(account, buddy)?;
                self.list.remove_buddy(buddy)?;
            }
            Step::SetStatus {
                account,
                buddy,
                status,
                active,
                message,
            } => {
                let buddy = self.buddy(account, buddy)?;
                let attrs: Vec<(&str, Value)> = message
                    .iter()
                    .map(|m| ("message", Value::from(m.as_str())))
                    .collect();
                self.list.set_buddy_status(buddy, status, *active, &attrs)?;
            }
            Step::SetIdle {
                account,
                buddy,
                idle,
                since,
            } => {
                let buddy = self.buddy(account, buddy)?;
                self.list.buddy_set_idle(buddy, *idle, *since)?;
            }
            Step::AliasBuddy {
                account,
                buddy,
                alias,
            } => {
                let buddy = self.buddy(account, buddy)?;
                self.list.buddy_set_local_alias(buddy, alias.as_deref())?;
            }
            Step::AliasContact { contact, alias } => {
                let contact = self.contact(contact)?;
                self.list.contact_set_alias(contact, alias.as_deref())?;
            }
            Step::RenameGroup { group, name } => {
                let id = self
                    .list
                    .find_group(group)
                    .with_context(|| format!("Unknown group {group}"))?;
                self.list.group_rename(id, name)?;
            }
            Step::Connect { account } => {
                let id = self.account(account)?;
                self.list.set_account_connected(id, true)?;
            }
            Step::Disconnect { account } => {
                let id = self.account(account)?;
                self.list.set_account_connected(id, false)?;
            }
        }
        Ok(())
    }

    fn add_buddy(
        &mut self,
        account: &str,
        name: &str,
        alias: Option<&str>,
        group: Option<&str>,
        label: Option<&str>,
    ) -> Result<()> {
        let account = self.account(account)?;
        let buddy = match self.list.find_buddy(account, name) {
            Some(existing) => existing,
            None => self.list.new_buddy(account, name, alias)?,
        };
        let group = group.map(|g| self.list.find_or_add_group(g));
        let contact = label
            .and_then(|l| self.contacts.get(l).copied())
            .filter(|&c| self.list.tree().contains(c));
        let placed = self
            .list
            .add_buddy(buddy, contact, group, None)?
            .with_context(|| format!("Could not place buddy {name}"))?;
        if let Some(label) = label {
            self.contacts.insert(label.to_string(), placed);
        }
        Ok(())
    }

    fn account(&self, username: &str) -> Result<AccountId> {
        self.accounts
            .get(username)
            .copied()
            .with_context(|| format!("Unknown account {username}"))
    }

    fn buddy(&self, account: &str, name: &str) -> Result<NodeId> {
        let account = self.account(account)?;
        self.list
            .find_buddy(account, name)
            .with_context(|| format!("Unknown buddy {name}"))
    }

    fn contact(&self, label: &str) -> Result<NodeId> {
        self.contacts
            .get(label)
            .copied()
            .filter(|&c| self.list.tree().contains(c))
            .with_context(|| format!("Unknown contact {label}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blist_core::Preferences;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn script(json: &str) -> Script {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_defaults() {
        let s = script(
            r#"{
                "accounts": [{ "username": "me" }],
                "steps": [{ "op": "set_status", "account": "me", "buddy": "a", "status": "away" }]
            }"#,
        );
        assert_eq!(s.accounts[0].protocol, "xmpp");
        assert!(!s.accounts[0].connected);
        assert!(matches!(&s.steps[0], Step::SetStatus { active: true, message: None, .. }));
    }

    #[test]
    fn shared_label_shares_contact() {
        let s = script(
            r#"{
                "accounts": [{ "username": "me", "connected": true }],
                "steps": [
                    { "op": "add_buddy", "account": "me", "name": "a", "group": "Friends", "contact": "pal" },
                    { "op": "add_buddy", "account": "me", "name": "b", "contact": "pal" },
                    { "op": "set_status", "account": "me", "buddy": "b", "status": "available" }
                ]
            }"#,
        );
        let mut list = BuddyList::new(Preferences::default());
        let mut replay = Replay::new(&mut list, &s).unwrap();
        replay.run(&s.steps).unwrap();
        let contact = replay.contact("pal").unwrap();

        assert_eq!(list.tree().children(contact).count(), 2);
        assert_eq!(list.tree().contact(contact).unwrap().counts().online, 1);
    }

    #[test]
    fn unknown_buddy_names_the_step() {
        let s = script(
            r#"{
                "accounts": [{ "username": "me" }],
                "steps": [
                    { "op": "add_group", "name": "Friends" },
                    { "op": "set_idle", "account": "me", "buddy": "ghost", "idle": true }
                ]
            }"#,
        );
        let mut list = BuddyList::new(Preferences::default());
        let err = Replay::new(&mut list, &s).unwrap().run(&s.steps).unwrap_err();
        assert_eq!(err.to_string(), "Step 2 failed");
        assert!(format!("{err:#}").contains("Unknown buddy ghost"));
    }

    #[test]
    fn duplicate_account_rejected() {
        let s = script(r#"{ "accounts": [{ "username": "me" }, { "username": "me" }] }"#);
        let mut list = BuddyList::new(Preferences::default());
        assert!(Replay::new(&mut list, &s).is_err());
    }

    #[test]
    fn load_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = Script::load(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid script"));
    }
}
