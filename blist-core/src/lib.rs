//! # blist-core
//!
//! Buddy-list data model and presence engine (no I/O, instant tests).
//!
//! The list is a tree of groups, contacts, buddies and chats. Each buddy
//! carries a [`Presence`] built from its protocol's [`StatusCatalog`]; the
//! list keeps online counts on contacts and groups in step with presence
//! edges and picks a priority buddy per contact on demand.
//!
//! ## Design Philosophy
//!
//! The model is **pure**. Nothing here touches disk or network, except
//! [`Preferences::from_file`]. Persistence and UI are collaborators behind
//! [`BlistObserver`]; logging and UI consumers subscribe to typed
//! [`BlistEvent`]s on the list's [`SignalBus`]. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! ```
//! use blist_core::{Account, BuddyList, Preferences, StatusCatalog};
//! use std::sync::Arc;
//!
//! let mut list = BuddyList::new(Preferences::default());
//! let account = list.add_account(Account::new("me", "xmpp", Arc::new(StatusCatalog::standard())));
//! list.set_account_connected(account, true).unwrap();
//!
//! let buddy = list.new_buddy(account, "alice@example.org", None).unwrap();
//! let contact = list.add_buddy(buddy, None, None, None).unwrap().unwrap();
//! list.set_buddy_status(buddy, "available", true, &[]).unwrap();
//!
//! assert_eq!(list.tree().contact(contact).unwrap().counts().online, 1);
//! assert_eq!(list.get_priority_buddy(contact), Some(buddy));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod account;
pub mod buddy;
pub mod chat;
pub mod contact;
pub mod counting;
pub mod group;
pub mod list;
pub mod node;
pub mod observer;
pub mod prefs;
pub mod presence;
pub mod priority;
pub mod settings;
pub mod signals;
pub mod status;

pub use account::{Account, Accounts};
pub use buddy::{Buddy, BuddyIcon};
pub use chat::Chat;
pub use contact::Contact;
pub use counting::Counts;
pub use group::Group;
pub use list::{BuddyList, Snapshot, DEFAULT_GROUP, LAST_SEEN};
pub use node::{Node, NodeKind, NodeTree, NodeType};
pub use observer::{BlistObserver, NoopObserver};
pub use prefs::{ConfigError, ContactPrefs, Preferences, ScoreSlot, ScoreTable};
pub use presence::{compare_presences, IdleChange, Presence, ScoreContext, StatusTransition};
pub use priority::compute_priority_buddy;
pub use settings::SettingsStore;
pub use signals::{BlistEvent, HandlerId, PresenceOwner, SignalBus, SignalKind};
pub use status::{status_compare, Status, StatusAttribute, StatusCatalog, StatusType};

pub use blist_types::{AccountId, BlistError, MediaCaps, NodeId, StatusPrimitive, Value, ValueKind};
