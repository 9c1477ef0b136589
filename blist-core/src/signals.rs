//! Typed list events and their dispatch table.
//!
//! Handlers are fire-and-forget: they see the event and nothing else, so
//! they cannot reenter the list while it is mid-mutation.

use blist_types::{AccountId, MediaCaps, NodeId};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// `buddy-signed-on`
pub const BUDDY_SIGNED_ON: &str = "buddy-signed-on";
/// `buddy-signed-off`
pub const BUDDY_SIGNED_OFF: &str = "buddy-signed-off";
/// `buddy-status-changed`
pub const BUDDY_STATUS_CHANGED: &str = "buddy-status-changed";
/// `buddy-idle-changed`
pub const BUDDY_IDLE_CHANGED: &str = "buddy-idle-changed";
/// `blist-node-aliased`
pub const BLIST_NODE_ALIASED: &str = "blist-node-aliased";
/// `buddy-icon-changed`
pub const BUDDY_ICON_CHANGED: &str = "buddy-icon-changed";
/// `buddy-caps-changed`
pub const BUDDY_CAPS_CHANGED: &str = "buddy-caps-changed";
/// `status-changed`
pub const STATUS_CHANGED: &str = "status-changed";
/// `priority-buddy-changed`
pub const PRIORITY_BUDDY_CHANGED: &str = "priority-buddy-changed";

/// Whose presence a status belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceOwner {
    /// The account's own presence.
    Account(AccountId),
    /// A buddy's presence.
    Buddy(NodeId),
}

/// Discriminant of a [`BlistEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// See [`BlistEvent::BuddySignedOn`].
    BuddySignedOn,
    /// See [`BlistEvent::BuddySignedOff`].
    BuddySignedOff,
    /// See [`BlistEvent::BuddyStatusChanged`].
    BuddyStatusChanged,
    /// See [`BlistEvent::BuddyIdleChanged`].
    BuddyIdleChanged,
    /// See [`BlistEvent::NodeAliased`].
    NodeAliased,
    /// See [`BlistEvent::BuddyIconChanged`].
    BuddyIconChanged,
    /// See [`BlistEvent::BuddyCapsChanged`].
    BuddyCapsChanged,
    /// See [`BlistEvent::StatusChanged`].
    StatusChanged,
    /// See [`BlistEvent::PriorityBuddyChanged`].
    PriorityBuddyChanged,
}

impl SignalKind {
    /// Every kind.
    pub const ALL: [SignalKind; 9] = [
        SignalKind::BuddySignedOn,
        SignalKind::BuddySignedOff,
        SignalKind::BuddyStatusChanged,
        SignalKind::BuddyIdleChanged,
        SignalKind::NodeAliased,
        SignalKind::BuddyIconChanged,
        SignalKind::BuddyCapsChanged,
        SignalKind::StatusChanged,
        SignalKind::PriorityBuddyChanged,
    ];

    /// Signal name.
    pub fn name(self) -> &'static str {
        match self {
            SignalKind::BuddySignedOn => BUDDY_SIGNED_ON,
            SignalKind::BuddySignedOff => BUDDY_SIGNED_OFF,
            SignalKind::BuddyStatusChanged => BUDDY_STATUS_CHANGED,
            SignalKind::BuddyIdleChanged => BUDDY_IDLE_CHANGED,
            SignalKind::NodeAliased => BLIST_NODE_ALIASED,
            SignalKind::BuddyIconChanged => BUDDY_ICON_CHANGED,
            SignalKind::BuddyCapsChanged => BUDDY_CAPS_CHANGED,
            SignalKind::StatusChanged => STATUS_CHANGED,
            SignalKind::PriorityBuddyChanged => PRIORITY_BUDDY_CHANGED,
        }
    }

    /// Parse a signal name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Something observable happened to the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "signal", rename_all = "kebab-case")]
pub enum BlistEvent {
    /// A buddy's active status became online.
    BuddySignedOn {
        /// The buddy.
        buddy: NodeId,
    },
    /// A buddy's active status stopped being online.
    BuddySignedOff {
        /// The buddy.
        buddy: NodeId,
    },
    /// A buddy changed status without changing online-ness.
    BuddyStatusChanged {
        /// The buddy.
        buddy: NodeId,
        /// Status active before.
        old_status: Option<String>,
        /// Status active now.
        new_status: Option<String>,
    },
    /// A buddy went idle or came back.
    BuddyIdleChanged {
        /// The buddy.
        buddy: NodeId,
        /// Idle before.
        old_idle: bool,
        /// Idle now.
        idle: bool,
    },
    /// A node's alias changed.
    #[serde(rename = "blist-node-aliased")]
    NodeAliased {
        /// The buddy, contact or chat.
        node: NodeId,
        /// The alias it had before.
        old_alias: Option<String>,
    },
    /// A buddy's icon was replaced.
    BuddyIconChanged {
        /// The buddy.
        buddy: NodeId,
    },
    /// A buddy's media capabilities changed.
    BuddyCapsChanged {
        /// The buddy.
        buddy: NodeId,
        /// Old capabilities, as bits.
        old_caps: u32,
        /// New capabilities, as bits.
        new_caps: u32,
    },
    /// A status was activated or deactivated on some presence.
    StatusChanged {
        /// Whose presence.
        owner: PresenceOwner,
        /// The exclusive status active before.
        old_status: Option<String>,
        /// The status that was toggled.
        status: String,
        /// Its new active flag.
        active: bool,
    },
    /// A contact's priority buddy was recomputed.
    PriorityBuddyChanged {
        /// The contact.
        contact: NodeId,
        /// The new priority buddy.
        buddy: Option<NodeId>,
    },
}

impl BlistEvent {
    /// Caps change event.
    pub fn caps_changed(buddy: NodeId, old: MediaCaps, new: MediaCaps) -> Self {
        BlistEvent::BuddyCapsChanged {
            buddy,
            old_caps: old.bits(),
            new_caps: new.bits(),
        }
    }

    /// Discriminant.
    pub fn kind(&self) -> SignalKind {
        match self {
            BlistEvent::BuddySignedOn { .. } => SignalKind::BuddySignedOn,
            BlistEvent::BuddySignedOff { .. } => SignalKind::BuddySignedOff,
            BlistEvent::BuddyStatusChanged { .. } => SignalKind::BuddyStatusChanged,
            BlistEvent::BuddyIdleChanged { .. } => SignalKind::BuddyIdleChanged,
            BlistEvent::NodeAliased { .. } => SignalKind::NodeAliased,
            BlistEvent::BuddyIconChanged { .. } => SignalKind::BuddyIconChanged,
            BlistEvent::BuddyCapsChanged { .. } => SignalKind::BuddyCapsChanged,
            BlistEvent::StatusChanged { .. } => SignalKind::StatusChanged,
            BlistEvent::PriorityBuddyChanged { .. } => SignalKind::PriorityBuddyChanged,
        }
    }

    /// Signal name.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// Handle returned by [`SignalBus::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Box<dyn FnMut(&BlistEvent)>;

/// Dispatch table from signal kind to handlers.
///
/// Handlers for a specific kind run first, in connection order, then the
/// catch-all handlers.
#[derive(Default)]
pub struct SignalBus {
    handlers: HashMap<SignalKind, Vec<(HandlerId, Handler)>>,
    catch_all: Vec<(HandlerId, Handler)>,
    next_id: u64,
}

impl SignalBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> HandlerId {
        self.next_id += 1;
        HandlerId(self.next_id)
    }

    /// Call `handler` for every event of `kind`.
    pub fn connect(
        &mut self,
        kind: SignalKind,
        handler: impl FnMut(&BlistEvent) + 'static,
    ) -> HandlerId {
        let id = self.allocate();
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Call `handler` for every event.
    pub fn connect_all(&mut self, handler: impl FnMut(&BlistEvent) + 'static) -> HandlerId {
        let id = self.allocate();
        self.catch_all.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns false if it was not connected.
    pub fn disconnect(&mut self, id: HandlerId) -> bool {
        let before = self.handler_count();
        for list in self.handlers.values_mut() {
            list.retain(|(h, _)| *h != id);
        }
        self.catch_all.retain(|(h, _)| *h != id);
        self.handler_count() != before
    }

    /// Number of connected handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum::<usize>() + self.catch_all.len()
    }

    /// Deliver an event.
    pub fn emit(&mut self, event: &BlistEvent) {
        tracing::debug!(signal = event.name(), ?event, "emit");
        if let Some(list) = self.handlers.get_mut(&event.kind()) {
            for (_, handler) in list.iter_mut() {
                handler(event);
            }
        }
        for (_, handler) in self.catch_all.iter_mut() {
            handler(event);
        }
    }
}

impl fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalBus")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn signed_on() -> BlistEvent {
        BlistEvent::BuddySignedOn {
            buddy: NodeId::new(1),
        }
    }

    #[test]
    fn names_roundtrip() {
        for kind in SignalKind::ALL {
            assert_eq!(SignalKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(SignalKind::from_name("buddy-typing"), None);
        assert_eq!(signed_on().name(), "buddy-signed-on");
    }

    #[test]
    fn dispatch_by_kind() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = SignalBus::new();
        let log = seen.clone();
        bus.connect(SignalKind::BuddySignedOff, move |e| {
            log.borrow_mut().push(e.name())
        });
        let log = seen.clone();
        bus.connect_all(move |_| log.borrow_mut().push("all"));

        bus.emit(&signed_on());
        bus.emit(&BlistEvent::BuddySignedOff {
            buddy: NodeId::new(1),
        });
        assert_eq!(*seen.borrow(), vec!["all", "buddy-signed-off", "all"]);
    }

    #[test]
    fn disconnect_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = SignalBus::new();
        let c = count.clone();
        let id = bus.connect(SignalKind::BuddySignedOn, move |_| *c.borrow_mut() += 1);
        bus.emit(&signed_on());
        assert!(bus.disconnect(id));
        assert!(!bus.disconnect(id));
        bus.emit(&signed_on());
        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.handler_count(), 0);
    }

    #[test]
    fn events_serialize_with_signal_name() {
        let json = serde_json::to_value(BlistEvent::NodeAliased {
            node: NodeId::new(3),
            old_alias: None,
        })
        .unwrap();
        assert_eq!(json["signal"], "blist-node-aliased");
    }
}
