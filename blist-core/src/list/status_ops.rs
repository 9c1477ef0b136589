//! Presence and account state.
//!
//! A status activation on a buddy runs in this order: the presence flips
//! flags and attributes and displaces the previous exclusive status, then
//! [`BuddyList::update_status`] propagates online-ness edges up the tree,
//! then `status-changed` is emitted.

use super::tree_ops::Contribution;
use super::{unix_now, BuddyList, LAST_SEEN};
use crate::account::Account;
use crate::presence::Presence;
use crate::signals::{BlistEvent, PresenceOwner};
use crate::status::Status;
use blist_types::{AccountId, BlistError, NodeId, StatusPrimitive, Value};

impl BuddyList {
    /// Register an account.
    pub fn add_account(&mut self, account: Account) -> AccountId {
        tracing::debug!(account = %account.id(), protocol = account.protocol_id(), "account added");
        self.accounts.insert(account)
    }

    /// Activate or deactivate a status on a buddy's presence.
    ///
    /// Returns `Ok(false)` when nothing changed; no notification is sent
    /// then. Deactivating an exclusive status is rejected and leaves the
    /// presence untouched. Buddies on a disconnected account stay offline:
    /// the change is ignored with a warning so `online` never exceeds
    /// `current_size`.
    pub fn set_buddy_status(
        &mut self,
        buddy: NodeId,
        status: &str,
        active: bool,
        attrs: &[(&str, Value)],
    ) -> Result<bool, BlistError> {
        let account = self
            .tree
            .buddy(buddy)
            .ok_or(BlistError::UnknownNode(buddy))?
            .account();
        if !self.accounts.is_connected(account) {
            tracing::warn!(%buddy, %account, status, "ignoring status on disconnected account");
            return Ok(false);
        }

        let presence = self
            .tree
            .buddy_mut(buddy)
            .ok_or(BlistError::UnknownNode(buddy))?
            .presence_mut();
        let transition = match presence.set_status_active(status, active, attrs) {
            Ok(Some(t)) => t,
            Ok(None) => return Ok(false),
            Err(err) => {
                tracing::error!(%buddy, status, %err, "status change rejected");
                return Err(err);
            }
        };

        self.update_status(buddy, transition.old_status.as_deref())?;
        self.emit(BlistEvent::StatusChanged {
            owner: PresenceOwner::Buddy(buddy),
            old_status: transition.old_status,
            status: transition.status,
            active: transition.active,
        });
        Ok(true)
    }

    /// Propagate a change of a buddy's active status.
    ///
    /// `old_status` is the exclusive status that was active before. Going
    /// online emits `buddy-signed-on` and raises the contact's online
    /// count (and the group's, when the contact comes online). Going
    /// offline records [`LAST_SEEN`], emits `buddy-signed-off` and lowers
    /// the counts. Otherwise `buddy-status-changed` is emitted. In every
    /// case the contact's priority cache is invalidated and the buddy
    /// updated.
    pub fn update_status(&mut self, buddy: NodeId, old_status: Option<&str>) -> Result<(), BlistError> {
        let presence = self
            .tree
            .buddy(buddy)
            .ok_or(BlistError::UnknownNode(buddy))?
            .presence();
        let was_online = old_status
            .and_then(|id| presence.get_status(id))
            .is_some_and(Status::is_online);
        let is_online = presence.is_online();
        let new_status = presence.get_active_status().map(|s| s.id().to_string());

        if !was_online && is_online {
            self.emit(BlistEvent::BuddySignedOn { buddy });
            self.propagate_online(buddy, true);
        } else if was_online && !is_online {
            self.set_int(buddy, LAST_SEEN, unix_now())?;
            self.emit(BlistEvent::BuddySignedOff { buddy });
            self.propagate_online(buddy, false);
        } else {
            self.emit(BlistEvent::BuddyStatusChanged {
                buddy,
                old_status: old_status.map(str::to_string),
                new_status,
            });
        }

        self.invalidate_contact_of(buddy);
        self.notify_update(buddy);
        Ok(())
    }

    fn propagate_online(&mut self, buddy: NodeId, online: bool) {
        let Some(contact) = self.tree.get_parent(Some(buddy)) else {
            return;
        };
        tracing::debug!(%buddy, %contact, online, "propagating online edge");
        let edge = Contribution {
            connected: false,
            online: true,
        };
        if online {
            self.add_contribution(contact, edge, false);
        } else {
            self.remove_contribution(contact, edge, false);
        }
    }

    /// Update a buddy's idleness.
    ///
    /// Emits `buddy-idle-changed` when the idle flag flips. Any change
    /// invalidates the contact's priority cache and updates the buddy.
    pub fn buddy_set_idle(
        &mut self,
        buddy: NodeId,
        idle: bool,
        idle_since: Option<u64>,
    ) -> Result<bool, BlistError> {
        let change = self
            .tree
            .buddy_mut(buddy)
            .ok_or(BlistError::UnknownNode(buddy))?
            .presence_mut()
            .set_idle(idle, idle_since);
        let Some(change) = change else {
            return Ok(false);
        };
        if change.old_idle != change.idle {
            self.emit(BlistEvent::BuddyIdleChanged {
                buddy,
                old_idle: change.old_idle,
                idle: change.idle,
            });
        }
        self.invalidate_contact_of(buddy);
        self.notify_update(buddy);
        Ok(true)
    }

    /// Store a buddy's login time (unix seconds).
    pub fn buddy_set_login_time(&mut self, buddy: NodeId, login_time: Option<u64>) -> Result<bool, BlistError> {
        let changed = self
            .tree
            .buddy_mut(buddy)
            .ok_or(BlistError::UnknownNode(buddy))?
            .presence_mut()
            .set_login_time(login_time);
        if changed {
            self.notify_update(buddy);
        }
        Ok(changed)
    }

    /// Activate or deactivate a status on an account's own presence.
    ///
    /// Nothing propagates into the tree; only `status-changed` is emitted.
    pub fn set_account_status(
        &mut self,
        account: AccountId,
        status: &str,
        active: bool,
        attrs: &[(&str, Value)],
    ) -> Result<bool, BlistError> {
        let presence = self
            .accounts
            .get_mut(account)
            .ok_or(BlistError::UnknownAccount(account))?
            .presence_mut();
        let transition = match presence.set_status_active(status, active, attrs) {
            Ok(Some(t)) => t,
            Ok(None) => return Ok(false),
            Err(err) => {
                tracing::error!(%account, status, %err, "account status change rejected");
                return Err(err);
            }
        };
        self.emit(BlistEvent::StatusChanged {
            owner: PresenceOwner::Account(account),
            old_status: transition.old_status,
            status: transition.status,
            active: transition.active,
        });
        Ok(true)
    }

    /// Mark an account connected or disconnected.
    ///
    /// Connecting raises `current_size` along the account's buddies and
    /// chats. Disconnecting first drives every online buddy of the account
    /// to its offline status through [`BuddyList::set_buddy_status`] and
    /// clears idleness, then lowers `current_size`. Either way the
    /// affected contacts' priority caches are invalidated.
    pub fn set_account_connected(&mut self, account: AccountId, connected: bool) -> Result<(), BlistError> {
        let current = self
            .accounts
            .get(account)
            .ok_or(BlistError::UnknownAccount(account))?;
        if current.is_connected() == connected {
            return Ok(());
        }
        tracing::debug!(%account, connected, "account connection changed");

        let buddies = self.buddies_on_account(account);
        let chats = self.chats_on_account(account);
        let edge = Contribution {
            connected: true,
            online: false,
        };

        if connected {
            if let Some(a) = self.accounts.get_mut(account) {
                a.set_connected(true);
            }
            for &buddy in &buddies {
                if let Some(contact) = self.tree.get_parent(Some(buddy)) {
                    self.add_contribution(contact, edge, false);
                }
            }
            for &chat in &chats {
                if let Some(group) = self.tree.get_parent(Some(chat)) {
                    self.add_contribution(group, edge, false);
                }
            }
        } else {
            for &buddy in &buddies {
                let offline = self
                    .tree
                    .buddy(buddy)
                    .map(|b| b.presence())
                    .filter(|p| p.is_online())
                    .map(|p| offline_status(p).map(str::to_string));
                match offline {
                    Some(Some(status)) => {
                        self.set_buddy_status(buddy, &status, true, &[])?;
                    }
                    Some(None) => {
                        tracing::warn!(%buddy, "no offline status to fall back to");
                    }
                    None => {}
                }
                self.buddy_set_idle(buddy, false, None)?;
            }
            if let Some(status) = self
                .accounts
                .get(account)
                .map(Account::presence)
                .filter(|p| p.is_online())
                .and_then(offline_status)
                .map(str::to_string)
            {
                self.set_account_status(account, &status, true, &[])?;
            }

            if let Some(a) = self.accounts.get_mut(account) {
                a.set_connected(false);
            }
            for &buddy in &buddies {
                if let Some(contact) = self.tree.get_parent(Some(buddy)) {
                    self.remove_contribution(contact, edge, false);
                }
            }
            for &chat in &chats {
                if let Some(group) = self.tree.get_parent(Some(chat)) {
                    self.remove_contribution(group, edge, false);
                }
            }
        }

        for &buddy in &buddies {
            self.invalidate_contact_of(buddy);
            self.notify_update(buddy);
        }
        for &chat in &chats {
            self.notify_update(chat);
        }
        Ok(())
    }
}

/// The first exclusive offline status of a presence.
fn offline_status(presence: &Presence) -> Option<&str> {
    presence
        .get_statuses()
        .iter()
        .find(|s| s.is_exclusive() && s.primitive() == StatusPrimitive::Offline)
        .map(Status::id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::Preferences;
    use crate::status::StatusCatalog;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    struct Fixture {
        list: BuddyList,
        account: AccountId,
        buddy: NodeId,
        contact: NodeId,
        group: NodeId,
        events: Rc<RefCell<Vec<BlistEvent>>>,
    }

    fn fixture() -> Fixture {
        let mut list = BuddyList::new(Preferences::default());
        let account = list.add_account(Account::new("me", "xmpp", Arc::new(StatusCatalog::standard())));
        list.set_account_connected(account, true).unwrap();
        let group = list.find_or_add_group("Friends");
        let buddy = list.new_buddy(account, "alice", None).unwrap();
        let contact = list.add_buddy(buddy, None, Some(group), None).unwrap().unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        list.signals_mut()
            .connect_all(move |e| sink.borrow_mut().push(e.clone()));
        Fixture {
            list,
            account,
            buddy,
            contact,
            group,
            events,
        }
    }

    fn online(list: &BuddyList, id: NodeId) -> u32 {
        list.tree().get(id).unwrap().counts().unwrap().online
    }

    #[test]
    fn sign_off_records_last_seen() {
        let mut f = fixture();
        f.list.set_buddy_status(f.buddy, "available", true, &[]).unwrap();
        f.list.set_buddy_status(f.buddy, "offline", true, &[]).unwrap();
        assert!(f.list.get_int(f.buddy, LAST_SEEN) > 0);
        assert_eq!(online(&f.list, f.contact), 0);
        assert_eq!(online(&f.list, f.group), 0);
        assert!(f
            .events
            .borrow()
            .iter()
            .any(|e| matches!(e, BlistEvent::BuddySignedOff { .. })));
    }

    #[test]
    fn online_to_online_is_a_status_change() {
        let mut f = fixture();
        f.list.set_buddy_status(f.buddy, "available", true, &[]).unwrap();
        f.events.borrow_mut().clear();
        f.list.set_buddy_status(f.buddy, "away", true, &[]).unwrap();
        let events = f.events.borrow();
        assert_eq!(
            events[0],
            BlistEvent::BuddyStatusChanged {
                buddy: f.buddy,
                old_status: Some("available".into()),
                new_status: Some("away".into()),
            }
        );
        assert_eq!(online(&f.list, f.contact), 1);
    }

    #[test]
    fn unchanged_activation_is_silent() {
        let mut f = fixture();
        f.list.set_buddy_status(f.buddy, "away", true, &[]).unwrap();
        f.events.borrow_mut().clear();
        assert!(!f.list.set_buddy_status(f.buddy, "away", true, &[]).unwrap());
        assert!(f.events.borrow().is_empty());
    }

    #[test]
    fn rejected_deactivation_leaves_state() {
        let mut f = fixture();
        f.list.set_buddy_status(f.buddy, "available", true, &[]).unwrap();
        let err = f
            .list
            .set_buddy_status(f.buddy, "available", false, &[])
            .unwrap_err();
        assert!(matches!(err, BlistError::InvalidTransition { .. }));
        assert_eq!(online(&f.list, f.contact), 1);
    }

    #[test]
    fn independent_toggle_keeps_counts() {
        let mut f = fixture();
        f.list.set_buddy_status(f.buddy, "available", true, &[]).unwrap();
        f.list.set_buddy_status(f.buddy, "mobile", true, &[]).unwrap();
        f.list.set_buddy_status(f.buddy, "mobile", false, &[]).unwrap();
        assert_eq!(online(&f.list, f.contact), 1);
        assert_eq!(online(&f.list, f.group), 1);
    }

    #[test]
    fn idle_flip_emits_once() {
        let mut f = fixture();
        f.list.set_buddy_status(f.buddy, "available", true, &[]).unwrap();
        f.list.get_priority_buddy(f.contact);
        f.events.borrow_mut().clear();

        assert!(f.list.buddy_set_idle(f.buddy, true, Some(100)).unwrap());
        assert!(f.list.buddy_set_idle(f.buddy, true, Some(200)).unwrap());
        assert!(!f.list.buddy_set_idle(f.buddy, true, Some(200)).unwrap());
        let flips = f
            .events
            .borrow()
            .iter()
            .filter(|e| matches!(e, BlistEvent::BuddyIdleChanged { .. }))
            .count();
        assert_eq!(flips, 1);
        assert!(!f.list.tree().contact(f.contact).unwrap().priority_valid());
    }

    #[test]
    fn account_status_does_not_touch_tree() {
        let mut f = fixture();
        assert!(f.list.set_account_status(f.account, "available", true, &[]).unwrap());
        assert_eq!(online(&f.list, f.contact), 0);
        assert!(matches!(
            f.events.borrow()[0],
            BlistEvent::StatusChanged {
                owner: PresenceOwner::Account(_),
                ..
            }
        ));
    }

    #[test]
    fn disconnect_drives_buddies_offline() {
        let mut f = fixture();
        f.list.set_buddy_status(f.buddy, "available", true, &[]).unwrap();
        f.list.buddy_set_idle(f.buddy, true, Some(5)).unwrap();
        f.list.set_account_connected(f.account, false).unwrap();

        let counts = *f.list.tree().contact(f.contact).unwrap().counts();
        assert_eq!((counts.online, counts.current_size, counts.total_size), (0, 0, 1));
        let group = *f.list.tree().group(f.group).unwrap().counts();
        assert_eq!((group.online, group.current_size), (0, 0));
        let presence = f.list.tree().buddy(f.buddy).unwrap().presence();
        assert!(!presence.is_online());
        assert_eq!(presence.idle_since(), None);
    }

    #[test]
    fn reconnect_restores_current_size() {
        let mut f = fixture();
        f.list.set_account_connected(f.account, false).unwrap();
        f.list.set_account_connected(f.account, true).unwrap();
        assert_eq!(f.list.tree().contact(f.contact).unwrap().counts().current_size, 1);
        assert_eq!(f.list.tree().group(f.group).unwrap().counts().current_size, 1);
    }

    #[test]
    fn disconnected_account_keeps_buddy_offline() {
        let mut f = fixture();
        f.list.set_account_connected(f.account, false).unwrap();
        f.events.borrow_mut().clear();

        assert!(!f.list.set_buddy_status(f.buddy, "available", true, &[]).unwrap());

        assert!(!f.list.tree().buddy(f.buddy).unwrap().presence().is_online());
        assert_eq!(online(&f.list, f.contact), 0);
        assert_eq!(online(&f.list, f.group), 0);
        assert!(f.events.borrow().is_empty());
    }

    #[test]
    fn login_time_updates() {
        let mut f = fixture();
        assert!(f.list.buddy_set_login_time(f.buddy, Some(1_700_000_000)).unwrap());
        assert!(!f.list.buddy_set_login_time(f.buddy, Some(1_700_000_000)).unwrap());
    }
}
