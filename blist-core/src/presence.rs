//! Presence engine.
//!
//! A [`Presence`] owns one [`Status`] per status type of its protocol and
//! tracks which exclusive status is active. Like the rest of this crate it
//! performs no side effects: activating a status returns a
//! [`StatusTransition`] describing what changed, and the owning
//! `BuddyList` turns that into count propagation, cache invalidation and
//! notifications.

use crate::prefs::{ScoreSlot, ScoreTable};
use crate::status::{Status, StatusCatalog};
use blist_types::{BlistError, StatusPrimitive, Value};
use std::cmp::Ordering;

/// Result of a status activation that changed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    /// The status that was activated or deactivated.
    pub status: String,
    /// Its new active flag.
    pub active: bool,
    /// The exclusive status active before the change.
    ///
    /// For an independent status this is the exclusive status that stays
    /// active, so comparing online-ness across the change is meaningful.
    pub old_status: Option<String>,
    /// The exclusive status displaced by this activation, if any.
    pub deactivated: Option<String>,
    /// Online-ness before the change.
    pub was_online: bool,
    /// Online-ness after the change.
    pub is_online: bool,
}

impl StatusTransition {
    /// True when the presence went from not-online to online.
    pub fn signed_on(&self) -> bool {
        !self.was_online && self.is_online
    }

    /// True when the presence went from online to not-online.
    pub fn signed_off(&self) -> bool {
        self.was_online && !self.is_online
    }
}

/// Result of an idle update that changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleChange {
    /// Idle flag before the change.
    pub old_idle: bool,
    /// Idle flag after the change.
    pub idle: bool,
}

/// Per-owner inputs to presence scoring that live outside the presence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreContext {
    /// Score bonus configured on the owning account.
    pub account_score: i32,
    /// Whether the account can deliver messages while the buddy is offline.
    pub offline_messageable: bool,
}

/// The statuses of one account or buddy.
#[derive(Debug, Clone)]
pub struct Presence {
    statuses: Vec<Status>,
    active: Option<usize>,
    idle: bool,
    idle_since: Option<u64>,
    login_time: Option<u64>,
}

impl Presence {
    /// Create a presence with one status per catalog type.
    ///
    /// The first offline status, if the catalog has one, starts active.
    pub fn new(catalog: &StatusCatalog) -> Self {
        let mut statuses: Vec<Status> = catalog
            .types()
            .iter()
            .map(|t| Status::new(t.clone()))
            .collect();
        let active = statuses
            .iter()
            .position(|s| s.primitive() == StatusPrimitive::Offline && s.is_exclusive());
        if let Some(index) = active {
            statuses[index].set_active_flag(true);
        }
        Self {
            statuses,
            active,
            idle: false,
            idle_since: None,
            login_time: None,
        }
    }

    /// All statuses, in catalog order.
    pub fn get_statuses(&self) -> &[Status] {
        &self.statuses
    }

    /// Look up a status by id.
    pub fn get_status(&self, id: &str) -> Option<&Status> {
        self.statuses.iter().find(|s| s.id() == id)
    }

    /// The active exclusive status.
    pub fn get_active_status(&self) -> Option<&Status> {
        self.active.map(|i| &self.statuses[i])
    }

    /// Whether the status with this id is active.
    pub fn is_status_active(&self, id: &str) -> bool {
        self.get_status(id).is_some_and(Status::is_active)
    }

    /// Whether any active status has this primitive.
    pub fn is_status_primitive_active(&self, primitive: StatusPrimitive) -> bool {
        self.statuses
            .iter()
            .any(|s| s.is_active() && s.primitive() == primitive)
    }

    /// Online when the active exclusive status is online.
    pub fn is_online(&self) -> bool {
        self.get_active_status().is_some_and(Status::is_online)
    }

    /// Available when the active status is available and not idle.
    pub fn is_available(&self) -> bool {
        self.get_active_status().is_some_and(Status::is_available) && !self.is_idle()
    }

    /// Idle only counts while online.
    pub fn is_idle(&self) -> bool {
        self.is_online() && self.idle
    }

    /// When the presence went idle (unix seconds).
    pub fn idle_since(&self) -> Option<u64> {
        self.idle_since
    }

    /// When the owner logged in (unix seconds).
    pub fn login_time(&self) -> Option<u64> {
        self.login_time
    }

    /// Store the login time.
    pub fn set_login_time(&mut self, login_time: Option<u64>) -> bool {
        if self.login_time == login_time {
            return false;
        }
        self.login_time = login_time;
        true
    }

    /// Update idleness. Returns `None` when nothing changed.
    pub fn set_idle(&mut self, idle: bool, idle_since: Option<u64>) -> Option<IdleChange> {
        let idle_since = if idle { idle_since } else { None };
        if self.idle == idle && self.idle_since == idle_since {
            return None;
        }
        let old_idle = self.idle;
        self.idle = idle;
        self.idle_since = idle_since;
        Some(IdleChange { old_idle, idle })
    }

    /// Activate the status with this id, leaving attributes at their defaults.
    pub fn switch_to(&mut self, id: &str) -> Result<Option<StatusTransition>, BlistError> {
        self.set_status_active(id, true, &[])
    }

    /// Activate or deactivate a status.
    ///
    /// Explicit `attrs` are applied first; every attribute not named is
    /// reset to its schema default. Activating an exclusive status
    /// deactivates the previously active one. Deactivating an exclusive
    /// status directly is rejected with [`BlistError::InvalidTransition`]
    /// and leaves the presence untouched.
    ///
    /// Returns `Ok(None)` when neither the flag nor any attribute changed.
    pub fn set_status_active(
        &mut self,
        id: &str,
        active: bool,
        attrs: &[(&str, Value)],
    ) -> Result<Option<StatusTransition>, BlistError> {
        let index = self
            .statuses
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| BlistError::UnknownStatus {
                status: id.to_string(),
            })?;

        let exclusive = self.statuses[index].is_exclusive();
        if !active && exclusive {
            return Err(BlistError::InvalidTransition {
                status: id.to_string(),
            });
        }

        let was_online = self.is_online();
        let old_active = self.active;

        let status = &mut self.statuses[index];
        let mut changed = status.is_active() != active;
        status.set_active_flag(active);
        changed |= status.assign_attrs(attrs);

        if !changed {
            return Ok(None);
        }

        let mut deactivated = None;
        if exclusive {
            if let Some(old) = old_active.filter(|&old| old != index) {
                self.statuses[old].set_active_flag(false);
                deactivated = Some(self.statuses[old].id().to_string());
            }
            self.active = Some(index);
        }

        Ok(Some(StatusTransition {
            status: id.to_string(),
            active,
            old_status: old_active.map(|i| self.statuses[i].id().to_string()),
            deactivated,
            was_online,
            is_online: self.is_online(),
        }))
    }

    /// Score of this presence under `scores`.
    ///
    /// Sum of the primitive scores of every active status, plus the
    /// offline-messageable bonus for active non-online statuses when the
    /// account supports it, plus the account's own score, plus the idle
    /// penalty when idle.
    pub fn compute_score(&self, ctx: ScoreContext, scores: &ScoreTable) -> i32 {
        let mut score = 0;
        for status in self.statuses.iter().filter(|s| s.is_active()) {
            score += scores.primitive(status.primitive());
            if !status.is_online() && ctx.offline_messageable {
                score += scores.get(ScoreSlot::OfflineMessageable);
            }
        }
        score += ctx.account_score;
        if self.is_idle() {
            score += scores.get(ScoreSlot::Idle);
        }
        score
    }

    fn idle_longer_than(&self, other: &Presence) -> bool {
        if !self.is_idle() {
            return false;
        }
        if !other.is_idle() {
            return true;
        }
        self.idle_since.unwrap_or(u64::MAX) < other.idle_since.unwrap_or(u64::MAX)
    }
}

/// Order two buddy presences, best first.
///
/// An absent presence sorts last; an online presence beats one that is
/// not online; otherwise the higher [`Presence::compute_score`] wins, with
/// the idle-time penalty charged to whichever presence has been idle
/// longer. `Less` means `a` ranks ahead of `b`.
pub fn compare_presences(
    a: Option<(&Presence, ScoreContext)>,
    b: Option<(&Presence, ScoreContext)>,
    scores: &ScoreTable,
) -> Ordering {
    let ((a, a_ctx), (b, b_ctx)) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => (a, b),
    };

    match (a.is_online(), b.is_online()) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    let mut score_a = a.compute_score(a_ctx, scores);
    let mut score_b = b.compute_score(b_ctx, scores);
    let idle_time = scores.get(ScoreSlot::IdleTime);
    if a.idle_longer_than(b) {
        score_a += idle_time;
    } else if b.idle_longer_than(a) {
        score_b += idle_time;
    }

    score_b.cmp(&score_a)
}
