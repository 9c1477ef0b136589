//! Priority buddy resolution.
//!
//! The priority buddy is the one buddy that represents a contact in
//! collapsed views. Results are cached on the contact by the list; this
//! module only computes.

use crate::account::Accounts;
use crate::node::NodeTree;
use crate::prefs::Preferences;
use crate::presence::compare_presences;
use blist_types::NodeId;
use std::cmp::Ordering;

/// Pick the priority buddy among the children of `contact`.
///
/// Children are walked in order. The first buddy is taken as is. After
/// that only buddies on connected accounts are considered: one replaces
/// the current best when the best is on a disconnected account, when its
/// presence ranks strictly ahead, or on a tie when the preferences ask for
/// the last buddy to win.
pub fn compute_priority_buddy(
    tree: &NodeTree,
    accounts: &Accounts,
    contact: NodeId,
    prefs: &Preferences,
) -> Option<NodeId> {
    let mut best: Option<NodeId> = None;

    for child in tree.children(contact) {
        let Some(candidate) = tree.buddy(child) else {
            continue;
        };
        let Some(current) = best.and_then(|b| tree.buddy(b)) else {
            best = Some(child);
            continue;
        };
        if !accounts.is_connected(candidate.account()) {
            continue;
        }

        let cmp = if accounts.is_connected(current.account()) {
            compare_presences(
                Some((current.presence(), accounts.score_context(current.account()))),
                Some((candidate.presence(), accounts.score_context(candidate.account()))),
                &prefs.scores,
            )
        } else {
            Ordering::Greater
        };

        if cmp == Ordering::Greater || (cmp == Ordering::Equal && prefs.prefer_last_on_tie()) {
            best = Some(child);
        }
    }

    tracing::debug!(%contact, best = ?best, "computed priority buddy");
    best
}
