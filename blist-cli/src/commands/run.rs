//! Replay a scenario and print the resulting tree.

use anyhow::Result;
use blist_core::{BlistEvent, BuddyList, NodeId, NodeType, Preferences};
use std::cell::RefCell;
use std::fmt::Write;
use std::path::Path;
use std::rc::Rc;

use crate::script::{Replay, Script};

/// Run the run command.
///
/// With `events` every emitted signal is printed as one JSON line before
/// the tree.
pub fn run(script_path: &Path, prefs: Preferences, events: bool) -> Result<()> {
    let script = Script::load(script_path)?;
    let mut list = BuddyList::new(prefs);
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    list.signals_mut()
        .connect_all(move |e: &BlistEvent| sink.borrow_mut().push(e.clone()));

    Replay::new(&mut list, &script)?.run(&script.steps)?;
    tracing::info!(steps = script.steps.len(), nodes = list.tree().len(), "scenario replayed");

    if events {
        for event in log.borrow().iter() {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    print!("{}", render_tree(&mut list));
    Ok(())
}

/// Indented text view of the list.
///
/// Groups and contacts show `online/current/total`; contacts name their
/// priority buddy.
pub fn render_tree(list: &mut BuddyList) -> String {
    let nodes: Vec<(usize, NodeId)> = {
        let tree = list.tree();
        tree.walk()
            .map(|id| {
                let mut depth = 0;
                let mut parent = tree.get_parent(Some(id));
                while let Some(p) = parent {
                    depth += 1;
                    parent = tree.get_parent(Some(p));
                }
                (depth, id)
            })
            .collect()
    };

    let mut out = String::new();
    for (depth, id) in nodes {
        let indent = "  ".repeat(depth);
        let name = list.node_display_name(id).unwrap_or_default();
        let counts = list
            .tree()
            .get(id)
            .and_then(|n| n.counts())
            .map(|c| format!(" {}/{}/{}", c.online, c.current_size, c.total_size))
            .unwrap_or_default();
        let detail = match list.tree().node_type(id) {
            Some(NodeType::Contact) => list
                .get_priority_buddy(id)
                .and_then(|b| list.tree().buddy(b))
                .map(|b| format!(" -> {}", b.name()))
                .unwrap_or_default(),
            Some(NodeType::Buddy) => list
                .tree()
                .buddy(id)
                .map(|b| {
                    let presence = b.presence();
                    let status = presence.get_active_status().map_or("-", |s| s.id());
                    let idle = if presence.is_idle() { " idle" } else { "" };
                    format!(" [{status}{idle}]")
                })
                .unwrap_or_default(),
            Some(NodeType::Chat) => " (chat)".to_string(),
            _ => String::new(),
        };
        let _ = writeln!(out, "{indent}{name}{counts}{detail}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_counts_and_priority() {
        let script: Script = serde_json::from_str(
            r#"{
                "accounts": [{ "username": "me", "connected": true }],
                "steps": [
                    { "op": "add_buddy", "account": "me", "name": "alice", "alias": "Alice", "group": "Friends", "contact": "a" },
                    { "op": "set_status", "account": "me", "buddy": "alice", "status": "away" },
                    { "op": "set_idle", "account": "me", "buddy": "alice", "idle": true, "since": 10 }
                ]
            }"#,
        )
        .unwrap();
        let mut list = BuddyList::new(Preferences::default());
        Replay::new(&mut list, &script).unwrap().run(&script.steps).unwrap();

        assert_eq!(
            render_tree(&mut list),
            "Friends 1/1/1\n  Alice 1/1/1 -> alice\n    Alice [away idle]\n"
        );
    }
}
