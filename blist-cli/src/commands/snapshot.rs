//! Replay a scenario and export the tree as JSON.

use anyhow::Result;
use blist_core::{BuddyList, Preferences};
use std::path::Path;

use crate::script::{Replay, Script};

/// Run the snapshot command.
pub fn run(script_path: &Path, prefs: Preferences, pretty: bool) -> Result<()> {
    println!("{}", export(script_path, prefs, pretty)?);
    Ok(())
}

fn export(script_path: &Path, prefs: Preferences, pretty: bool) -> Result<String> {
    let script = Script::load(script_path)?;
    let mut list = BuddyList::new(prefs);
    Replay::new(&mut list, &script)?.run(&script.steps)?;

    let snapshot = list.snapshot();
    let json = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn export_includes_priority_buddy() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "accounts": [{{ "username": "me", "connected": true }}],
                "steps": [
                    {{ "op": "add_buddy", "account": "me", "name": "a", "group": "Friends", "contact": "pal" }},
                    {{ "op": "add_buddy", "account": "me", "name": "b", "contact": "pal" }},
                    {{ "op": "set_status", "account": "me", "buddy": "b", "status": "available" }}
                ]
            }}"#
        )
        .unwrap();

        let json = export(file.path(), Preferences::default(), false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let contact = &value["groups"][0]["members"][0];
        assert_eq!(contact["priority_buddy"], "b");
        assert_eq!(contact["counts"]["online"], 1);
        assert_eq!(contact["buddies"][1]["status"], "available");
    }
}
