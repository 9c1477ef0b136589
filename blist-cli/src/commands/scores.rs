//! Print the effective presence score table.

use anyhow::Result;
use blist_core::{Preferences, ScoreSlot};
use std::fmt::Write;

/// Run the scores command.
pub fn run(prefs: &Preferences) -> Result<()> {
    print!("{}", render(prefs));
    Ok(())
}

fn render(prefs: &Preferences) -> String {
    let mut out = String::new();
    for slot in ScoreSlot::all() {
        let _ = writeln!(out, "{:<20} {:>5}", slot.key(), prefs.scores.get(slot));
    }
    let _ = writeln!(
        out,
        "{:<20} {:>5}",
        "prefer_last_on_tie",
        prefs.contact.prefer_last_on_tie
    );
    out
}
