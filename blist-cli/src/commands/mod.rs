//! CLI command implementations.

pub mod run;
pub mod scores;
pub mod snapshot;

use anyhow::{Context, Result};
use blist_core::Preferences;
use std::path::Path;

/// Load preferences from `path`, or the defaults.
pub fn load_preferences(path: Option<&Path>) -> Result<Preferences> {
    match path {
        Some(path) => Preferences::from_file(path).context("Failed to load preferences"),
        None => Ok(Preferences::default()),
    }
}
