//! # blist
//!
//! CLI tool for replaying buddy-list presence scenarios.
//!
//! ## Commands
//!
//! - `run`: Replay a scenario script and print the tree
//! - `snapshot`: Replay a scenario script and export the tree as JSON
//! - `scores`: Show the effective presence score table
//!
//! ## Example
//!
//! ```bash
//! # Replay with custom scores, printing every signal
//! blist --prefs blist.toml run scenario.json --events
//!
//! # Export the final tree
//! blist snapshot scenario.json --pretty
//!
//! # Trace propagation steps
//! RUST_LOG=blist_core=debug blist run scenario.json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod script;

use commands::{load_preferences, run, scores, snapshot};

/// CLI tool for replaying buddy-list presence scenarios.
#[derive(Parser, Debug)]
#[command(name = "blist")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Preferences file (TOML) with score overrides
    #[arg(long, global = true)]
    prefs: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a scenario script and print the tree
    Run {
        /// Scenario script (JSON)
        script: PathBuf,

        /// Print every emitted signal as a JSON line
        #[arg(long)]
        events: bool,
    },

    /// Replay a scenario script and export the tree as JSON
    Snapshot {
        /// Scenario script (JSON)
        script: PathBuf,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Show the effective presence score table
    Scores,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let prefs = load_preferences(cli.prefs.as_deref())?;

    match cli.command {
        Commands::Run { script, events } => run::run(&script, prefs, events)?,
        Commands::Snapshot { script, pretty } => snapshot::run(&script, prefs, pretty)?,
        Commands::Scores => scores::run(&prefs)?,
    }

    Ok(())
}

/// Logs go to stderr so stdout stays parseable.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
