//! Preferences consumed by the presence engine and the priority resolver.
//!
//! Preferences are loaded from a TOML file (default: `blist.toml`):
//!
//! ```toml
//! [contact]
//! prefer_last_on_tie = false
//!
//! [scores]
//! available = 100
//! away = -100
//! idle = -10
//! ```
//!
//! Every field has a default, so an empty file is valid. The list holds
//! one `Preferences` value; reloading goes through
//! `BuddyList::set_preferences` so cached priority buddies are dropped.

use blist_types::StatusPrimitive;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root preferences.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Contact preferences.
    #[serde(default)]
    pub contact: ContactPrefs,
    /// Presence scoring table.
    #[serde(default)]
    pub scores: ScoreTable,
}

/// Contact preferences.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactPrefs {
    /// On a presence tie, let the later buddy in the contact win.
    #[serde(default)]
    pub prefer_last_on_tie: bool,
}

/// An addressable slot in the score table.
///
/// Besides one slot per primitive there are three synthetic slots that
/// the presence engine layers on top of the primitive score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreSlot {
    /// Score of an active status with this primitive.
    Primitive(StatusPrimitive),
    /// Penalty for an idle presence.
    Idle,
    /// Penalty for the presence that has been idle longer.
    IdleTime,
    /// Bonus for an offline status on an account that accepts offline messages.
    OfflineMessageable,
}

impl ScoreSlot {
    /// Preference key of this slot.
    pub fn key(&self) -> &'static str {
        match self {
            ScoreSlot::Primitive(p) => p.id(),
            ScoreSlot::Idle => "idle",
            ScoreSlot::IdleTime => "idle_time",
            ScoreSlot::OfflineMessageable => "offline_messageable",
        }
    }

    /// Look up a slot by preference key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "idle" => Some(ScoreSlot::Idle),
            "idle_time" => Some(ScoreSlot::IdleTime),
            "offline_messageable" | "offline_msg" => Some(ScoreSlot::OfflineMessageable),
            other => StatusPrimitive::from_id(other).map(ScoreSlot::Primitive),
        }
    }

    /// All slots, primitives first.
    pub fn all() -> impl Iterator<Item = ScoreSlot> {
        StatusPrimitive::ALL
            .into_iter()
            .map(ScoreSlot::Primitive)
            .chain([
                ScoreSlot::Idle,
                ScoreSlot::IdleTime,
                ScoreSlot::OfflineMessageable,
            ])
    }
}

/// Presence scores, one per primitive plus the synthetic slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTable {
    #[serde(default = "default_unset")]
    unset: i32,
    #[serde(default = "default_offline")]
    offline: i32,
    #[serde(default = "default_available")]
    available: i32,
    #[serde(default = "default_unavailable")]
    unavailable: i32,
    #[serde(default = "default_invisible")]
    invisible: i32,
    #[serde(default = "default_away")]
    away: i32,
    #[serde(default = "default_extended_away")]
    extended_away: i32,
    #[serde(default = "default_mobile")]
    mobile: i32,
    #[serde(default = "default_tune")]
    tune: i32,
    #[serde(default = "default_mood")]
    mood: i32,
    #[serde(default = "default_idle")]
    idle: i32,
    #[serde(default = "default_idle_time")]
    idle_time: i32,
    #[serde(default = "default_offline_messageable", alias = "offline_msg")]
    offline_messageable: i32,
}

// Default value functions
fn default_unset() -> i32 {
    0
}

fn default_offline() -> i32 {
    -500
}

fn default_available() -> i32 {
    100
}

fn default_unavailable() -> i32 {
    -75
}

fn default_invisible() -> i32 {
    -50
}

fn default_away() -> i32 {
    -100
}

fn default_extended_away() -> i32 {
    -200
}

fn default_mobile() -> i32 {
    -400
}

fn default_tune() -> i32 {
    0
}

fn default_mood() -> i32 {
    0
}

fn default_idle() -> i32 {
    -10
}

fn default_idle_time() -> i32 {
    -5
}

fn default_offline_messageable() -> i32 {
    10
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            unset: default_unset(),
            offline: default_offline(),
            available: default_available(),
            unavailable: default_unavailable(),
            invisible: default_invisible(),
            away: default_away(),
            extended_away: default_extended_away(),
            mobile: default_mobile(),
            tune: default_tune(),
            mood: default_mood(),
            idle: default_idle(),
            idle_time: default_idle_time(),
            offline_messageable: default_offline_messageable(),
        }
    }
}

impl ScoreTable {
    fn slot_mut(&mut self, slot: ScoreSlot) -> &mut i32 {
        match slot {
            ScoreSlot::Primitive(p) => match p {
                StatusPrimitive::Unset => &mut self.unset,
                StatusPrimitive::Offline => &mut self.offline,
                StatusPrimitive::Available => &mut self.available,
                StatusPrimitive::Unavailable => &mut self.unavailable,
                StatusPrimitive::Invisible => &mut self.invisible,
                StatusPrimitive::Away => &mut self.away,
                StatusPrimitive::ExtendedAway => &mut self.extended_away,
                StatusPrimitive::Mobile => &mut self.mobile,
                StatusPrimitive::Tune => &mut self.tune,
                StatusPrimitive::Mood => &mut self.mood,
            },
            ScoreSlot::Idle => &mut self.idle,
            ScoreSlot::IdleTime => &mut self.idle_time,
            ScoreSlot::OfflineMessageable => &mut self.offline_messageable,
        }
    }

    /// Read a slot.
    pub fn get(&self, slot: ScoreSlot) -> i32 {
        match slot {
            ScoreSlot::Primitive(p) => self.primitive(p),
            ScoreSlot::Idle => self.idle,
            ScoreSlot::IdleTime => self.idle_time,
            ScoreSlot::OfflineMessageable => self.offline_messageable,
        }
    }

    /// Score of an active status with the given primitive.
    pub fn primitive(&self, primitive: StatusPrimitive) -> i32 {
        match primitive {
            StatusPrimitive::Unset => self.unset,
            StatusPrimitive::Offline => self.offline,
            StatusPrimitive::Available => self.available,
            StatusPrimitive::Unavailable => self.unavailable,
            StatusPrimitive::Invisible => self.invisible,
            StatusPrimitive::Away => self.away,
            StatusPrimitive::ExtendedAway => self.extended_away,
            StatusPrimitive::Mobile => self.mobile,
            StatusPrimitive::Tune => self.tune,
            StatusPrimitive::Mood => self.mood,
        }
    }

    /// Override a slot.
    pub fn set(&mut self, slot: ScoreSlot, score: i32) {
        *self.slot_mut(slot) = score;
    }
}

impl Preferences {
    /// Parse preferences from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read and parse a preferences file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether the later buddy wins a priority tie.
    pub fn prefer_last_on_tie(&self) -> bool {
        self.contact.prefer_last_on_tie
    }
}

/// Failure to load a preferences file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {}", path.display())]
    Read {
        /// File path.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid preferences TOML.
    #[error("invalid preferences in {}", path.display())]
    Parse {
        /// File path.
        path: PathBuf,
        /// TOML failure.
        #[source]
        source: toml::de::Error,
    },
}
