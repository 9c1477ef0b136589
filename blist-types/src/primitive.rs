//! Status primitives.
//!
//! Every status type a protocol defines maps onto one of these ten
//! primitives. The order of the variants is fixed; score tables are
//! indexed by it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of status primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPrimitive {
    /// No status set.
    Unset,
    /// Offline.
    Offline,
    /// Available / online.
    Available,
    /// Online but unavailable (do not disturb).
    Unavailable,
    /// Online but invisible to others.
    Invisible,
    /// Away.
    Away,
    /// Extended away.
    ExtendedAway,
    /// Connected from a mobile device.
    Mobile,
    /// Listening to music.
    Tune,
    /// Mood.
    Mood,
}

impl StatusPrimitive {
    /// Number of primitives.
    pub const COUNT: usize = 10;

    /// All primitives, in table order.
    pub const ALL: [StatusPrimitive; Self::COUNT] = [
        StatusPrimitive::Unset,
        StatusPrimitive::Offline,
        StatusPrimitive::Available,
        StatusPrimitive::Unavailable,
        StatusPrimitive::Invisible,
        StatusPrimitive::Away,
        StatusPrimitive::ExtendedAway,
        StatusPrimitive::Mobile,
        StatusPrimitive::Tune,
        StatusPrimitive::Mood,
    ];

    /// Position of this primitive in the table order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable string id of this primitive.
    pub fn id(self) -> &'static str {
        match self {
            StatusPrimitive::Unset => "unset",
            StatusPrimitive::Offline => "offline",
            StatusPrimitive::Available => "available",
            StatusPrimitive::Unavailable => "unavailable",
            StatusPrimitive::Invisible => "invisible",
            StatusPrimitive::Away => "away",
            StatusPrimitive::ExtendedAway => "extended_away",
            StatusPrimitive::Mobile => "mobile",
            StatusPrimitive::Tune => "tune",
            StatusPrimitive::Mood => "mood",
        }
    }

    /// Human-readable name of this primitive.
    pub fn name(self) -> &'static str {
        match self {
            StatusPrimitive::Unset => "Unset",
            StatusPrimitive::Offline => "Offline",
            StatusPrimitive::Available => "Available",
            StatusPrimitive::Unavailable => "Do not disturb",
            StatusPrimitive::Invisible => "Invisible",
            StatusPrimitive::Away => "Away",
            StatusPrimitive::ExtendedAway => "Extended away",
            StatusPrimitive::Mobile => "Mobile",
            StatusPrimitive::Tune => "Listening to music",
            StatusPrimitive::Mood => "Feeling",
        }
    }

    /// Look up a primitive by its id.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    /// Whether a status of this primitive counts as online.
    ///
    /// True for everything except `Unset` and `Offline`.
    pub fn is_online(self) -> bool {
        !matches!(self, StatusPrimitive::Unset | StatusPrimitive::Offline)
    }
}

impl fmt::Display for StatusPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
