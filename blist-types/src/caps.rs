//! Media capability flags for buddies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Set of media capabilities a buddy advertises.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MediaCaps(u32);

impl MediaCaps {
    /// No media support.
    pub const NONE: MediaCaps = MediaCaps(0);
    /// Receive audio.
    pub const AUDIO_RECV: MediaCaps = MediaCaps(1 << 0);
    /// Send audio.
    pub const AUDIO_SEND: MediaCaps = MediaCaps(1 << 1);
    /// Receive video.
    pub const VIDEO_RECV: MediaCaps = MediaCaps(1 << 2);
    /// Send video.
    pub const VIDEO_SEND: MediaCaps = MediaCaps(1 << 3);
    /// Audio in both directions.
    pub const AUDIO: MediaCaps = MediaCaps(Self::AUDIO_RECV.0 | Self::AUDIO_SEND.0);
    /// Video in both directions.
    pub const VIDEO: MediaCaps = MediaCaps(Self::VIDEO_RECV.0 | Self::VIDEO_SEND.0);
    /// Audio and video together.
    pub const AUDIO_VIDEO: MediaCaps = MediaCaps(Self::AUDIO.0 | Self::VIDEO.0);
    /// Can add or remove streams from an existing session.
    pub const MODIFY_SESSION: MediaCaps = MediaCaps(1 << 4);
    /// Session can be changed between audio and video.
    pub const CHANGE_DIRECTION: MediaCaps = MediaCaps(1 << 5);

    /// Create from raw bits.
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// True if every flag in `other` is set.
    pub fn contains(&self, other: MediaCaps) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if no flag is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MediaCaps {
    type Output = MediaCaps;

    fn bitor(self, rhs: MediaCaps) -> MediaCaps {
        MediaCaps(self.0 | rhs.0)
    }
}

impl BitOrAssign for MediaCaps {
    fn bitor_assign(&mut self, rhs: MediaCaps) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for MediaCaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MediaCaps({:#b})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_flags() {
        assert!(MediaCaps::AUDIO.contains(MediaCaps::AUDIO_RECV));
        assert!(MediaCaps::AUDIO_VIDEO.contains(MediaCaps::VIDEO_SEND));
        assert!(!MediaCaps::AUDIO.contains(MediaCaps::VIDEO_RECV));
    }

    #[test]
    fn default_is_empty() {
        assert!(MediaCaps::default().is_empty());
        let mut caps = MediaCaps::NONE;
        caps |= MediaCaps::MODIFY_SESSION;
        assert!(!caps.is_empty());
        assert_eq!(caps.bits(), 1 << 4);
    }
}
