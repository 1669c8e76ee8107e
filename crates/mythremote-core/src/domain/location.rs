//! What the frontend is currently showing.
//!
//! `query location` answers with a single line such as
//! `Playback Recorded 00:12:03 of 00:58:30 1x 2101 2024-03-01T20:00:00 ...`
//! or a screen name such as `mainmenu`.  [`LocationSnapshot`] remembers the
//! last line so a change notification fires only on a transition, and
//! [`FrontendLocation`] gives UI layers a typed view of the line.

use serde::{Deserialize, Serialize};

/// Last known location, used to de-duplicate location-change notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationSnapshot {
    last: String,
}

impl LocationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `location` and reports whether it differs from the previous one.
    ///
    /// The snapshot is overwritten only when the value changed.
    pub fn observe(&mut self, location: &str) -> bool {
        if self.last == location {
            return false;
        }
        self.last = location.to_string();
        true
    }

    /// Forgets the last location.  Called on every disconnect.
    pub fn reset(&mut self) {
        self.last.clear();
    }

    /// The last recorded location; empty after a reset.
    pub fn current(&self) -> &str {
        &self.last
    }
}

/// Typed classification of a location line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrontendLocation {
    /// A video file is playing.
    PlaybackVideo { position: String },
    /// A recording is playing.
    PlaybackRecorded { position: String, total: String },
    /// Live TV is playing.
    PlaybackLiveTv { position: String, total: String },
    /// A browser screen listing videos or recordings.
    MediaBrowser(String),
    /// Any other screen (menus, guide, settings, ...).
    Screen(String),
}

impl FrontendLocation {
    /// Classifies a raw location line.
    pub fn parse(location: &str) -> Self {
        let parts: Vec<&str> = location.split_whitespace().collect();

        let parsed = match parts.as_slice() {
            ["Playback", "Video", position, ..] => Some(Self::PlaybackVideo {
                position: position.to_string(),
            }),
            ["Playback", "Recorded", position, _, total, ..] => Some(Self::PlaybackRecorded {
                position: position.to_string(),
                total: total.to_string(),
            }),
            ["Playback", "LiveTV", position, _, total, ..] => Some(Self::PlaybackLiveTv {
                position: position.to_string(),
                total: total.to_string(),
            }),
            _ => None,
        };

        parsed.unwrap_or_else(|| {
            if location.starts_with("mythvideo") || location.starts_with("playbackbox") {
                Self::MediaBrowser(location.to_string())
            } else {
                Self::Screen(location.to_string())
            }
        })
    }

    /// Whether something is playing.
    pub fn is_playback(&self) -> bool {
        matches!(
            self,
            Self::PlaybackVideo { .. } | Self::PlaybackRecorded { .. } | Self::PlaybackLiveTv { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── LocationSnapshot ──────────────────────────────────────────────────────

    #[test]
    fn test_snapshot_reports_first_location_as_change() {
        let mut snap = LocationSnapshot::new();
        assert!(snap.observe("mainmenu"));
        assert_eq!(snap.current(), "mainmenu");
    }

    #[test]
    fn test_snapshot_identical_location_is_not_a_change() {
        // Arrange
        let mut snap = LocationSnapshot::new();
        snap.observe("Playback Video 00:01:00 of 01:30:00");

        // Act
        let changed = snap.observe("Playback Video 00:01:00 of 01:30:00");

        // Assert
        assert!(!changed);
    }

    #[test]
    fn test_snapshot_reset_makes_same_location_a_change_again() {
        let mut snap = LocationSnapshot::new();
        snap.observe("livetv");
        snap.reset();
        assert_eq!(snap.current(), "");
        assert!(snap.observe("livetv"));
    }

    // ── FrontendLocation ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_video_playback() {
        assert_eq!(
            FrontendLocation::parse("Playback Video 00:01:00 1x"),
            FrontendLocation::PlaybackVideo {
                position: "00:01:00".into()
            }
        );
    }

    #[test]
    fn test_parse_recorded_playback() {
        assert_eq!(
            FrontendLocation::parse("Playback Recorded 00:12:03 of 00:58:30 1x 2101"),
            FrontendLocation::PlaybackRecorded {
                position: "00:12:03".into(),
                total: "00:58:30".into()
            }
        );
    }

    #[test]
    fn test_parse_live_tv_playback() {
        let loc = FrontendLocation::parse("Playback LiveTV 0:00:10 of 1:00:00 1x 1051");
        assert_eq!(
            loc,
            FrontendLocation::PlaybackLiveTv {
                position: "0:00:10".into(),
                total: "1:00:00".into()
            }
        );
        assert!(loc.is_playback());
    }

    #[test]
    fn test_parse_truncated_playback_line_is_plain_screen() {
        let loc = FrontendLocation::parse("Playback Recorded 00:12:03");
        assert_eq!(loc, FrontendLocation::Screen("Playback Recorded 00:12:03".into()));
        assert!(!loc.is_playback());
    }

    #[test]
    fn test_parse_media_browsers() {
        assert_eq!(
            FrontendLocation::parse("playbackbox"),
            FrontendLocation::MediaBrowser("playbackbox".into())
        );
        assert_eq!(
            FrontendLocation::parse("mythvideo"),
            FrontendLocation::MediaBrowser("mythvideo".into())
        );
    }

    #[test]
    fn test_parse_other_screen() {
        assert_eq!(
            FrontendLocation::parse("mainmenu"),
            FrontendLocation::Screen("mainmenu".into())
        );
    }
}
