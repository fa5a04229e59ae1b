//! Core display types shared across all modules.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// The mutually exclusive full-view display modes.
///
/// At most one layer is visible at a time on the consumer; "none visible"
/// is the blackout/clear state.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Initiative,
    Media,
    Whiteboard,
    InfoCard,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::Initiative => write!(f, "initiative"),
            Layer::Media => write!(f, "media"),
            Layer::Whiteboard => write!(f, "whiteboard"),
            Layer::InfoCard => write!(f, "info-card"),
        }
    }
}

// ---------------------------------------------------------------------------
// Portrait media kind
// ---------------------------------------------------------------------------

/// How a `portrait_path` should be presented, inferred from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortraitKind {
    Image,
    /// Rendered looping and muted.
    Video,
}

impl PortraitKind {
    /// `.mp4` / `.webm` (case-insensitive) are videos, everything else is an
    /// image.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".mp4") || lower.ends_with(".webm") {
            PortraitKind::Video
        } else {
            PortraitKind::Image
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// Origin every relative media path is resolved against, so paths like
    /// `/static/x.png` work regardless of where the display is served from.
    pub origin: Url,
    /// Command poll cadence.
    pub poll_interval: Duration,
    /// Ceiling on the embedded-player readiness wait; after this the load
    /// attempt proceeds and silently no-ops if the player is still not up.
    pub player_ready_timeout: Duration,
    /// Readiness re-check cadence during the bounded wait.
    pub player_ready_probe: Duration,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            origin: Url::parse("http://localhost:5000").expect("static origin"),
            poll_interval: Duration::from_secs(1),
            player_ready_timeout: Duration::from_millis(2500),
            player_ready_probe: Duration::from_millis(50),
        }
    }
}

impl ScreenConfig {
    /// Resolve a possibly-relative media URL against the configured origin.
    ///
    /// Returns `None` for empty input or input that cannot form a URL;
    /// callers treat that as a no-op guard rather than an error.
    pub fn absolute_url(&self, raw: &str) -> Option<String> {
        if raw.is_empty() {
            return None;
        }
        self.origin.join(raw).ok().map(|u| u.to_string())
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenStats {
    pub commands_executed: u64,
    pub polls: u64,
    pub whiteboard_syncs: u64,
    pub last_timestamp: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
