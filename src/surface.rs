//! Host-capability traits: the seams between the sync core and whatever
//! actually renders.
//!
//! The core never touches a real canvas, video element, or embedded player.
//! Embedders implement these three traits; the crate's [`crate::headless`]
//! module provides recording implementations used by the binary and the
//! test suite.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures surfaced by a host capability.
///
/// Every call site in the core treats these as best-effort: they are either
/// recovered locally (autoplay retry) or logged and swallowed. Nothing here
/// is fatal to the poll loop.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The environment refused to start playback (autoplay policy).
    #[error("playback blocked by host policy")]
    PlaybackBlocked,
    /// The embedded player has not finished initializing.
    #[error("embedded player not ready")]
    PlayerNotReady,
    /// The snapshot could not be applied to the drawing surface.
    #[error("invalid drawing state: {0}")]
    InvalidState(String),
}

// ---------------------------------------------------------------------------
// HTML5-style video output
// ---------------------------------------------------------------------------

/// A single reusable video output slot (the `<video>` element equivalent).
pub trait VideoOutput {
    /// Point the output at a new source and begin loading it.
    fn load(&mut self, url: &str);

    /// Attempt playback. `muted` selects the audio policy for the attempt;
    /// an `Err(PlaybackBlocked)` is the host refusing unmuted autoplay.
    fn play(&mut self, muted: bool) -> Result<(), SurfaceError>;

    fn pause(&mut self);

    /// Clear the source and force a reload so the element releases the
    /// stream. Idempotent.
    fn detach(&mut self);

    fn is_paused(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Embedded player (YouTube-style)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    Playing,
    Paused,
    /// Nothing loaded yet.
    #[default]
    Idle,
}

/// A single persistent externally-initialized player instance.
///
/// The instance is created once by the host and never recreated; before its
/// initialization completes every operation returns
/// [`SurfaceError::PlayerNotReady`].
pub trait EmbeddedPlayer {
    fn is_ready(&self) -> bool;

    fn load_video(&mut self, video_id: &str) -> Result<(), SurfaceError>;

    fn set_muted(&mut self, muted: bool) -> Result<(), SurfaceError>;

    fn play(&mut self) -> Result<(), SurfaceError>;

    fn pause(&mut self) -> Result<(), SurfaceError>;

    fn playback_state(&self) -> Result<PlaybackState, SurfaceError>;
}

// ---------------------------------------------------------------------------
// Drawing surface
// ---------------------------------------------------------------------------

/// A 2D vector drawing surface holding an ordered object list plus a
/// background color, serializable to and from an opaque JSON document.
pub trait DrawingSurface {
    /// Replace the surface contents with a previously serialized state.
    fn load_state(&mut self, state: &serde_json::Value) -> Result<(), SurfaceError>;

    /// Current object list, in z-order. Includes synthetic overlay objects;
    /// persistence-side filtering is the caller's job.
    fn objects(&self) -> Vec<serde_json::Value>;

    /// Background color of the surface.
    fn background(&self) -> String;

    /// Mark every object selectable/evented or not. The consumer surface is
    /// forced non-interactive after every load.
    fn set_interactive(&mut self, interactive: bool);

    /// Remove every object and reset the background.
    fn clear(&mut self, background: &str);

    /// Append objects (used for regenerating the grid overlay).
    fn add_objects(&mut self, objects: Vec<serde_json::Value>);
}
