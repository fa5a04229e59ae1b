//! Recording implementations of the surface traits.
//!
//! These keep a plain state mirror instead of rendering: the `screen-player`
//! binary uses them to smoke-test a backend from a terminal, and the test
//! suite uses them as doubles. All fields are public for inspection.

use crate::surface::{DrawingSurface, EmbeddedPlayer, PlaybackState, SurfaceError, VideoOutput};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct HeadlessVideo {
    pub current_src: Option<String>,
    /// Number of `load` calls; lets tests assert the same-source path never
    /// reloads.
    pub loads: u64,
    pub plays: u64,
    pub paused: bool,
    pub muted: bool,
    /// When false, unmuted play attempts fail the way a browser autoplay
    /// policy would.
    pub allow_unmuted_autoplay: bool,
}

impl Default for HeadlessVideo {
    fn default() -> Self {
        Self {
            current_src: None,
            loads: 0,
            plays: 0,
            paused: true,
            muted: false,
            allow_unmuted_autoplay: true,
        }
    }
}

impl HeadlessVideo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VideoOutput for HeadlessVideo {
    fn load(&mut self, url: &str) {
        log::debug!("video: load {}", url);
        self.current_src = Some(url.to_string());
        self.loads += 1;
        self.paused = true;
    }

    fn play(&mut self, muted: bool) -> Result<(), SurfaceError> {
        if !muted && !self.allow_unmuted_autoplay {
            return Err(SurfaceError::PlaybackBlocked);
        }
        self.muted = muted;
        self.paused = false;
        self.plays += 1;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn detach(&mut self) {
        if self.current_src.take().is_some() {
            log::debug!("video: detached");
        }
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}

// ---------------------------------------------------------------------------
// Embedded player
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct HeadlessPlayer {
    pub ready: bool,
    pub loaded_id: Option<String>,
    pub loads: u64,
    pub muted: bool,
    pub state: PlaybackState,
}

impl HeadlessPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A player whose external initialization already completed.
    pub fn ready_now() -> Self {
        Self {
            ready: true,
            ..Self::default()
        }
    }

    /// Simulates the host's "API ready" callback firing.
    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    fn guard(&self) -> Result<(), SurfaceError> {
        if self.ready {
            Ok(())
        } else {
            Err(SurfaceError::PlayerNotReady)
        }
    }
}

impl EmbeddedPlayer for HeadlessPlayer {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn load_video(&mut self, video_id: &str) -> Result<(), SurfaceError> {
        self.guard()?;
        log::debug!("player: load {}", video_id);
        self.loaded_id = Some(video_id.to_string());
        self.loads += 1;
        self.state = PlaybackState::Playing;
        Ok(())
    }

    fn set_muted(&mut self, muted: bool) -> Result<(), SurfaceError> {
        self.guard()?;
        self.muted = muted;
        Ok(())
    }

    fn play(&mut self) -> Result<(), SurfaceError> {
        self.guard()?;
        if self.loaded_id.is_some() {
            self.state = PlaybackState::Playing;
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), SurfaceError> {
        self.guard()?;
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
        Ok(())
    }

    fn playback_state(&self) -> Result<PlaybackState, SurfaceError> {
        self.guard()?;
        Ok(self.state)
    }
}

// ---------------------------------------------------------------------------
// Drawing surface
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct HeadlessCanvas {
    pub objects: Vec<Value>,
    pub background: String,
    pub interactive: bool,
    /// Number of `load_state` calls.
    pub loads: u64,
}

impl Default for HeadlessCanvas {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            background: "white".to_string(),
            interactive: true,
            loads: 0,
        }
    }
}

impl HeadlessCanvas {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DrawingSurface for HeadlessCanvas {
    fn load_state(&mut self, state: &Value) -> Result<(), SurfaceError> {
        let doc = state
            .as_object()
            .ok_or_else(|| SurfaceError::InvalidState("state is not an object".into()))?;

        let objects = doc
            .get("objects")
            .and_then(Value::as_array)
            .ok_or_else(|| SurfaceError::InvalidState("missing objects array".into()))?;

        self.objects = objects.clone();
        if let Some(bg) = doc.get("background").and_then(Value::as_str) {
            self.background = bg.to_string();
        }
        self.loads += 1;
        Ok(())
    }

    fn objects(&self) -> Vec<Value> {
        self.objects.clone()
    }

    fn background(&self) -> String {
        self.background.clone()
    }

    fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
        for obj in &mut self.objects {
            if let Some(map) = obj.as_object_mut() {
                map.insert("selectable".into(), Value::Bool(interactive));
                map.insert("evented".into(), Value::Bool(interactive));
            }
        }
    }

    fn clear(&mut self, background: &str) {
        self.objects.clear();
        self.background = background.to_string();
    }

    fn add_objects(&mut self, objects: Vec<Value>) {
        self.objects.extend(objects);
    }
}
