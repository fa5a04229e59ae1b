//! ScreenService – view dispatch, layer visibility, per-layer renderers.
//!
//! The service is pure state: it owns the layer visibility machine, the
//! media element mirrors, and the initiative view model, and it drives the
//! three host-capability traits. It performs no IO: [`execute`] returns a
//! [`ContentAction`] describing the async follow-up (fetch the roster, pull
//! the whiteboard snapshot, load the embedded player), which the polling
//! agent carries out. Same shape as a tick that returns events for its bus
//! agent to publish.
//!
//! [`execute`]: ScreenService::execute

use crate::protocol::{CommandKind, InfoCardPayload, InitiativeRoster, ScreenCommand};
use crate::surface::{DrawingSurface, EmbeddedPlayer, PlaybackState, VideoOutput};
use crate::types::{Layer, PortraitKind, ScreenConfig};
use crate::whiteboard;
use log::{debug, warn};

/// Shown in the active-turn region while no combat is running.
pub const WAITING_LABEL: &str = "Waiting for combat.";

/// Shown when the roster has characters but none is flagged current.
pub const NO_ACTIVE_LABEL: &str = "--";

const BLACK: &str = "black";

// ---------------------------------------------------------------------------
// Content actions
// ---------------------------------------------------------------------------

/// Async follow-up a command execution requires.
///
/// Produced by [`ScreenService::execute`], performed by the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentAction {
    /// Fetch `/api/characters` and feed it to `render_initiative`.
    FetchInitiative,
    /// Fetch the whiteboard snapshot and feed it to `sync_whiteboard`.
    SyncWhiteboard,
    /// Wait (bounded) for embedded-player readiness, then `load_embedded`.
    LoadEmbedded { video_id: String, muted: bool },
}

// ---------------------------------------------------------------------------
// Initiative view model
// ---------------------------------------------------------------------------

/// One rendered turn card.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnCard {
    pub name: String,
    pub initiative: Option<i64>,
    /// HP bar fill percentage, clamped at 0. `None` means the bar is
    /// omitted entirely (no `max_hp`).
    pub hp_percent: Option<f64>,
    pub is_defeated: bool,
    pub is_current: bool,
    /// Mini avatar path and inferred media kind.
    pub avatar: Option<(String, PortraitKind)>,
}

/// Large active-turn portrait region.
///
/// `video_path` is sticky across renders so an unchanged video portrait is
/// never reloaded (a reload restarts the loop and flickers).
#[derive(Debug, Clone, Default)]
pub struct PortraitSlot {
    pub image_src: Option<String>,
    pub video_src: Option<String>,
    pub video_path: Option<String>,
    pub video_loads: u64,
}

impl PortraitSlot {
    fn hide(&mut self) {
        self.image_src = None;
        self.video_src = None;
        self.video_path = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct InitiativeView {
    pub round: Option<i64>,
    pub cards: Vec<TurnCard>,
    pub active_name: String,
    /// Card index to scroll into view once layout settles.
    pub active_index: Option<usize>,
    pub portrait: PortraitSlot,
}

// ---------------------------------------------------------------------------
// ScreenService
// ---------------------------------------------------------------------------

pub struct ScreenService<V, P, D> {
    config: ScreenConfig,

    active_layer: Option<Layer>,
    background: String,

    // Media layer elements
    image_visible: bool,
    image_src: Option<String>,
    video_visible: bool,
    /// Last URL handed to the video output. Survives resets so a repeated
    /// command for the same source skips the reload.
    last_video_src: Option<String>,
    embedded_visible: bool,

    video: V,
    player: P,
    canvas: D,

    initiative: InitiativeView,
    info_card_html: Option<String>,

    commands_executed: u64,
    whiteboard_syncs: u64,
}

impl<V, P, D> ScreenService<V, P, D>
where
    V: VideoOutput,
    P: EmbeddedPlayer,
    D: DrawingSurface,
{
    pub fn new(config: ScreenConfig, video: V, player: P, canvas: D) -> Self {
        Self {
            config,
            active_layer: None,
            background: BLACK.to_string(),
            image_visible: false,
            image_src: None,
            video_visible: false,
            last_video_src: None,
            embedded_visible: false,
            video,
            player,
            canvas,
            initiative: InitiativeView::default(),
            info_card_html: None,
            commands_executed: 0,
            whiteboard_syncs: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Reset every layer, then activate exactly one (or none) for the
    /// command. Returns the async follow-up, if any.
    pub fn execute(&mut self, cmd: &ScreenCommand) -> Option<ContentAction> {
        // The reset below pauses the embedded player, so the play/pause
        // toggle must compare against the state the user actually saw.
        let was_playing = matches!(self.player.playback_state(), Ok(PlaybackState::Playing));

        self.hide_all();
        self.commands_executed += 1;

        match &cmd.kind {
            CommandKind::Initiative => {
                self.active_layer = Some(Layer::Initiative);
                Some(ContentAction::FetchInitiative)
            }
            CommandKind::Image(p) => {
                self.active_layer = Some(Layer::Media);
                self.show_image(p.url.as_deref());
                None
            }
            CommandKind::Video(p) => {
                self.active_layer = Some(Layer::Media);
                self.show_video(p.url.as_deref());
                None
            }
            CommandKind::YouTube(p) => {
                self.active_layer = Some(Layer::Media);
                self.embedded_visible = true;
                match p.video_id.as_deref() {
                    Some(id) if !id.is_empty() => Some(ContentAction::LoadEmbedded {
                        video_id: id.to_string(),
                        muted: p.muted_or_default(),
                    }),
                    _ => None,
                }
            }
            CommandKind::YouTubeControl => {
                self.active_layer = Some(Layer::Media);
                self.embedded_visible = true;
                // Playing before the reset: the reset's pause already took
                // effect and IS the toggle. Otherwise resume.
                if !was_playing {
                    self.toggle_embedded();
                }
                None
            }
            CommandKind::Whiteboard => {
                self.active_layer = Some(Layer::Whiteboard);
                Some(ContentAction::SyncWhiteboard)
            }
            CommandKind::InfoCard(p) => {
                self.active_layer = Some(Layer::InfoCard);
                self.show_info_card(p);
                None
            }
            CommandKind::Blackout => {
                self.background = BLACK.to_string();
                None
            }
            CommandKind::Clear | CommandKind::Unknown(_) => None,
        }
    }

    /// Hide every layer and reset media playback. Idempotent; runs before
    /// every command execution.
    pub fn hide_all(&mut self) {
        self.active_layer = None;

        // HTML5 video: pause, clear source, force reload, hide.
        self.video.pause();
        self.video.detach();
        self.video_visible = false;

        // Image: clear and hide.
        self.image_src = None;
        self.image_visible = false;

        // Embedded wrapper hidden; pause the player if it exists. A
        // not-yet-ready player refuses the pause; swallowed.
        self.embedded_visible = false;
        if let Err(e) = self.player.pause() {
            debug!("embedded pause skipped: {}", e);
        }

        // No flash of default background during transitions.
        self.background = BLACK.to_string();
    }

    // -----------------------------------------------------------------------
    // Media renderers
    // -----------------------------------------------------------------------

    fn show_image(&mut self, url: Option<&str>) {
        let Some(full) = url.and_then(|u| self.config.absolute_url(u)) else {
            return;
        };
        self.video_visible = false;
        self.embedded_visible = false;
        self.image_visible = true;
        self.image_src = Some(full);
    }

    fn show_video(&mut self, url: Option<&str>) {
        let Some(full) = url.and_then(|u| self.config.absolute_url(u)) else {
            return;
        };
        self.image_visible = false;
        self.embedded_visible = false;
        self.video_visible = true;

        // Same source already loaded: resume playback, never reload.
        if self.last_video_src.as_deref() == Some(full.as_str()) {
            if self.video.is_paused() {
                self.play_best_effort();
            }
            return;
        }

        self.video.pause();
        self.video.load(&full);
        self.last_video_src = Some(full);
        self.play_best_effort();
    }

    /// Unmuted autoplay first; on policy rejection retry muted; give up
    /// silently if that fails too.
    fn play_best_effort(&mut self) {
        if self.video.play(false).is_err() {
            if let Err(e) = self.video.play(true) {
                debug!("video autoplay blocked even muted: {}", e);
            }
        }
    }

    /// Load a video into the persistent embedded player and apply the mute
    /// flag. No-ops when the player never became ready.
    pub fn load_embedded(&mut self, video_id: &str, muted: bool) {
        if video_id.is_empty() {
            return;
        }
        if let Err(e) = self.player.load_video(video_id) {
            debug!("embedded load skipped: {}", e);
            return;
        }
        if let Err(e) = self.player.set_muted(muted) {
            debug!("embedded mute toggle skipped: {}", e);
        }
    }

    /// Playing → pause, anything else → play. Unready-player errors are
    /// swallowed.
    pub fn toggle_embedded(&mut self) {
        match self.player.playback_state() {
            Ok(PlaybackState::Playing) => {
                let _ = self.player.pause();
            }
            Ok(_) => {
                let _ = self.player.play();
            }
            Err(e) => debug!("embedded toggle skipped: {}", e),
        }
    }

    // -----------------------------------------------------------------------
    // Info card
    // -----------------------------------------------------------------------

    fn show_info_card(&mut self, payload: &InfoCardPayload) {
        let title = payload.title.as_deref().unwrap_or("Information");
        let body = payload.html.as_deref().unwrap_or("");
        // Title is escaped; the body is a trusted pre-sanitized payload.
        self.info_card_html = Some(format!("<h1>{}</h1>{}", escape_html(title), body));
    }

    // -----------------------------------------------------------------------
    // Initiative
    // -----------------------------------------------------------------------

    /// Rebuild the initiative view model from a fetched roster.
    pub fn render_initiative(&mut self, roster: &InitiativeRoster) {
        if roster.round_number.is_some() {
            self.initiative.round = roster.round_number;
        }
        self.initiative.cards.clear();
        self.initiative.active_index = None;

        if roster.characters.is_empty() {
            self.initiative.active_name = WAITING_LABEL.to_string();
            self.initiative.portrait.hide();
            return;
        }

        let mut found_active = false;
        for (index, ch) in roster.characters.iter().enumerate() {
            let hp_percent = match ch.max_hp {
                Some(max) if max > 0.0 => {
                    Some(((ch.hp.unwrap_or(0.0) / max) * 100.0).max(0.0))
                }
                _ => None,
            };

            self.initiative.cards.push(TurnCard {
                name: ch.name.clone().unwrap_or_default(),
                initiative: ch.initiative,
                hp_percent,
                is_defeated: ch.hp.map_or(false, |hp| hp <= 0.0),
                is_current: ch.is_current,
                avatar: ch
                    .portrait_path
                    .as_ref()
                    .map(|p| (p.clone(), PortraitKind::from_path(p))),
            });

            if ch.is_current && !found_active {
                found_active = true;
                self.initiative.active_name = ch.name.clone().unwrap_or_default();
                self.initiative.active_index = Some(index);

                let config = &self.config;
                let portrait = &mut self.initiative.portrait;
                match ch.portrait_path.as_deref() {
                    None => portrait.hide(),
                    Some(path) => match PortraitKind::from_path(path) {
                        PortraitKind::Video => {
                            portrait.image_src = None;
                            // Reload only when the path actually changed;
                            // a reload restarts the loop visibly.
                            if portrait.video_path.as_deref() != Some(path) {
                                portrait.video_src = config.absolute_url(path);
                                portrait.video_path = Some(path.to_string());
                                portrait.video_loads += 1;
                            }
                        }
                        PortraitKind::Image => {
                            portrait.video_src = None;
                            portrait.video_path = None;
                            portrait.image_src = config.absolute_url(path);
                        }
                    },
                }
            }
        }

        if !found_active {
            self.initiative.active_name = NO_ACTIVE_LABEL.to_string();
            self.initiative.portrait.hide();
        }
    }

    // -----------------------------------------------------------------------
    // Whiteboard
    // -----------------------------------------------------------------------

    /// Replace the read-only surface contents with a fetched snapshot.
    pub fn sync_whiteboard(&mut self, state: &serde_json::Value) {
        match whiteboard::apply_state(&mut self.canvas, state) {
            Ok(()) => self.whiteboard_syncs += 1,
            Err(e) => warn!("whiteboard state rejected: {}", e),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    pub fn active_layer(&self) -> Option<Layer> {
        self.active_layer
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    pub fn image_visible(&self) -> bool {
        self.image_visible
    }

    pub fn image_src(&self) -> Option<&str> {
        self.image_src.as_deref()
    }

    pub fn video_visible(&self) -> bool {
        self.video_visible
    }

    pub fn embedded_visible(&self) -> bool {
        self.embedded_visible
    }

    pub fn info_card_html(&self) -> Option<&str> {
        self.info_card_html.as_deref()
    }

    pub fn initiative(&self) -> &InitiativeView {
        &self.initiative
    }

    pub fn video(&self) -> &V {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut V {
        &mut self.video
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn canvas(&self) -> &D {
        &self.canvas
    }

    pub fn commands_executed(&self) -> u64 {
        self.commands_executed
    }

    pub fn whiteboard_syncs(&self) -> u64 {
        self.whiteboard_syncs
    }
}

// ---------------------------------------------------------------------------
// HTML escaping
// ---------------------------------------------------------------------------

/// Escape a string for insertion into HTML text content.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}
