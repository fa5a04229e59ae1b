//! Screen-command wire protocol.
//!
//! This module owns **every message that crosses the backend boundary**
//! between the producer (Master page), the backend, and the consumer
//! (Player display).
//!
//! ## Resources
//!
//! | Endpoint               | Direction          | Payload                      |
//! |------------------------|--------------------|------------------------------|
//! | `/api/screen/command`  | backend → consumer | `{type, timestamp, data}`    |
//! | `/api/whiteboard/load` | backend → consumer | `{state}`                    |
//! | `/api/whiteboard/save` | producer → backend | `{state}`                    |
//! | `/api/characters`      | backend → consumer | `{round_number, characters}` |
//!
//! ## Design rules
//!
//! 1. Every struct is `Serialize + Deserialize` with snake_case JSON
//!    (`isCurrent` is the one backend-dictated exception).
//! 2. The wire command is parsed permissively: a missing `type` means
//!    `initiative`, an unrecognized `type` becomes [`CommandKind::Unknown`]
//!    and renders as a cleared screen. A malformed `data` field never fails
//!    the whole command; renderers no-op on absent payload fields instead.
//! 3. Two commands with equal timestamps are the same logical command.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Wire frame
// ---------------------------------------------------------------------------

/// Raw command exactly as the backend serves it.
///
/// Kept separate from [`ScreenCommand`] so deserialization never rejects a
/// frame outright: shape problems are resolved field by field during
/// [`ScreenCommand::from_wire`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireCommand {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Parsed command
// ---------------------------------------------------------------------------

/// The unit of cross-client communication: the single most-recent
/// instruction telling the consumer what to display.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenCommand {
    pub kind: CommandKind,
    /// Opaque dedup token. Empty means the backend has not stamped the
    /// command; such commands are executed on every poll.
    pub timestamp: String,
}

/// Tagged union over every command kind the producer can issue.
///
/// Matched exhaustively by the dispatcher: adding a kind is a
/// compile-checked exercise, not a silent fallthrough.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    Initiative,
    Image(ImagePayload),
    Video(VideoPayload),
    YouTube(YouTubePayload),
    YouTubeControl,
    Whiteboard,
    InfoCard(InfoCardPayload),
    Blackout,
    Clear,
    /// Unrecognized tag, rendered identically to `Clear`.
    Unknown(String),
}

impl ScreenCommand {
    /// Parse a wire frame into a typed command.
    ///
    /// A missing `type` defaults to `initiative` (legacy backends send
    /// `{timestamp}` alone for the initial screen). A payload that fails to
    /// deserialize degrades to an all-`None` payload rather than an error.
    pub fn from_wire(wire: WireCommand) -> Self {
        let data = wire.data.unwrap_or(serde_json::Value::Null);
        let kind = match wire.kind.as_deref() {
            None | Some("initiative") => CommandKind::Initiative,
            Some("image") => CommandKind::Image(payload_or_default(data)),
            Some("video") => CommandKind::Video(payload_or_default(data)),
            Some("youtube") => CommandKind::YouTube(payload_or_default(data)),
            Some("youtube_control") => CommandKind::YouTubeControl,
            Some("whiteboard") => CommandKind::Whiteboard,
            Some("info_card") => CommandKind::InfoCard(payload_or_default(data)),
            Some("blackout") => CommandKind::Blackout,
            Some("clear") => CommandKind::Clear,
            Some(other) => CommandKind::Unknown(other.to_string()),
        };

        Self {
            kind,
            timestamp: wire.timestamp.unwrap_or_default(),
        }
    }

    /// True for commands whose layer keeps resyncing while mounted.
    pub fn is_whiteboard(&self) -> bool {
        self.kind == CommandKind::Whiteboard
    }
}

fn payload_or_default<T: Default + for<'de> Deserialize<'de>>(data: serde_json::Value) -> T {
    serde_json::from_value(data).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Command payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoPayload {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YouTubePayload {
    #[serde(default)]
    pub video_id: Option<String>,
    /// Absent means muted: unsolicited sound on a shared display is opt-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
}

impl YouTubePayload {
    pub fn muted_or_default(&self) -> bool {
        self.muted.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoCardPayload {
    #[serde(default)]
    pub title: Option<String>,
    /// Trusted, pre-sanitized HTML body, inserted verbatim.
    #[serde(default)]
    pub html: Option<String>,
}

// ---------------------------------------------------------------------------
// Initiative read model  (GET /api/characters)
// ---------------------------------------------------------------------------

/// Character list in turn order, as served by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitiativeRoster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_number: Option<i64>,
    #[serde(default)]
    pub characters: Vec<Character>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Character {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub initiative: Option<i64>,
    #[serde(default)]
    pub hp: Option<f64>,
    /// Absent max HP means the HP bar is omitted entirely, never rendered
    /// at a misleading default width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<f64>,
    #[serde(rename = "isCurrent", default)]
    pub is_current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Whiteboard resources
// ---------------------------------------------------------------------------

/// `GET /api/whiteboard/load` response. `state` is an opaque serialized
/// drawing-surface document; `None` means nothing has been drawn yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhiteboardState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
}

/// `POST /api/whiteboard/save` request body. The backend stores the state
/// string verbatim; it is never interpreted server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhiteboardSave {
    pub state: String,
}

// ---------------------------------------------------------------------------
// Endpoint helpers
// ---------------------------------------------------------------------------

/// All backend resource paths used by the screen protocol, as constants.
pub mod endpoints {
    pub const SCREEN_COMMAND: &str = "/api/screen/command";
    pub const WHITEBOARD_LOAD: &str = "/api/whiteboard/load";
    pub const WHITEBOARD_SAVE: &str = "/api/whiteboard/save";
    pub const CHARACTERS: &str = "/api/characters";
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ScreenCommand {
        let wire: WireCommand = serde_json::from_str(json).expect("wire frame");
        ScreenCommand::from_wire(wire)
    }

    // ---------------------------------------------------------------
    // Tag handling
    // ---------------------------------------------------------------

    #[test]
    fn missing_type_defaults_to_initiative() {
        let cmd = parse(r#"{"timestamp":"t1"}"#);
        assert_eq!(cmd.kind, CommandKind::Initiative);
        assert_eq!(cmd.timestamp, "t1");
    }

    #[test]
    fn unknown_type_is_preserved_not_rejected() {
        let cmd = parse(r#"{"type":"hologram","timestamp":"t2"}"#);
        assert_eq!(cmd.kind, CommandKind::Unknown("hologram".into()));
    }

    #[test]
    fn clear_without_data_or_timestamp() {
        let cmd = parse(r#"{"type":"clear"}"#);
        assert_eq!(cmd.kind, CommandKind::Clear);
        assert_eq!(cmd.timestamp, "");
    }

    // ---------------------------------------------------------------
    // Payload handling
    // ---------------------------------------------------------------

    #[test]
    fn image_payload_round_trip() {
        let cmd = parse(r#"{"type":"image","timestamp":"t3","data":{"url":"/static/x.png"}}"#);
        assert_eq!(
            cmd.kind,
            CommandKind::Image(ImagePayload {
                url: Some("/static/x.png".into())
            })
        );
    }

    #[test]
    fn malformed_payload_degrades_to_default() {
        let cmd = parse(r#"{"type":"video","timestamp":"t4","data":"oops"}"#);
        assert_eq!(cmd.kind, CommandKind::Video(VideoPayload::default()));
    }

    #[test]
    fn youtube_mute_defaults_to_true() {
        let cmd = parse(r#"{"type":"youtube","timestamp":"t5","data":{"video_id":"abc"}}"#);
        match cmd.kind {
            CommandKind::YouTube(p) => {
                assert_eq!(p.video_id.as_deref(), Some("abc"));
                assert!(p.muted_or_default());
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn youtube_explicit_unmute_is_honoured() {
        let cmd =
            parse(r#"{"type":"youtube","timestamp":"t6","data":{"video_id":"abc","muted":false}}"#);
        match cmd.kind {
            CommandKind::YouTube(p) => assert!(!p.muted_or_default()),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    // ---------------------------------------------------------------
    // Read models
    // ---------------------------------------------------------------

    #[test]
    fn character_is_current_uses_backend_casing() {
        let c: Character =
            serde_json::from_str(r#"{"name":"Orc","initiative":12,"isCurrent":true}"#).unwrap();
        assert!(c.is_current);
        assert_eq!(c.max_hp, None);
    }

    #[test]
    fn whiteboard_state_absent_is_none() {
        let s: WhiteboardState = serde_json::from_str("{}").unwrap();
        assert!(s.state.is_none());
    }
}
