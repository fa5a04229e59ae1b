//! Tabletop Screen Sync
//!
//! Command-driven display synchronization for a shared TTRPG session
//! display: a producer issues projection commands and whiteboard snapshots
//! through a backend, and this crate's consumer polls the backend and keeps
//! exactly one display layer visible.
//!
//! ## Architecture
//!
//! ```text
//! ScreenAgent  (channel.rs)  ← poll loop, timestamp dedup
//!   └── ScreenService  (screen.rs)  ← layer dispatch, renderers
//!         ├── VideoOutput / EmbeddedPlayer / DrawingSurface  (surface.rs)
//!         └── whiteboard bridge  (whiteboard.rs)
//! ```
//!
//! `ScreenService` is pure state over three host-capability traits;
//! `ScreenAgent` performs all IO through a [`backend::Backend`]. The
//! [`headless`] implementations back the `screen-player` binary and the
//! test suite.

// Protocol and display types are always available (no client feature needed).
pub mod headless;
pub mod protocol;
pub mod screen;
pub mod surface;
pub mod types;
pub mod whiteboard;

// IO-bearing modules require the `client` feature.
#[cfg(feature = "client")]
pub mod backend;
#[cfg(feature = "client")]
pub mod channel;

// Convenience re-exports
pub use protocol::{CommandKind, ScreenCommand};
pub use screen::{ContentAction, ScreenService};
pub use types::{Layer, ScreenConfig, ScreenStats};
pub use whiteboard::{SnapshotDocument, WhiteboardPublisher};

#[cfg(feature = "client")]
pub use backend::{Backend, HttpBackend};
#[cfg(feature = "client")]
pub use channel::ScreenAgent;
