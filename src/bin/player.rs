//! screen-player binary
//!
//! Headless display consumer: polls a backend for screen commands and
//! mirrors the resulting display state through the recording surfaces.
//! Useful for smoke-testing a backend without a browser attached.
//!
//! ## Configuration (flags / env)
//!
//! | Key                         | Default                 | Description                  |
//! |-----------------------------|-------------------------|------------------------------|
//! | `SCREEN_ENDPOINT`           | `http://localhost:5000` | Backend base URL             |
//! | `SCREEN_POLL_INTERVAL_MS`   | `1000`                  | Command poll cadence         |
//! | `SCREEN_PLAYER_TIMEOUT_MS`  | `2500`                  | Embedded-player ready ceiling|

use anyhow::Result;
use clap::Parser;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tabletop_screen::backend::HttpBackend;
use tabletop_screen::channel::ScreenAgent;
use tabletop_screen::headless::{HeadlessCanvas, HeadlessPlayer, HeadlessVideo};
use tabletop_screen::screen::ScreenService;
use tabletop_screen::types::ScreenConfig;
use url::Url;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "screen-player", about = "Tabletop display consumer", version)]
struct Args {
    /// Backend base URL (also the origin relative media paths resolve against)
    #[arg(long, env = "SCREEN_ENDPOINT", default_value = "http://localhost:5000")]
    endpoint: String,

    /// Command poll cadence in milliseconds
    #[arg(long, env = "SCREEN_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Ceiling on the embedded-player readiness wait in milliseconds
    #[arg(long, env = "SCREEN_PLAYER_TIMEOUT_MS", default_value_t = 2500)]
    player_timeout_ms: u64,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tabletop_screen=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let origin = Url::parse(&args.endpoint)?;

    tracing::info!(
        "Starting screen-player (endpoint='{}', poll={}ms)",
        origin,
        args.poll_interval_ms,
    );

    let config = ScreenConfig {
        origin: origin.clone(),
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        player_ready_timeout: Duration::from_millis(args.player_timeout_ms),
        ..Default::default()
    };

    // Headless surfaces: the embedded player has no external API to wait
    // for, so it is ready from the start.
    let service = Arc::new(Mutex::new(ScreenService::new(
        config,
        HeadlessVideo::new(),
        HeadlessPlayer::ready_now(),
        HeadlessCanvas::new(),
    )));

    let backend = Arc::new(HttpBackend::new(origin));

    // Run until shutdown
    ScreenAgent::new(backend, service).run().await
}
