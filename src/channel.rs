//! Command channel client – the consumer's polling loop.
//!
//! ## Tick contract
//!
//! | Poll result                          | Effect                                   |
//! |--------------------------------------|------------------------------------------|
//! | timestamp = last seen, whiteboard    | refresh snapshot only (no reset)         |
//! | timestamp = last seen, other kind    | no-op                                    |
//! | timestamp differs (incl. first poll) | dispatch; whiteboard also syncs once     |
//! | fetch/parse failure                  | warn, skip tick, retry next tick         |
//!
//! Ticks are scheduled independently rather than chained: each one runs as
//! its own task, so a slow or failed request delays only that tick's
//! processing and at most one extra request may briefly be in flight.
//!
//! The poll loop is the only liveness guarantee: no tick outcome, including
//! a failed one, may stop subsequent ticks. There is no backoff: the
//! channel is low-stakes UI sync, not a guaranteed-delivery transport.

use crate::backend::{Backend, BackendError};
use crate::screen::{ContentAction, ScreenService};
use crate::surface::{DrawingSurface, EmbeddedPlayer, VideoOutput};
use crate::types::ScreenStats;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// ScreenAgent
// ---------------------------------------------------------------------------

/// Dedup state shared by concurrently running tick tasks.
#[derive(Default)]
struct PollState {
    last_timestamp: String,
    polls: u64,
}

/// Wraps a [`ScreenService`] and drives it from backend polls.
///
/// The last-seen timestamp lives here, on an explicit session object, so
/// independent agents (and tests) never share dedup state.
pub struct ScreenAgent<B, V, P, D> {
    backend: Arc<B>,
    service: Arc<Mutex<ScreenService<V, P, D>>>,
    state: Mutex<PollState>,
}

impl<B, V, P, D> ScreenAgent<B, V, P, D>
where
    B: Backend,
    V: VideoOutput,
    P: EmbeddedPlayer,
    D: DrawingSurface,
{
    pub fn new(backend: Arc<B>, service: Arc<Mutex<ScreenService<V, P, D>>>) -> Self {
        Self {
            backend,
            service,
            state: Mutex::new(PollState::default()),
        }
    }

    /// Run until the task is cancelled or SIGINT arrives.
    ///
    /// Every timer tick spawns its own poll task; the timer itself never
    /// waits on a request.
    pub async fn run(self) -> anyhow::Result<()>
    where
        B: 'static,
        V: Send + 'static,
        P: Send + 'static,
        D: Send + 'static,
    {
        let interval = self.service.lock().config().poll_interval;
        info!("screen agent polling every {:?}", interval);

        let agent = Arc::new(self);
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let agent = agent.clone();
                    tokio::spawn(async move {
                        if let Err(e) = agent.poll_once().await {
                            warn!("command poll failed: {}", e);
                        }
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("screen agent shutting down (SIGINT)");
                    return Ok(());
                }
            }
        }
    }

    /// One poll tick: fetch, dedup by timestamp, dispatch, follow up.
    pub async fn poll_once(&self) -> Result<(), BackendError> {
        self.state.lock().polls += 1;
        let cmd = self.backend.fetch_command().await?;

        // Same logical command as last tick. The whiteboard layer still
        // tracks live edits while mounted; everything else is a no-op.
        let repeat = {
            let mut state = self.state.lock();
            if !cmd.timestamp.is_empty() && cmd.timestamp == state.last_timestamp {
                true
            } else {
                if !cmd.timestamp.is_empty() {
                    state.last_timestamp = cmd.timestamp.clone();
                }
                false
            }
        };

        if repeat {
            if cmd.is_whiteboard() {
                self.refresh_whiteboard().await;
            }
            return Ok(());
        }

        let action = self.service.lock().execute(&cmd);
        if let Some(action) = action {
            self.perform(action).await;
        }
        Ok(())
    }

    async fn perform(&self, action: ContentAction) {
        match action {
            ContentAction::FetchInitiative => match self.backend.fetch_characters().await {
                Ok(roster) => self.service.lock().render_initiative(&roster),
                Err(e) => warn!("character fetch failed: {}", e),
            },
            ContentAction::SyncWhiteboard => self.refresh_whiteboard().await,
            ContentAction::LoadEmbedded { video_id, muted } => {
                self.wait_for_player().await;
                self.service.lock().load_embedded(&video_id, muted);
            }
        }
    }

    /// Pull the latest snapshot and hand it to the service. An absent
    /// snapshot means nothing has been drawn yet; the surface stays as-is.
    async fn refresh_whiteboard(&self) {
        match self.backend.fetch_whiteboard().await {
            Ok(board) => {
                if let Some(state) = board.state {
                    self.service.lock().sync_whiteboard(&state);
                }
            }
            Err(e) => warn!("whiteboard fetch failed: {}", e),
        }
    }

    /// Bounded wait for embedded-player readiness. After the ceiling the
    /// load attempt proceeds anyway and no-ops if the player is still down.
    async fn wait_for_player(&self) {
        let (timeout, probe) = {
            let svc = self.service.lock();
            let cfg = svc.config();
            (cfg.player_ready_timeout, cfg.player_ready_probe)
        };
        let deadline = Instant::now() + timeout;

        loop {
            if self.service.lock().player().is_ready() {
                return;
            }
            if Instant::now() >= deadline {
                return;
            }
            tokio::time::sleep(probe).await;
        }
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> ScreenStats {
        let svc = self.service.lock();
        let state = self.state.lock();
        ScreenStats {
            commands_executed: svc.commands_executed(),
            polls: state.polls,
            whiteboard_syncs: svc.whiteboard_syncs(),
            last_timestamp: state.last_timestamp.clone(),
        }
    }

    pub fn last_timestamp(&self) -> String {
        self.state.lock().last_timestamp.clone()
    }

    pub fn service(&self) -> Arc<Mutex<ScreenService<V, P, D>>> {
        self.service.clone()
    }
}
