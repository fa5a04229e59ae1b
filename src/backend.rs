//! Backend access – the polled resources behind the display.
//!
//! The backend is the single source of truth for the current command, the
//! whiteboard snapshot, and the character roster; both front-ends talk to it
//! and never to each other. [`Backend`] is the seam the agent polls through;
//! [`HttpBackend`] is the real implementation, tests script their own.

use crate::protocol::{
    endpoints, InitiativeRoster, ScreenCommand, WhiteboardSave, WhiteboardState, WireCommand,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL};
use thiserror::Error;
use url::Url;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failed backend exchange. Always transient from the agent's point of
/// view: logged, tick skipped, retried on the next natural tick.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("malformed response body: {0}")]
    Body(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Read (and for the whiteboard, write) access to the backend resources.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Current command. Polled every tick, cache-busted.
    async fn fetch_command(&self) -> Result<ScreenCommand, BackendError>;

    /// Latest whiteboard snapshot.
    async fn fetch_whiteboard(&self) -> Result<WhiteboardState, BackendError>;

    /// Character roster in turn order.
    async fn fetch_characters(&self) -> Result<InitiativeRoster, BackendError>;

    /// Persist a producer-side snapshot. Best-effort; callers may ignore
    /// the result.
    async fn save_whiteboard(&self, state: &str) -> Result<(), BackendError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base: Url) -> Self {
        // Every poll must see the backend's latest write, never a cache.
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_default();

        Self { client, base }
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base.join(path)?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_command(&self) -> Result<ScreenCommand, BackendError> {
        let url = self.endpoint(endpoints::SCREEN_COMMAND)?;
        let wire: WireCommand = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(ScreenCommand::from_wire(wire))
    }

    async fn fetch_whiteboard(&self) -> Result<WhiteboardState, BackendError> {
        let url = self.endpoint(endpoints::WHITEBOARD_LOAD)?;
        Ok(self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn fetch_characters(&self) -> Result<InitiativeRoster, BackendError> {
        let url = self.endpoint(endpoints::CHARACTERS)?;
        Ok(self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn save_whiteboard(&self, state: &str) -> Result<(), BackendError> {
        let url = self.endpoint(endpoints::WHITEBOARD_SAVE)?;
        self.client
            .post(url)
            .json(&WhiteboardSave {
                state: state.to_string(),
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
