//! HTTP transport for best-move requests

use super::{BestMove, BestMoveRequest, BestMoveResponse, SearchClient, BEST_MOVE_PATH};
use crate::game::error::{GameError, GameResult};
use crate::game::mode::SearchDepth;
use async_trait::async_trait;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info};

/// Posts positions to the search service
///
/// Requests run on the given tokio runtime, so the returned futures can be
/// polled from any executor (the Bevy schedule polls them with
/// `futures_lite`).
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    http: reqwest::Client,
    endpoint: String,
    runtime: Handle,
}

impl HttpSearchClient {
    pub fn new(api_prefix: &str, timeout: Duration, runtime: Handle) -> GameResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GameError::remote(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint_url(api_prefix),
            runtime,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// `{api_prefix}/api/get_best_move`, tolerating a trailing slash on the prefix
pub fn endpoint_url(api_prefix: &str) -> String {
    format!("{}{}", api_prefix.trim_end_matches('/'), BEST_MOVE_PATH)
}

async fn fetch_best_move(
    http: reqwest::Client,
    endpoint: String,
    body: BestMoveRequest,
) -> GameResult<BestMove> {
    let response = http
        .post(&endpoint)
        .json(&body)
        .send()
        .await
        .map_err(|e| GameError::remote(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = if text.is_empty() {
            format!("server returned bad status {}", status.as_u16())
        } else {
            format!("server returned bad status {}: {}", status.as_u16(), text)
        };
        return Err(GameError::remote(message));
    }

    let reply: BestMoveResponse = response
        .json()
        .await
        .map_err(|e| GameError::remote(format!("malformed response: {e}")))?;
    debug!("[SEARCH] Reply {:?}", reply);
    BestMove::try_from(reply)
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn request_best_move(&self, fen: &str, depth: SearchDepth) -> GameResult<BestMove> {
        info!("[SEARCH] POST {} depth={} fen={}", self.endpoint, depth, fen);
        let task = self.runtime.spawn(fetch_best_move(
            self.http.clone(),
            self.endpoint.clone(),
            BestMoveRequest::new(fen, depth),
        ));
        task.await
            .map_err(|e| GameError::remote(format!("request task failed: {e}")))?
    }
}
