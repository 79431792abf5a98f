// ── State writer ──
//
// Resolves a target state to its configured endpoint list, dispatches
// every request in parallel, and joins on all of them (N of N, not
// first-completion-wins). When more than one endpoint fails, the FIRST
// error in configured order is reported and the write resolves exactly
// once -- a deliberate, deterministic tightening of the original
// last-error-wins race.

use std::sync::Arc;

use futures_util::future::join_all;
use guardlink_api::HttpClient;
use tracing::{debug, info, warn};
use url::Url;

use crate::endpoint::{ActionUrls, EndpointConfig};
use crate::error::CoreError;
use crate::state::TargetState;

/// Result of one write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No endpoint configured for this target -- nothing dispatched.
    Skipped,
    /// Every dispatched endpoint responded without a transport error.
    Completed { responses: usize },
}

/// Dispatches write actions with fan-out and an all-of join barrier.
pub struct StateWriter {
    client: Arc<HttpClient>,
    urls: ActionUrls,
}

impl StateWriter {
    pub fn new(client: Arc<HttpClient>, urls: ActionUrls) -> Self {
        Self { client, urls }
    }

    /// Write a target state to every configured endpoint for it.
    ///
    /// All requests run concurrently with no ordering guarantees between
    /// them; the call returns only after every one has completed. The
    /// caller is expected to refresh current state afterwards regardless
    /// of the outcome.
    pub async fn write(&self, target: TargetState) -> Result<WriteOutcome, CoreError> {
        let endpoints: Vec<(&Url, &EndpointConfig)> = self
            .urls
            .write_endpoints(target)
            .iter()
            .filter_map(|e| e.url.as_ref().map(|url| (url, e)))
            .collect();

        if endpoints.is_empty() {
            debug!(%target, "write skipped: no endpoint configured");
            return Ok(WriteOutcome::Skipped);
        }

        info!(%target, endpoints = endpoints.len(), "dispatching state write");

        let requests = endpoints
            .iter()
            .map(|(url, endpoint)| self.client.execute(url, &endpoint.body, &endpoint.headers));

        // Join barrier: wait for N of N, whatever the completion order.
        let results = join_all(requests).await;

        let mut first_error = None;
        let mut responses = 0;
        for ((url, _), result) in endpoints.iter().zip(results) {
            match result {
                Ok(response) => {
                    debug!(%target, %url, status = response.status, "write endpoint completed");
                    responses += 1;
                }
                Err(e) => {
                    warn!(%target, %url, error = %e, "write endpoint failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(WriteOutcome::Completed { responses }),
        }
    }
}
