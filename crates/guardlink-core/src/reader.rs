// ── State reader ──
//
// Issues a configured read request, runs the response body through the
// mapper pipeline, and parses the result with the lenient wire parser.
// Holds no cache: change detection against the previous value belongs to
// the caller.

use std::sync::Arc;

use guardlink_api::HttpClient;
use tracing::{debug, warn};

use crate::endpoint::EndpointConfig;
use crate::error::CoreError;
use crate::mapper::MapperPipeline;
use crate::state::parse_state_code;

/// Result of one read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// No endpoint configured for this channel -- change nothing.
    /// A sentinel, deliberately distinct from both errors and values.
    Skipped,
    /// The mapped response did not reduce to an integer. Callers must
    /// treat this as invalid-state, never propagate it to the hub.
    Invalid,
    /// A state code as spoken by the remote endpoint.
    Code(i64),
}

impl ReadOutcome {
    /// The state code, if this outcome carries one.
    pub fn code(self) -> Option<i64> {
        match self {
            Self::Code(code) => Some(code),
            Self::Skipped | Self::Invalid => None,
        }
    }
}

/// Reads remote state through the mapper pipeline.
pub struct StateReader {
    client: Arc<HttpClient>,
    pipeline: MapperPipeline,
}

impl StateReader {
    pub fn new(client: Arc<HttpClient>, pipeline: MapperPipeline) -> Self {
        Self { client, pipeline }
    }

    /// Read one state channel.
    ///
    /// Transport errors are logged and surfaced; an unparseable body is
    /// [`ReadOutcome::Invalid`], not an error.
    pub async fn read(&self, endpoint: Option<&EndpointConfig>) -> Result<ReadOutcome, CoreError> {
        let Some((endpoint, url)) = endpoint.and_then(|e| e.url.as_ref().map(|u| (e, u))) else {
            debug!("read skipped: no endpoint configured");
            return Ok(ReadOutcome::Skipped);
        };

        let response = self
            .client
            .execute(url, &endpoint.body, &endpoint.headers)
            .await
            .inspect_err(|e| warn!(%url, error = %e, "state read failed"))?;

        let mapped = self.pipeline.apply(&response.body)?;

        match parse_state_code(&mapped) {
            Some(code) => {
                debug!(code, status = response.status, "state read");
                Ok(ReadOutcome::Code(code))
            }
            None => {
                warn!(
                    mapped = %mapped,
                    status = response.status,
                    "response did not reduce to a state code"
                );
                Ok(ReadOutcome::Invalid)
            }
        }
    }
}
