// ── Core error types ──
//
// Errors surfaced to the façade and its callers. Transport failures from
// guardlink-api are wrapped rather than re-exposed raw; mapper and
// configuration problems get their own variants. None of these are fatal
// to the process -- the poller's never-stop-on-error policy is the
// system's core resilience guarantee.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// HTTP transport failure (connection refused, DNS, timeout).
    /// Surfaced to the immediate caller and logged; never retried.
    #[error("HTTP request failed: {0}")]
    Http(#[from] guardlink_api::Error),

    /// A mapper could not process its input (malformed markup document).
    #[error("Mapper error: {message}")]
    Mapper { message: String },

    /// Invalid configuration (bad regex pattern, bad method, bad URL).
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` for transient transport failures worth noting as
    /// such in diagnostics (the core itself never retries).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_transient())
    }
}
