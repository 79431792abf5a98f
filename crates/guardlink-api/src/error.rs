use thiserror::Error;

/// Top-level error type for the `guardlink-api` crate.
///
/// Covers transport and request-construction failures only. A response
/// with a non-2xx status is NOT an error at this layer -- the status code
/// is surfaced through [`HttpResponse`](crate::HttpResponse) and left to
/// the caller to interpret.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Request construction ────────────────────────────────────────
    /// The configured HTTP method is not a valid method token.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// A configured header name or value is not representable on the wire.
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

impl Error {
    /// Returns `true` if this is a transient transport failure
    /// (connect error or timeout) rather than a configuration problem.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
