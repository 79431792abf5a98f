// guardlink-api: HTTP transport adapter for the GuardLink bridge

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;

pub use auth::BasicAuth;
pub use client::{HttpClient, HttpResponse};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
