// ── Runtime accessory configuration ──
//
// These types describe *how* the bridge behaves at runtime. They carry
// credential data and tuning, but never touch disk -- the config crate
// (or an embedding host) constructs an `AccessoryConfig` and hands it in.

use std::time::Duration;

use guardlink_api::{BasicAuth, TransportConfig};

use crate::endpoint::ActionUrls;
use crate::mapper::MapperSpec;

/// Polling behavior for the two read channels.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// When disabled, no poller task is created at all.
    pub enabled: bool,
    /// Delay between a completed fetch and the next one.
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_millis(30_000),
        }
    }
}

/// Configuration for one security-system accessory.
#[derive(Debug, Clone)]
pub struct AccessoryConfig {
    /// Display name, used only for logging and identify.
    pub name: String,
    /// The action table (write endpoints + read channels).
    pub urls: ActionUrls,
    /// HTTP method used for ALL outbound requests.
    pub http_method: String,
    /// Basic-auth credentials, applied when the username is non-empty.
    pub auth: Option<BasicAuth>,
    /// Log every intermediate mapper step.
    pub debug: bool,
    /// Out-of-band drift detection.
    pub polling: PollerConfig,
    /// Ordered response-mapper chain.
    pub mappers: Vec<MapperSpec>,
    /// TLS and timeout settings shared by all requests.
    pub transport: TransportConfig,
}

impl Default for AccessoryConfig {
    fn default() -> Self {
        Self {
            name: "Security System".into(),
            urls: ActionUrls::default(),
            http_method: "GET".into(),
            auth: None,
            debug: false,
            polling: PollerConfig::default(),
            mappers: Vec::new(),
            transport: TransportConfig::default(),
        }
    }
}
