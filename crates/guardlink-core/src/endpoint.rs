// ── Endpoint configuration ──
//
// One `EndpointConfig` per logical action. Write actions accept an
// ordered list for fan-out; read actions take at most one. An absent URL
// makes the corresponding action a silent no-op, never an error.

use std::collections::HashMap;

use url::Url;

use crate::state::TargetState;

/// A single configured HTTP action: where to send, what to send.
///
/// Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct EndpointConfig {
    /// Absent ⇒ the action is a no-op (no request, no error).
    pub url: Option<Url>,
    pub body: String,
    pub headers: HashMap<String, String>,
}

impl EndpointConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url: Some(url),
            body: String::new(),
            headers: HashMap::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

/// The fixed action table: write endpoints per target state, plus the
/// two read channels.
#[derive(Debug, Clone, Default)]
pub struct ActionUrls {
    pub stay: Vec<EndpointConfig>,
    pub away: Vec<EndpointConfig>,
    pub night: Vec<EndpointConfig>,
    pub disarm: Vec<EndpointConfig>,
    pub read_current_state: Option<EndpointConfig>,
    pub read_target_state: Option<EndpointConfig>,
}

impl ActionUrls {
    /// Resolve a target state to its configured write endpoints.
    /// The returned order is the configured order.
    pub fn write_endpoints(&self, target: TargetState) -> &[EndpointConfig] {
        match target {
            TargetState::StayArm => &self.stay,
            TargetState::AwayArm => &self.away,
            TargetState::NightArm => &self.night,
            TargetState::Disarm => &self.disarm,
        }
    }
}
