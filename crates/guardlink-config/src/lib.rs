//! Configuration loading for the GuardLink bridge.
//!
//! A TOML file merged with `GUARDLINK_`-prefixed environment variables,
//! deserialized into a raw shape that tolerates shorthand (a bare URL
//! string anywhere a full endpoint table is allowed, one endpoint where
//! a list is allowed), then validated into
//! [`guardlink_core::AccessoryConfig`]. All URL parsing happens here so
//! a typo fails at startup with the offending field named.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use guardlink_api::{BasicAuth, TlsMode, TransportConfig};
use guardlink_core::{AccessoryConfig, ActionUrls, EndpointConfig, MapperSpec, PollerConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Raw TOML shapes ─────────────────────────────────────────────────

/// An endpoint as written in the file: either a bare URL string or a
/// table with an optional body and headers. An empty URL string means
/// "not configured" and is accepted without complaint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawEndpoint {
    Bare(String),
    Full {
        url: String,
        #[serde(default)]
        body: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
}

/// One endpoint or a list of them; write actions fan out over a list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(RawEndpoint),
    Many(Vec<RawEndpoint>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl OneOrMany {
    fn into_vec(self) -> Vec<RawEndpoint> {
        match self {
            Self::One(e) => vec![e],
            Self::Many(v) => v,
        }
    }
}

/// The `[urls]` table: write endpoints per target state plus the two
/// read channels.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawUrls {
    #[serde(default)]
    pub stay: OneOrMany,
    #[serde(default)]
    pub away: OneOrMany,
    #[serde(default)]
    pub night: OneOrMany,
    #[serde(default)]
    pub disarm: OneOrMany,
    pub read_current_state: Option<RawEndpoint>,
    pub read_target_state: Option<RawEndpoint>,
}

/// Top-level configuration file shape.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct RawConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub urls: RawUrls,

    /// Method for every outbound request.
    #[serde(default = "default_method")]
    pub http_method: String,

    /// Basic-auth credentials; an empty username disables auth.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,

    /// Send the Authorization header on the first attempt rather than
    /// waiting for a 401 challenge.
    #[serde(default = "default_true")]
    pub immediately: bool,

    /// Log each mapper step at debug level.
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub polling: bool,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Accept self-signed certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,

    /// Ordered response-mapper chain, tagged by `type`.
    #[serde(default)]
    pub mappers: Vec<MapperSpec>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            urls: RawUrls::default(),
            http_method: default_method(),
            username: String::new(),
            password: String::new(),
            immediately: true,
            debug: false,
            polling: false,
            poll_interval_ms: default_poll_interval(),
            timeout_ms: default_timeout(),
            insecure: false,
            ca_cert: None,
            mappers: Vec::new(),
        }
    }
}

fn default_name() -> String {
    "Security System".into()
}
fn default_method() -> String {
    "GET".into()
}
fn default_true() -> bool {
    true
}
fn default_poll_interval() -> u64 {
    30_000
}
fn default_timeout() -> u64 {
    30_000
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load configuration from a TOML file plus the environment.
///
/// Environment variables are prefixed `GUARDLINK_` and use `__` for
/// nesting (`GUARDLINK_POLL_INTERVAL_MS`, `GUARDLINK_URLS__DISARM`).
pub fn load_file(path: &Path) -> Result<AccessoryConfig, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(RawConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GUARDLINK_").split("__"));
    let raw: RawConfig = figment.extract()?;
    raw.validate()
}

/// Load configuration from an in-memory TOML string. No environment
/// merge; intended for embedding hosts and tests.
pub fn load_str(toml: &str) -> Result<AccessoryConfig, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(RawConfig::default()))
        .merge(Toml::string(toml));
    let raw: RawConfig = figment.extract()?;
    raw.validate()
}

// ── Validation ──────────────────────────────────────────────────────

impl RawConfig {
    /// Validate and convert into the core's runtime configuration.
    pub fn validate(self) -> Result<AccessoryConfig, ConfigError> {
        let urls = ActionUrls {
            stay: convert_many(self.urls.stay, "urls.stay")?,
            away: convert_many(self.urls.away, "urls.away")?,
            night: convert_many(self.urls.night, "urls.night")?,
            disarm: convert_many(self.urls.disarm, "urls.disarm")?,
            read_current_state: convert_read(self.urls.read_current_state, "urls.read_current_state")?,
            read_target_state: convert_read(self.urls.read_target_state, "urls.read_target_state")?,
        };

        let auth = if self.username.is_empty() {
            None
        } else {
            Some(BasicAuth {
                username: self.username,
                password: SecretString::from(self.password),
                preemptive: self.immediately,
            })
        };

        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path)
        } else {
            TlsMode::System
        };

        Ok(AccessoryConfig {
            name: self.name,
            urls,
            http_method: self.http_method,
            auth,
            debug: self.debug,
            polling: PollerConfig {
                enabled: self.polling,
                interval: Duration::from_millis(self.poll_interval_ms),
            },
            mappers: self.mappers,
            transport: TransportConfig {
                tls,
                timeout: Duration::from_millis(self.timeout_ms),
            },
        })
    }
}

fn convert_endpoint(raw: RawEndpoint, field: &str) -> Result<EndpointConfig, ConfigError> {
    let (url, body, headers) = match raw {
        RawEndpoint::Bare(url) => (url, String::new(), HashMap::new()),
        RawEndpoint::Full { url, body, headers } => (url, body, headers),
    };

    // Empty URL string: the action stays a configured no-op.
    let url = if url.is_empty() {
        None
    } else {
        let parsed = url.parse::<Url>().map_err(|e| ConfigError::Validation {
            field: field.to_owned(),
            reason: format!("invalid URL {url:?}: {e}"),
        })?;
        Some(parsed)
    };

    Ok(EndpointConfig { url, body, headers })
}

fn convert_many(raw: OneOrMany, field: &str) -> Result<Vec<EndpointConfig>, ConfigError> {
    raw.into_vec()
        .into_iter()
        .map(|e| convert_endpoint(e, field))
        .collect()
}

fn convert_read(
    raw: Option<RawEndpoint>,
    field: &str,
) -> Result<Option<EndpointConfig>, ConfigError> {
    raw.map(|e| convert_endpoint(e, field)).transpose()
}

// ── Tests ───────────────────────────────────────────────────────────
