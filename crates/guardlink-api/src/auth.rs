use secrecy::{ExposeSecret, SecretString};

/// Basic-auth credentials for outbound requests.
///
/// Applied to every request when configured. The `preemptive` flag
/// controls whether the `Authorization` header is attached to the first
/// attempt or only after a 401 challenge (default: preemptive).
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
    pub preemptive: bool,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            preemptive: true,
        }
    }

    /// Credentials count as configured only when the username is non-empty.
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty()
    }

    pub(crate) fn expose_password(&self) -> &str {
        self.password.expose_secret()
    }
}
