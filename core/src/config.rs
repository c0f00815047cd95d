//! Connection settings for `BlogClient`.

use std::fmt;

use serde::Deserialize;

/// Endpoint and credentials. The credentials are opaque and forwarded
/// verbatim on every authenticated call.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
}

impl ClientConfig {
    pub fn new(endpoint: &str, username: &str, password: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
