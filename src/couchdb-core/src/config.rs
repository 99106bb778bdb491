use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Authentication mode negotiated at client construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// Credentials are embedded into the authority of the base URL.
    #[default]
    Basic,
    /// A one-time `POST /_session` exchanges credentials for a cookie that
    /// is replayed on every subsequent request.
    Cookie,
}

/// Connection settings for a CouchDB client.
///
/// The configuration is fixed once the client is constructed; there is no
/// way to mutate it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub auth: AuthMethod,
    /// Extra default headers installed on the transport. A caller value for
    /// a key the client also sets (e.g. `Content-Type`) replaces the
    /// built-in default.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_port() -> u16 {
    5984
}

impl ClientConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            auth: AuthMethod::default(),
            headers: HashMap::new(),
        }
    }

    /// Selects the authentication mode.
    pub fn auth(mut self, auth: AuthMethod) -> Self {
        self.auth = auth;
        self
    }

    /// Adds an extra default header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
