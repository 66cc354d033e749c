//! Validated connection parameters for a Proxmox VE endpoint.

use url::Url;

use crate::core::domain::error::{PveError, PveResult};

/// Connection details for one Proxmox cluster endpoint.
///
/// Construction validates the host and derives the base URL; afterwards
/// the value is immutable and freely shareable across tasks.
#[derive(Debug, Clone)]
pub struct Connection {
    host: String,
    port: u16,
    username: String,
    password: String,
    realm: String,
    secure: bool,
    accept_invalid_certs: bool,
    url: Url,
}

impl Connection {
    /// Creates a validated connection description.
    ///
    /// # Errors
    /// Returns `PveError::Connection` if the host is empty or the derived
    /// base URL is not parseable.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        realm: impl Into<String>,
        secure: bool,
        accept_invalid_certs: bool,
    ) -> PveResult<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(PveError::Connection("Host cannot be empty".to_string()));
        }
        let scheme = if secure { "https" } else { "http" };
        let url = Url::parse(&format!("{}://{}:{}/", scheme, host, port))
            .map_err(|e| PveError::Connection(format!("Invalid endpoint URL: {}", e)))?;

        Ok(Self {
            host,
            port,
            username: username.into(),
            password: password.into(),
            realm: realm.into(),
            secure,
            accept_invalid_certs,
            url,
        })
    }

    /// The base URL of the endpoint (scheme, host and port).
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Whether self-signed certificates are accepted.
    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }
}
