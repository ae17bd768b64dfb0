//! SMTP server configuration.

use crate::error::{Error, Result};
use mailform_mime::{Address, parse_address};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Security/encryption mode for connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Security {
    /// No encryption (not recommended).
    None,
    /// Implicit TLS (connect directly with TLS).
    Tls,
    /// STARTTLS upgrade after plaintext connect.
    #[default]
    StartTls,
}

impl Security {
    /// Get default port for the security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 25,
            Self::StartTls => 587,
            Self::Tls => 465,
        }
    }
}

/// Login for AUTH PLAIN.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// SMTP server to deliver through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpServer {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Login, if the server requires authentication.
    pub credentials: Option<Credentials>,
    /// Envelope sender used when a message has no `From` address.
    pub from: Address,
}

impl SmtpServer {
    /// Creates a server using the default port for `security`.
    #[must_use]
    pub fn new(host: impl Into<String>, security: Security, from: Address) -> Self {
        Self {
            host: host.into(),
            port: security.default_port(),
            security,
            credentials: None,
            from,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the login.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// The simplest possible server: `localhost:25`, no TLS, no login.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if `from` is not a valid address.
    pub fn localhost(from: &str) -> Result<Self> {
        Ok(Self::new("localhost", Security::None, address(from)?))
    }

    /// Gmail submission: `smtp.gmail.com:587` with STARTTLS and PLAIN login.
    ///
    /// `from` may differ from `login` but must be a verified sender for the
    /// account; if empty, `login` is used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if `login` or `from` is not a valid
    /// address.
    pub fn gmail(from: &str, login: &str, password: &str) -> Result<Self> {
        address(login)?;
        let from = if from.trim().is_empty() { login } else { from };
        Ok(Self::new("smtp.gmail.com", Security::StartTls, address(from)?)
            .with_credentials(Credentials::new(login, password)))
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn address(text: &str) -> Result<Address> {
    parse_address(text.as_bytes()).map_err(|e| Error::InvalidAddress(format!("{text:?}: {e}")))
}
