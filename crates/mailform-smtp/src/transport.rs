//! Delivery transports.

use crate::config::{Security, SmtpServer};
use crate::connection::{Client, Connected, SmtpStream, connect, connect_tls};
use crate::error::{Error, Result};
use std::future::Future;

/// Envelope of a single delivery: who the message is from and who
/// receives it, as bare mailboxes (`local@domain`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Envelope sender (`MAIL FROM`).
    pub sender: String,
    /// Envelope recipients (`RCPT TO`), in order.
    pub recipients: Vec<String>,
}

impl Envelope {
    /// Creates an envelope.
    #[must_use]
    pub const fn new(sender: String, recipients: Vec<String>) -> Self {
        Self { sender, recipients }
    }
}

/// Hands a rendered message to the outside world.
///
/// Implementations are called once per message and report failures
/// verbatim; they do not retry.
pub trait Transport {
    /// Delivers `payload` to the envelope recipients.
    ///
    /// # Errors
    ///
    /// Returns any connection, protocol or server error.
    fn send(&self, envelope: &Envelope, payload: &[u8]) -> impl Future<Output = Result<()>> + Send;
}

/// Transport speaking SMTP to a configured server.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    server: SmtpServer,
    client_hostname: String,
}

impl SmtpTransport {
    /// Creates a transport announcing itself as `localhost` in EHLO.
    #[must_use]
    pub fn new(server: SmtpServer) -> Self {
        Self {
            server,
            client_hostname: "localhost".to_string(),
        }
    }

    /// Sets the hostname sent with EHLO.
    #[must_use]
    pub fn with_client_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.client_hostname = hostname.into();
        self
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn server(&self) -> &SmtpServer {
        &self.server
    }

    /// Runs a full SMTP session over an already connected stream.
    ///
    /// Reads the greeting, sends EHLO, upgrades with STARTTLS when the
    /// server is configured for it, authenticates if credentials are set,
    /// then sends the envelope and payload and quits.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the stream or the server.
    pub async fn deliver(
        &self,
        stream: SmtpStream,
        envelope: &Envelope,
        payload: &[u8],
    ) -> Result<()> {
        let (first, rest) = envelope
            .recipients
            .split_first()
            .ok_or_else(|| Error::Validation("envelope has no recipients".into()))?;

        let mut client = Client::from_stream(stream)
            .await?
            .ehlo(&self.client_hostname)
            .await?;
        if self.server.security == Security::StartTls {
            client = client
                .starttls(&self.server.host, &self.client_hostname)
                .await?;
        }

        let transaction = match &self.server.credentials {
            Some(login) => {
                client
                    .auth_plain(&login.username, &login.password)
                    .await?
                    .mail_from(&envelope.sender, payload.len())
                    .await?
            }
            None => client.mail_from(&envelope.sender, payload.len()).await?,
        };

        let mut client = transaction.rcpt_to(first).await?;
        for recipient in rest {
            client = client.rcpt_to(recipient).await?;
        }
        let client: Client<Connected> = client.send_data(payload).await?;
        client.quit().await?;

        tracing::info!(
            server = %self.server.address(),
            recipients = envelope.recipients.len(),
            "message delivered"
        );
        Ok(())
    }

    async fn open(&self) -> Result<SmtpStream> {
        match self.server.security {
            Security::Tls => connect_tls(&self.server.host, self.server.port).await,
            Security::None | Security::StartTls => {
                connect(&self.server.host, self.server.port).await
            }
        }
    }
}

impl Transport for SmtpTransport {
    async fn send(&self, envelope: &Envelope, payload: &[u8]) -> Result<()> {
        let stream = self.open().await?;
        self.deliver(stream, envelope, payload).await
    }
}
