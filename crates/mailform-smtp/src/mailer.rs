//! Message submission.

use crate::config::SmtpServer;
use crate::error::{Error, Result};
use crate::transport::{Envelope, SmtpTransport, Transport};
use mailform_mime::Message;

/// Validates, renders and hands messages to a [`Transport`].
#[derive(Debug, Clone)]
pub struct Mailer<T> {
    server: SmtpServer,
    transport: T,
}

impl Mailer<SmtpTransport> {
    /// Creates a mailer delivering over SMTP to `server`.
    #[must_use]
    pub fn smtp(server: SmtpServer) -> Self {
        let transport = SmtpTransport::new(server.clone());
        Self { server, transport }
    }
}

impl<T: Transport> Mailer<T> {
    /// Creates a mailer with a custom transport.
    #[must_use]
    pub const fn new(server: SmtpServer, transport: T) -> Self {
        Self { server, transport }
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a message.
    ///
    /// A message without `To` recipients is rejected before rendering and
    /// the transport is never called. Otherwise the message is rendered and
    /// handed to the transport exactly once. The envelope sender is the
    /// first `From` mailbox, or the server's `from` if there is none;
    /// recipients are `To`, then `Cc`, then `Bcc`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a message without recipients,
    /// [`Error::Render`] if the message cannot be serialized, and any
    /// transport error unchanged.
    pub async fn send(&self, message: &Message) -> Result<()> {
        if message.header.to.is_empty() {
            return Err(Error::Validation("missing email recipient (To)".into()));
        }

        let payload = message.render()?;
        let envelope = self.envelope(message);
        tracing::debug!(
            sender = %envelope.sender,
            recipients = envelope.recipients.len(),
            bytes = payload.len(),
            "submitting message"
        );
        self.transport.send(&envelope, &payload).await
    }

    /// Builds the envelope for a message.
    #[must_use]
    pub fn envelope(&self, message: &Message) -> Envelope {
        let sender = message
            .header
            .from
            .first()
            .unwrap_or(&self.server.from)
            .mailbox();
        let recipients = message.recipients().map(mailform_mime::Address::mailbox).collect();
        Envelope::new(sender, recipients)
    }
}
