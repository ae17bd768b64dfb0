//! Type-state SMTP client.

use super::SmtpStream;
use crate::error::{Error, Result};
use crate::protocol::{Capabilities, Command, Reply, ReplyCode, is_last_reply_line, parse_reply};
use base64::Engine;
use std::marker::PhantomData;

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    capabilities: Capabilities,
    _state: PhantomData<State>,
}

impl<S> Client<S> {
    /// Returns the capabilities from the last EHLO.
    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            capabilities: self.capabilities,
            _state: PhantomData,
        }
    }

    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        tracing::debug!(command = %cmd.redacted(), "C:");
        self.stream.write_all(&cmd.serialize()).await?;
        read_reply(&mut self.stream).await
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(Command::Quit).await?;
        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }
        Ok(())
    }
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or the server is not
    /// ready.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        read_reply(&mut stream)
            .await?
            .expect_code(ReplyCode::SERVICE_READY)?;

        Ok(Self {
            stream,
            capabilities: Capabilities::default(),
            _state: PhantomData,
        })
    }

    /// Sends EHLO and records the server capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let cmd = Command::Ehlo {
            hostname: client_hostname.to_string(),
        };
        let reply = self.send_command(cmd).await?.expect_success()?;
        self.capabilities = Capabilities::from_ehlo(&reply.message);
        Ok(self)
    }

    /// Upgrades the connection to TLS using STARTTLS, then repeats EHLO.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not advertised, the server refuses it,
    /// or the TLS handshake fails.
    pub async fn starttls(mut self, server_hostname: &str, client_hostname: &str) -> Result<Self> {
        if !self.capabilities.starttls {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        self.send_command(Command::StartTls)
            .await?
            .expect_code(ReplyCode::SERVICE_READY)?;

        self.stream = self.stream.upgrade_to_tls(server_hostname).await?;
        self.capabilities = Capabilities::default();
        self.ehlo(client_hostname).await
    }

    /// Authenticates using the PLAIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not offer PLAIN or rejects the
    /// credentials.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        if !self.capabilities.supports_auth("PLAIN") {
            return Err(Error::NotSupported("AUTH PLAIN".into()));
        }

        let credentials = format!("\0{username}\0{password}");
        let initial_response =
            base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());

        self.send_command(Command::AuthPlain { initial_response })
            .await?
            .expect_code(ReplyCode::AUTH_SUCCEEDED)?;
        Ok(self.transition())
    }

    /// Starts a mail transaction without authentication (if server allows).
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(self, from: &str, size: usize) -> Result<Client<MailTransaction>> {
        self.transition::<Authenticated>().mail_from(from, size).await
    }
}

impl Client<Authenticated> {
    /// Starts a mail transaction.
    ///
    /// `size` is announced when the server advertised SIZE, and rejected
    /// locally if it exceeds the advertised limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is too large or MAIL FROM fails.
    pub async fn mail_from(mut self, from: &str, size: usize) -> Result<Client<MailTransaction>> {
        if let Some(limit) = self.capabilities.max_size
            && size > limit
        {
            return Err(Error::MessageTooLarge(size));
        }

        let cmd = Command::MailFrom {
            from: from.to_string(),
            eight_bit: self.capabilities.eight_bit_mime,
            size: self.capabilities.max_size.map(|_| size),
        };
        self.send_command(cmd).await?.expect_success()?;
        Ok(self.transition())
    }
}

impl Client<MailTransaction> {
    /// Adds the first recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: &str) -> Result<Client<RecipientAdded>> {
        self.send_command(Command::RcptTo { to: to.to_string() })
            .await?
            .expect_success()?;
        Ok(self.transition())
    }
}

impl Client<RecipientAdded> {
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: &str) -> Result<Self> {
        self.send_command(Command::RcptTo { to: to.to_string() })
            .await?
            .expect_success()?;
        Ok(self)
    }

    /// Sends DATA followed by the message and completes the transaction.
    ///
    /// Line endings are normalized to CRLF, lines starting with `.` are
    /// dot-stuffed and the terminating `.` line is appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses DATA or rejects the message.
    pub async fn send_data(mut self, message: &[u8]) -> Result<Client<Connected>> {
        self.send_command(Command::Data)
            .await?
            .expect_code(ReplyCode::START_DATA)?;

        self.stream.write_all(&dot_stuff(message)).await?;
        read_reply(&mut self.stream).await?.expect_success()?;
        Ok(self.transition())
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        if line.is_empty() {
            continue;
        }
        let is_last = is_last_reply_line(&line);
        lines.push(line);
        if is_last {
            break;
        }
    }

    let reply = parse_reply(&lines)?;
    tracing::debug!(code = %reply.code, text = %reply.message_text(), "S:");
    Ok(reply)
}

/// Encodes a message for the DATA phase, including the final `.` line.
fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 64 + 5);
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    if !body.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }
    out.extend_from_slice(b".\r\n");
    out
}
