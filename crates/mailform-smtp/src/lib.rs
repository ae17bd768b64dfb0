//! # mailform-smtp
//!
//! Delivers [`mailform_mime::Message`]s over SMTP (RFC 5321).
//!
//! ## Features
//!
//! - **Single validation gate**: [`Mailer`] rejects messages without
//!   recipients before anything is rendered or sent
//! - **Pluggable transports**: the [`Transport`] trait takes an envelope and
//!   rendered bytes; [`SmtpTransport`] is the network implementation
//! - **Type-state connection management**: Compile-time enforcement of valid
//!   SMTP state transitions
//! - **TLS support**: Both implicit TLS (port 465) and STARTTLS
//! - **Authentication**: AUTH PLAIN
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailform_mime::Message;
//! use mailform_smtp::{Mailer, SmtpServer};
//!
//! #[tokio::main]
//! async fn main() -> mailform_smtp::Result<()> {
//!     let server = SmtpServer::gmail("", "me@gmail.com", "app-password")?;
//!     let mailer = Mailer::smtp(server);
//!
//!     let message = Message::new_text(
//!         "Test",
//!         "Hello, World!",
//!         "me@gmail.com",
//!         ["recipient@example.com"],
//!     )?;
//!     mailer.send(&message).await
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌──────────────┐
//! │  Connected   │ ─── auth_plain() ───→ Authenticated
//! └──────────────┘                            │
//!        │                                    │
//!        └──────────── mail_from() ───────────┴──→ MailTransaction
//!                                                        │
//!                 Connected ←── send_data() ── RecipientAdded ←── rcpt_to()
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
pub mod connection;
mod error;
mod mailer;
pub mod protocol;
mod transport;

pub use config::{Credentials, Security, SmtpServer};
pub use connection::{Authenticated, Client, Connected, MailTransaction, RecipientAdded};
pub use error::{Error, Result};
pub use mailer::Mailer;
pub use transport::{Envelope, SmtpTransport, Transport};
