//! SMTP connection management with type-state pattern.

mod client;
mod stream;

pub use client::{Authenticated, Client, Connected, MailTransaction, RecipientAdded};
pub use stream::{Io, SmtpStream, connect, connect_tls};
