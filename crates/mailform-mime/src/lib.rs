//! # mailform-mime
//!
//! RFC 5322 message parsing, structured header interpretation and
//! serialization.
//!
//! ## Features
//!
//! - **Raw parsing**: Split wire bytes into ordered, unfolded headers and a body
//! - **Addresses**: Parse `Display Name <local@domain>` mailboxes and lists
//! - **Header processing**: Project raw headers onto typed fields
//! - **Rendering**: Serialize messages back to CRLF wire form with folding
//! - **Multipart**: Split and render RFC 2046 multipart bodies
//! - **Building**: Compose outgoing text, HTML and multipart messages
//!
//! ## Quick Start
//!
//! ### Parsing Messages
//!
//! ```ignore
//! use mailform_mime::parse;
//!
//! let message = parse(b"From: alice@example.com\r\n\
//!                       Subject: Test\r\n\
//!                       \r\n\
//!                       Hello, World!")?;
//! println!("Subject: {}", message.header.decoded_subject()?);
//! println!("Body: {}", message.text().unwrap_or_default());
//! ```
//!
//! ### Building Messages
//!
//! ```ignore
//! use mailform_mime::Message;
//!
//! let message = Message::new_text(
//!     "Test Message",
//!     "Hello, World!",
//!     "sender@example.com",
//!     ["recipient@example.com"],
//! )?;
//! let wire = message.render()?;
//! ```
//!
//! ### Two-Stage Parsing
//!
//! ```ignore
//! use mailform_mime::{parse_raw, process};
//!
//! let raw = parse_raw(input)?;
//! for header in &raw.headers {
//!     println!("{}", String::from_utf8_lossy(&header.key));
//! }
//! let message = process(raw)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod builder;
mod content_type;
mod error;
mod header;
mod message;
mod multipart;
mod process;
mod raw;
mod render;

pub mod date;
pub mod encoding;

pub use address::{Address, parse_address, parse_address_list};
pub use builder::MessageBuilder;
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{Header, Headers};
pub use message::{Body, Diagnostic, HeaderInfo, Message, Part};
pub use multipart::split_multipart;
pub use process::process;
pub use raw::{RawHeader, RawMessage, parse_raw};
pub use render::render;

/// Parses wire bytes into a fully interpreted message.
///
/// Equivalent to `process(parse_raw(input)?)`.
///
/// # Errors
///
/// Returns an error if the header section is malformed, an address header
/// does not parse, or a multipart body cannot be split.
pub fn parse(input: &[u8]) -> Result<Message> {
    process(parse_raw(input)?)
}
