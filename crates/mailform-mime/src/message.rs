//! Structured message model.

use crate::address::Address;
use crate::content_type::ContentType;
use crate::encoding::decode_rfc2047;
use crate::error::Result;
use crate::header::Headers;
use chrono::{DateTime, FixedOffset};
use std::fmt;

/// Structured projection of a message's header section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderInfo {
    /// Every header as text, recognized or not, in original order.
    pub full_headers: Headers,
    /// Headers without a dedicated field, in original order.
    pub opt_headers: Headers,

    /// `Message-ID`, verbatim or derived from the body.
    pub message_id: String,
    /// `Date`, if present and parseable.
    pub date: Option<DateTime<FixedOffset>>,
    /// `From`.
    pub from: Vec<Address>,
    /// `Sender`.
    pub sender: Option<Address>,
    /// `Reply-To`.
    pub reply_to: Vec<Address>,
    /// `To`.
    pub to: Vec<Address>,
    /// `Cc`.
    pub cc: Vec<Address>,
    /// `Bcc`.
    pub bcc: Vec<Address>,
    /// `Subject`, possibly containing RFC 2047 encoded words.
    pub subject: String,
    /// `Comments`, whitespace-delimited.
    pub comments: Vec<String>,
    /// `Keywords`, comma-delimited.
    pub keywords: Vec<String>,
    /// `Content-Type`, verbatim.
    pub content_type: String,
    /// `In-Reply-To`, whitespace-delimited.
    pub in_reply_to: Vec<String>,
    /// `References`, comma-delimited.
    pub references: Vec<String>,
}

impl HeaderInfo {
    /// Returns the subject with RFC 2047 encoded words decoded.
    ///
    /// # Errors
    ///
    /// Returns an error if an encoded word is malformed.
    pub fn decoded_subject(&self) -> Result<String> {
        decode_rfc2047(&self.subject)
    }

    /// Parses the `Content-Type` value, defaulting to `text/plain`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is present but malformed.
    pub fn parsed_content_type(&self) -> Result<ContentType> {
        if self.content_type.trim().is_empty() {
            Ok(ContentType::text_plain())
        } else {
            ContentType::parse(&self.content_type)
        }
    }
}

/// A non-fatal condition found while processing a message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Diagnostic {
    /// The `Date` header matched none of the accepted formats.
    UnparsableDate(String),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparsableDate(value) => write!(f, "unparsable Date header: {value:?}"),
        }
    }
}

/// MIME body part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Part {
    /// Part headers, in order.
    pub headers: Headers,
    /// Part content (raw bytes, never transfer-decoded).
    pub content: Vec<u8>,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, content: Vec<u8>) -> Self {
        Self { headers, content }
    }

    /// Gets the content type, defaulting to `text/plain`.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the content as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not UTF-8.
    pub fn body_text(&self) -> Result<String> {
        String::from_utf8(self.content.clone()).map_err(Into::into)
    }
}

/// Message body: flat text or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Body {
    /// Single-part content, verbatim. No charset is assumed.
    Text(Vec<u8>),
    /// Multipart content, split on the `Content-Type` boundary.
    Multipart(Vec<Part>),
}

impl Default for Body {
    fn default() -> Self {
        Self::Text(Vec::new())
    }
}

/// A fully interpreted message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Structured headers.
    pub header: HeaderInfo,
    /// Body.
    pub body: Body,
    /// Non-fatal conditions found during processing.
    pub diagnostics: Vec<Diagnostic>,
}

impl Message {
    /// Creates a single-part message.
    #[must_use]
    pub fn single_part(header: HeaderInfo, text: impl Into<Vec<u8>>) -> Self {
        Self {
            header,
            body: Body::Text(text.into()),
            diagnostics: Vec::new(),
        }
    }

    /// Creates a multipart message.
    #[must_use]
    pub const fn multipart(header: HeaderInfo, parts: Vec<Part>) -> Self {
        Self {
            header,
            body: Body::Multipart(parts),
            diagnostics: Vec::new(),
        }
    }

    /// Parses and processes a message from wire bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if raw parsing or processing fails.
    pub fn parse(input: &[u8]) -> Result<Self> {
        crate::parse(input)
    }

    /// Renders the message into transmission-ready bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart message lacks a boundary.
    pub fn render(&self) -> Result<Vec<u8>> {
        crate::render::render(self)
    }

    /// Defaults `Sender` to the first `From` address if unset.
    pub fn normalize(&mut self) {
        if self.header.sender.is_none() {
            self.header.sender = self.header.from.first().cloned();
        }
    }

    /// Returns `Sender`, or the first `From` address if unset.
    #[must_use]
    pub fn effective_sender(&self) -> Option<&Address> {
        self.header
            .sender
            .as_ref()
            .or_else(|| self.header.from.first())
    }

    /// Returns every recipient: `To`, then `Cc`, then `Bcc`.
    pub fn recipients(&self) -> impl Iterator<Item = &Address> {
        self.header
            .to
            .iter()
            .chain(&self.header.cc)
            .chain(&self.header.bcc)
    }

    /// Returns the text of a single-part message, if it is valid UTF-8.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.body_bytes().and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Returns the raw content of a single-part message.
    #[must_use]
    pub fn body_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            Body::Text(bytes) => Some(bytes.as_slice()),
            Body::Multipart(_) => None,
        }
    }

    /// Returns the parts of a multipart message (empty for single-part).
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        match &self.body {
            Body::Text(_) => &[],
            Body::Multipart(parts) => parts.as_slice(),
        }
    }

    /// Checks if this is a multipart message.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self.body, Body::Multipart(_))
    }

    /// Finds the first part with the given media type, e.g. `text/html`.
    ///
    /// # Errors
    ///
    /// Returns an error if a part has a malformed content type.
    pub fn find_part(&self, main_type: &str, sub_type: &str) -> Result<Option<&Part>> {
        for part in self.parts() {
            let ct = part.content_type()?;
            if ct.main_type.eq_ignore_ascii_case(main_type)
                && ct.sub_type.eq_ignore_ascii_case(sub_type)
            {
                return Ok(Some(part));
            }
        }
        Ok(None)
    }
}
