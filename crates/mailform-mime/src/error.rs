//! Error types for message parsing and rendering.

use std::string::FromUtf8Error;

/// Result type alias for message operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message error types.
///
/// Every variant is fatal: the call that produced it returns no partial
/// structure. Non-fatal conditions are reported as [`Diagnostic`]s on the
/// returned message instead.
///
/// [`Diagnostic`]: crate::Diagnostic
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A header line violates the `key: value` / continuation grammar.
    #[error("Malformed header on line {line}: {reason}")]
    MalformedHeader {
        /// 1-based line number within the parsed section.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// An address or address list failed to parse.
    #[error("Invalid address: {0}")]
    AddressParse(String),

    /// A header name cannot be written without altering the header section.
    #[error("Invalid header name: {0:?}")]
    InvalidHeaderName(String),

    /// Missing boundary in multipart message.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// Invalid multipart structure.
    #[error("Invalid multipart structure: {0}")]
    InvalidMultipart(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Invalid encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),
}

impl Error {
    /// Creates a malformed header error.
    #[must_use]
    pub fn malformed_header(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            line,
            reason: reason.into(),
        }
    }

    /// Creates an address parse error.
    #[must_use]
    pub fn address(reason: impl Into<String>) -> Self {
        Self::AddressParse(reason.into())
    }
}
