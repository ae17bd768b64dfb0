//! Header encoding and identifier generation.
//!
//! Supports RFC 2047 encoded words and the deterministic message identifier
//! derived from message content.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use sha1::{Digest, Sha1};

/// Length of a generated message identifier.
pub const MESSAGE_ID_LEN: usize = 20;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Derives a message identifier from content.
///
/// SHA-1 of `content`, URL-safe Base64 encoded, truncated to
/// [`MESSAGE_ID_LEN`] characters. Identical content always yields the same
/// identifier.
#[must_use]
pub fn generate_message_id(content: &[u8]) -> String {
    let digest = Sha1::digest(content);
    let mut encoded = URL_SAFE.encode(digest);
    encoded.truncate(MESSAGE_ID_LEN);
    encoded
}

/// Decodes Quoted-Printable text (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
fn decode_quoted_printable(text: &str) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'=' {
            result.push(bytes[i]);
            i += 1;
            continue;
        }

        // Soft line break
        if bytes.get(i + 1..i + 3) == Some(&b"\r\n"[..]) {
            i += 3;
            continue;
        }
        if bytes.get(i + 1) == Some(&b'\n') {
            i += 2;
            continue;
        }

        let hex = bytes
            .get(i + 1..i + 3)
            .ok_or_else(|| Error::InvalidEncoding("Incomplete escape sequence".to_string()))?;
        let hex = std::str::from_utf8(hex)
            .map_err(|_| Error::InvalidEncoding("Invalid hex escape".to_string()))?;
        let byte = u8::from_str_radix(hex, 16)
            .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
        result.push(byte);
        i += 3;
    }

    Ok(result)
}

/// Encodes a header value using RFC 2047 encoding.
///
/// Format: `=?charset?B?encoded-text?=`. Pure ASCII text that cannot be
/// mistaken for an encoded word is returned unchanged.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode_rfc2047(text: &str, charset: &str) -> Result<String> {
    if text.is_ascii() && !text.contains("=?") {
        return Ok(text.to_string());
    }

    let encoded = encode_base64(text.as_bytes());
    Ok(format!("=?{charset}?B?{encoded}?="))
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Whitespace between two adjacent encoded words is dropped; all other text
/// is kept as is. Only UTF-8 and US-ASCII charsets are understood, other
/// charsets are passed through lossily.
///
/// # Errors
///
/// Returns an error if an encoded word is malformed.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;
    let mut pending_space = "";
    let mut last_was_word = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);
        let Some(word_len) = encoded_word_len(candidate) else {
            output.push_str(pending_space);
            output.push_str(before);
            output.push_str("=?");
            rest = &candidate[2..];
            pending_space = "";
            last_was_word = false;
            continue;
        };

        if !(last_was_word && before.trim().is_empty()) {
            output.push_str(pending_space);
            output.push_str(before);
        }
        output.push_str(&decode_word(&candidate[..word_len])?);
        rest = &candidate[word_len..];
        pending_space = "";
        last_was_word = true;

        let trimmed = rest.trim_start();
        if trimmed.starts_with("=?") {
            pending_space = &rest[..rest.len() - trimmed.len()];
            rest = trimmed;
        }
    }

    output.push_str(pending_space);
    output.push_str(rest);
    Ok(output)
}

/// Returns the byte length of the encoded word at the start of `text`.
fn encoded_word_len(text: &str) -> Option<usize> {
    let inner = text.strip_prefix("=?")?;
    let charset_end = inner.find('?')?;
    let after_charset = &inner[charset_end + 1..];
    let encoding_end = after_charset.find('?')?;
    let payload = &after_charset[encoding_end + 1..];
    let payload_end = payload.find("?=")?;
    if payload[..payload_end].contains(char::is_whitespace) {
        return None;
    }
    Some(2 + charset_end + 1 + encoding_end + 1 + payload_end + 2)
}

fn decode_word(word: &str) -> Result<String> {
    let inner = &word[2..word.len() - 2];
    let parts: Vec<&str> = inner.splitn(3, '?').collect();

    if parts.len() != 3 {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    }

    let encoding = parts[1].to_uppercase();
    let encoded_text = parts[2];

    let bytes = match encoding.as_str() {
        "B" => decode_base64(encoded_text)?,
        // Quoted-Printable with underscore for space
        "Q" => decode_quoted_printable(&encoded_text.replace('_', " "))?,
        _ => {
            return Err(Error::InvalidEncoding(format!(
                "Unknown encoding: {encoding}"
            )));
        }
    };

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
