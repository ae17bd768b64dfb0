//! Message serialization.
//!
//! Renders a [`Message`] into CRLF-terminated wire bytes. Structured fields
//! are written in a fixed order, followed by the pass-through headers.

use crate::address::Address;
use crate::content_type::ContentType;
use crate::date::format_date;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Body, Message, Part};

const CRLF: &[u8] = b"\r\n";

/// Header lines longer than this are folded at spaces where possible.
const MAX_LINE_LEN: usize = 78;

/// Renders a message.
///
/// Empty structured fields are omitted. `Sender` falls back to the first
/// `From` address (see [`Message::normalize`]). Multipart bodies are written
/// with `--boundary` delimiters and a closing `--boundary--` line.
///
/// # Errors
///
/// Returns [`Error::MissingBoundary`] if the body has parts but
/// `Content-Type` has no boundary, [`Error::InvalidMultipart`] if the
/// parts list is empty or the content type is not multipart, and
/// [`Error::InvalidHeaderName`] for a header name containing a line break,
/// whitespace or a colon. Nothing is returned on error.
pub fn render(message: &Message) -> Result<Vec<u8>> {
    let body = render_body(&message.header.content_type, &message.body)?;
    let mut out = Vec::with_capacity(body.len() + 512);

    let h = &message.header;
    let sender = message
        .effective_sender()
        .map(ToString::to_string)
        .unwrap_or_default();
    let fields = [
        ("Content-Type", h.content_type.clone().into_bytes()),
        ("Message-ID", h.message_id.clone().into_bytes()),
        ("In-Reply-To", h.in_reply_to.join(" ").into_bytes()),
        ("References", h.references.join(", ").into_bytes()),
        ("Date", h.date.as_ref().map(format_date).unwrap_or_default().into_bytes()),
        ("From", join_addresses(&h.from).into_bytes()),
        ("Sender", sender.into_bytes()),
        ("Reply-To", join_addresses(&h.reply_to).into_bytes()),
        ("To", join_addresses(&h.to).into_bytes()),
        ("Cc", join_addresses(&h.cc).into_bytes()),
        ("Bcc", join_addresses(&h.bcc).into_bytes()),
        ("Subject", verbatim(&h.full_headers, "Subject", &h.subject)),
        ("Comments", h.comments.join(" ").into_bytes()),
        ("Keywords", h.keywords.join(", ").into_bytes()),
    ];

    for (name, value) in &fields {
        if !value.is_empty() {
            write_header(&mut out, name, value)?;
        }
    }
    for header in &h.opt_headers {
        write_header(&mut out, &header.key, header.value_bytes())?;
    }

    out.extend_from_slice(CRLF);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Renders only the body section, as it appears after the blank line.
pub(crate) fn render_body(content_type: &str, body: &Body) -> Result<Vec<u8>> {
    match body {
        Body::Text(bytes) => Ok(bytes.clone()),
        Body::Multipart(parts) => {
            let boundary = multipart_boundary(content_type)?;
            if parts.is_empty() {
                return Err(Error::InvalidMultipart("no parts".to_string()));
            }
            render_parts(&boundary, parts)
        }
    }
}

fn multipart_boundary(content_type: &str) -> Result<String> {
    if content_type.trim().is_empty() {
        return Err(Error::MissingBoundary);
    }
    let ct = ContentType::parse(content_type)?;
    if !ct.is_multipart() {
        return Err(Error::InvalidMultipart(format!(
            "body has parts but Content-Type is {}/{}",
            ct.main_type, ct.sub_type
        )));
    }
    ct.boundary().map(str::to_string).ok_or(Error::MissingBoundary)
}

fn render_parts(boundary: &str, parts: &[Part]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for part in parts {
        out.extend_from_slice(b"--");
        out.extend_from_slice(boundary.as_bytes());
        out.extend_from_slice(CRLF);
        for header in &part.headers {
            write_header(&mut out, &header.key, header.value_bytes())?;
        }
        out.extend_from_slice(CRLF);
        out.extend_from_slice(&part.content);
        out.extend_from_slice(CRLF);
    }
    out.extend_from_slice(b"--");
    out.extend_from_slice(boundary.as_bytes());
    out.extend_from_slice(b"--");
    out.extend_from_slice(CRLF);
    Ok(out)
}

/// The received bytes of the last `name` header, if `value` still matches
/// it, so 8-bit text goes back out unchanged.
fn verbatim(full_headers: &Headers, name: &str, value: &str) -> Vec<u8> {
    full_headers
        .iter()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .find(|h| h.key.eq_ignore_ascii_case(name))
        .filter(|h| h.value == value)
        .map_or_else(|| value.as_bytes().to_vec(), |h| h.value_bytes().to_vec())
}

fn join_addresses(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rejects names that would break the header line they start.
pub(crate) fn check_header_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name
            .bytes()
            .any(|b| matches!(b, b'\r' | b'\n' | b' ' | b'\t' | b':'))
    {
        return Err(Error::InvalidHeaderName(name.to_string()));
    }
    Ok(())
}

/// Writes `name: value` plus CRLF, folding long lines.
///
/// Folds only replace a single space that sits between two words, so
/// unfolding restores the value exactly. Line breaks inside the value are
/// replaced by spaces.
fn write_header(out: &mut Vec<u8>, name: &str, value: &[u8]) -> Result<()> {
    check_header_name(name)?;

    let value: Vec<u8> = value
        .iter()
        .map(|&b| if b == b'\r' || b == b'\n' { b' ' } else { b })
        .collect();
    out.extend_from_slice(name.as_bytes());
    out.push(b':');

    let mut line_len = name.len() + 1;
    let mut previous: Option<&[u8]> = None;
    for word in value.split(|&b| b == b' ') {
        let foldable = previous.is_some_and(|p| !p.is_empty() && p.last() != Some(&b'\t'))
            && !word.is_empty()
            && word.first() != Some(&b'\t')
            && line_len + 1 + word.len() > MAX_LINE_LEN
            && line_len > name.len() + 2;

        if foldable {
            out.extend_from_slice(CRLF);
            line_len = 0;
        }
        out.push(b' ');
        out.extend_from_slice(word);
        line_len += 1 + word.len();
        previous = Some(word);
    }
    out.extend_from_slice(CRLF);
    Ok(())
}
