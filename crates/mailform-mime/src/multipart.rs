//! Multipart body splitting.

use crate::error::{Error, Result};
use crate::header::Header;
use crate::message::Part;
use crate::raw::parse_raw;

/// Splits a multipart body on `boundary` into its parts.
///
/// Delimiter lines are `--boundary`, the closing line is `--boundary--`;
/// trailing whitespace on either is ignored. The line break before a
/// delimiter belongs to the delimiter, not to the preceding part. Text
/// before the first delimiter and after the closing one is discarded. Each
/// section is split into headers and content like a message, without
/// looking for nested multiparts.
///
/// # Errors
///
/// Returns [`Error::InvalidMultipart`] if no delimiter is found or there are
/// no parts, and [`Error::MalformedHeader`] if a part's header section is
/// malformed.
pub fn split_multipart(body: &[u8], boundary: &str) -> Result<Vec<Part>> {
    let delimiter = format!("--{boundary}");
    let close = format!("--{boundary}--");

    let mut parts = Vec::new();
    let mut section_start: Option<usize> = None;
    let mut seen_delimiter = false;
    let mut pos = 0;

    while pos < body.len() {
        let line_start = pos;
        let (line, next) = match body[pos..].iter().position(|&b| b == b'\n') {
            Some(lf) => (&body[pos..pos + lf], pos + lf + 1),
            None => (&body[pos..], body.len()),
        };
        pos = next;

        let line = line.trim_ascii_end();
        let is_close = line == close.as_bytes();
        if !is_close && line != delimiter.as_bytes() {
            continue;
        }

        seen_delimiter = true;
        if let Some(start) = section_start.take() {
            let end = strip_line_break(body, start, line_start);
            parts.push(parse_part(&body[start..end])?);
        }

        if is_close {
            break;
        }
        section_start = Some(next);
    }

    if !seen_delimiter {
        return Err(Error::InvalidMultipart(format!(
            "no delimiter for boundary {boundary:?}"
        )));
    }

    if let Some(start) = section_start {
        tracing::debug!(boundary, "multipart body has no closing delimiter");
        parts.push(parse_part(&body[start..])?);
    }

    if parts.is_empty() {
        return Err(Error::InvalidMultipart("no parts".to_string()));
    }

    Ok(parts)
}

/// Returns `end` moved back over the CRLF or LF that precedes it, without
/// going before `start`.
fn strip_line_break(body: &[u8], start: usize, end: usize) -> usize {
    let mut end = end;
    if end > start && body[end - 1] == b'\n' {
        end -= 1;
        if end > start && body[end - 1] == b'\r' {
            end -= 1;
        }
    }
    end
}

fn parse_part(section: &[u8]) -> Result<Part> {
    let raw = parse_raw(section)?;
    Ok(Part::new(
        raw.headers.iter().map(Header::from).collect(),
        raw.body,
    ))
}
