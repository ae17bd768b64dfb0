//! Raw header/body tokenizer.
//!
//! Splits a message into its unfolded header lines and the body bytes
//! without interpreting any header. CRLF and bare LF line endings are both
//! accepted, mixed freely within one input.

use crate::error::{Error, Result};

/// A header exactly as it appeared on the wire, after unfolding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeader {
    /// Header name, all bytes before the first colon.
    pub key: Vec<u8>,
    /// Header value with leading whitespace stripped and folds joined.
    pub value: Vec<u8>,
}

impl RawHeader {
    /// Creates a raw header from key and value bytes.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered raw headers plus the body that followed the blank line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    /// Headers in original order. Duplicates are kept as separate entries.
    pub headers: Vec<RawHeader>,
    /// Body bytes, copied verbatim.
    pub body: Vec<u8>,
}

/// Parses the header section and body of a message.
///
/// The header section ends at the first empty line. A line starting with a
/// space or tab continues the previous header; its content is appended to
/// the previous value after a single space. If the input ends before any
/// empty line, every line is a header and the body is empty.
///
/// # Errors
///
/// Returns [`Error::MalformedHeader`] if a line is neither a continuation nor
/// a `key: value` pair, or if a continuation appears before any header.
pub fn parse_raw(input: &[u8]) -> Result<RawMessage> {
    let mut headers: Vec<RawHeader> = Vec::new();
    let mut pos = 0;
    let mut line_no = 0;

    while pos < input.len() {
        let (line, next) = next_line(input, pos);
        line_no += 1;

        if line.is_empty() {
            tracing::trace!(
                headers = headers.len(),
                body_len = input.len() - next,
                "parsed raw message"
            );
            return Ok(RawMessage {
                headers,
                body: input[next..].to_vec(),
            });
        }

        if is_wsp(line[0]) {
            let Some(last) = headers.last_mut() else {
                return Err(Error::malformed_header(
                    line_no,
                    "continuation line before any header",
                ));
            };
            let continuation = trim_leading_wsp(line);
            if !continuation.is_empty() {
                if !last.value.is_empty() {
                    last.value.push(b' ');
                }
                last.value.extend_from_slice(continuation);
            }
        } else {
            headers.push(parse_header_line(line, line_no)?);
        }

        pos = next;
    }

    tracing::trace!(headers = headers.len(), "parsed raw message without body");
    Ok(RawMessage {
        headers,
        body: Vec::new(),
    })
}

/// Splits one `key: value` line.
fn parse_header_line(line: &[u8], line_no: usize) -> Result<RawHeader> {
    let Some(colon) = line.iter().position(|&b| b == b':') else {
        return Err(Error::malformed_header(line_no, "missing colon"));
    };

    if line[..colon].iter().any(|&b| is_wsp(b)) {
        return Err(Error::malformed_header(
            line_no,
            "whitespace before colon in header name",
        ));
    }
    if colon == 0 {
        return Err(Error::malformed_header(line_no, "empty header name"));
    }

    Ok(RawHeader::new(
        &line[..colon],
        trim_leading_wsp(&line[colon + 1..]),
    ))
}

/// Returns the line starting at `start` without its terminator, and the
/// offset of the following line.
fn next_line(input: &[u8], start: usize) -> (&[u8], usize) {
    let rest = &input[start..];
    match rest.iter().position(|&b| b == b'\n') {
        Some(lf) => {
            let line = &rest[..lf];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            (line, start + lf + 1)
        }
        None => (rest, input.len()),
    }
}

const fn is_wsp(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn trim_leading_wsp(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| !is_wsp(b)).unwrap_or(bytes.len());
    &bytes[start..]
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::needless_collect,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn crlfy(s: &str) -> Vec<u8> {
        s.replace('\n', "\r\n").into_bytes()
    }

    fn header(key: &str, value: &str) -> RawHeader {
        RawHeader::new(key.as_bytes(), value.as_bytes())
    }

    #[test]
    fn test_blank_line_only() {
        let raw = parse_raw(&crlfy("\n")).unwrap();
        assert!(raw.headers.is_empty());
        assert!(raw.body.is_empty());
    }

    #[test]
    fn test_no_headers() {
        let raw = parse_raw(&crlfy("\nab\nc\n")).unwrap();
        assert!(raw.headers.is_empty());
        assert_eq!(raw.body, crlfy("ab\nc\n"));
    }

    #[test]
    fn test_single_header_empty_body() {
        let raw = parse_raw(&crlfy("a: b\n\n")).unwrap();
        assert_eq!(raw.headers, vec![header("a", "b")]);
        assert!(raw.body.is_empty());
    }

    #[test]
    fn test_folded_header() {
        let raw = parse_raw(&crlfy("a: b\nc: def\n hi\n\n")).unwrap();
        assert_eq!(raw.headers, vec![header("a", "b"), header("c", "def hi")]);
        assert!(raw.body.is_empty());
    }

    #[test]
    fn test_fold_collapses_whitespace() {
        let raw = parse_raw(b"c: def\r\n \t   hi\r\n\tthere\r\n\r\n").unwrap();
        assert_eq!(raw.headers, vec![header("c", "def hi there")]);
    }

    #[test]
    fn test_fold_onto_empty_value() {
        let raw = parse_raw(b"Subject:\r\n Hello\r\n\r\n").unwrap();
        assert_eq!(raw.headers, vec![header("Subject", "Hello")]);
    }

    #[test]
    fn test_leading_value_whitespace_stripped() {
        let expected = vec![header("a", "b"), header("c", "d fdsa"), header("ef", "as")];

        let raw = parse_raw(&crlfy("a: b\nc: d fdsa\nef:  as\n\nhello, world\n")).unwrap();
        assert_eq!(raw.headers, expected);
        assert_eq!(raw.body, crlfy("hello, world\n"));

        let raw = parse_raw(b"a: b\nc: d fdsa\nef:  as\n\nhello, world\n").unwrap();
        assert_eq!(raw.headers, expected);
        assert_eq!(raw.body, b"hello, world\n");
    }

    #[test]
    fn test_mixed_line_endings() {
        let raw = parse_raw(b"a: b\nc: d\r\n\nbody\r\nmore\n").unwrap();
        assert_eq!(raw.headers, vec![header("a", "b"), header("c", "d")]);
        assert_eq!(raw.body, b"body\r\nmore\n");
    }

    #[test]
    fn test_body_is_not_unfolded() {
        let raw = parse_raw(b"a: b\r\n\r\nline\r\n folded\r\n").unwrap();
        assert_eq!(raw.body, b"line\r\n folded\r\n");
    }

    #[test]
    fn test_duplicate_headers_preserved() {
        let raw = parse_raw(&crlfy("Received: one\nX: y\nReceived: two\n\n")).unwrap();
        assert_eq!(
            raw.headers,
            vec![
                header("Received", "one"),
                header("X", "y"),
                header("Received", "two"),
            ]
        );
    }

    #[test]
    fn test_headers_without_terminating_blank_line() {
        let raw = parse_raw(b"a: b\r\nc: d").unwrap();
        assert_eq!(raw.headers, vec![header("a", "b"), header("c", "d")]);
        assert!(raw.body.is_empty());
    }

    #[test]
    fn test_value_keeps_inner_and_trailing_text() {
        let raw = parse_raw(b"To: a@x.com ,  b@y.com \r\n\r\n").unwrap();
        assert_eq!(raw.headers[0].value, b"a@x.com ,  b@y.com ");
    }

    #[test]
    fn test_empty_input() {
        let raw = parse_raw(b"").unwrap();
        assert!(raw.headers.is_empty());
        assert!(raw.body.is_empty());
    }

    #[test]
    fn test_missing_colon_is_error() {
        let err = parse_raw(b"a: b\r\nnot a header\r\n\r\n").unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { line: 2, .. }));
    }

    #[test]
    fn test_space_before_colon_is_error() {
        let err = parse_raw(b"Subject : hi\r\n\r\n").unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { line: 1, .. }));
    }

    #[test]
    fn test_empty_key_is_error() {
        assert!(parse_raw(b": value\r\n\r\n").is_err());
    }

    #[test]
    fn test_leading_continuation_is_error() {
        let err = parse_raw(b" orphan\r\n\r\n").unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { line: 1, .. }));
    }
}
