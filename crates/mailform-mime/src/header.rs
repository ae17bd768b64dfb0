//! Text headers and ordered header collections.

use crate::raw::RawHeader;
use std::fmt;

/// A header as text, retained verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    /// Header name as it appeared.
    pub key: String,
    /// Header value.
    pub value: String,
    /// Value bytes as received, kept only when they are not valid UTF-8.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    raw_value: Option<Vec<u8>>,
}

impl Header {
    /// Creates a header.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            raw_value: None,
        }
    }

    /// Returns the value as it should go back on the wire.
    ///
    /// This is the received bytes for an 8-bit value that was not valid
    /// UTF-8, as long as `value` has not been reassigned since.
    #[must_use]
    pub fn value_bytes(&self) -> &[u8] {
        match &self.raw_value {
            Some(raw) if String::from_utf8_lossy(raw) == self.value => raw,
            _ => self.value.as_bytes(),
        }
    }
}

impl From<&RawHeader> for Header {
    fn from(raw: &RawHeader) -> Self {
        let (value, raw_value) = match String::from_utf8(raw.value.clone()) {
            Ok(value) => (value, None),
            Err(e) => (
                String::from_utf8_lossy(e.as_bytes()).into_owned(),
                Some(e.into_bytes()),
            ),
        };
        Self {
            key: String::from_utf8_lossy(&raw.key).into_owned(),
            value,
            raw_value,
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

/// Ordered collection of headers.
///
/// Names keep their original case; lookups are case-insensitive.
/// Iteration yields headers in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Headers {
    entries: Vec<Header>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header, keeping any existing values for the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push(Header::new(name, value));
    }

    /// Appends an existing header entry.
    pub fn push(&mut self, header: Header) {
        self.entries.push(header);
    }

    /// Sets a header value, replacing any existing values.
    ///
    /// The replacement takes the position of the first existing value, or
    /// is appended if the name was absent.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(first) => {
                let entry = &mut self.entries[first];
                entry.value = value;
                entry.raw_value = None;
                let mut index = 0;
                self.entries.retain(|h| {
                    let keep = index <= first || !h.key.eq_ignore_ascii_case(&name);
                    index += 1;
                    keep
                });
            }
            None => self.entries.push(Header::new(name, value)),
        }
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|h| h.key.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Gets all values for a header, in order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|h| h.key.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
            .collect()
    }

    /// Removes all values for a header.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|h| !h.key.eq_ignore_ascii_case(name));
    }

    /// Returns an iterator over all headers in order.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    /// Number of header entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|h| h.key.eq_ignore_ascii_case(name))
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for header in &self.entries {
            write!(f, "{header}\r\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_headers_keep_original_case() {
        let mut headers = Headers::new();
        headers.add("X-Mailer", "test");
        assert_eq!(headers.iter().next().unwrap().key, "X-Mailer");
    }

    #[test]
    fn test_headers_set() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.com");
        headers.add("Subject", "Hi");
        headers.add("to", "bob@example.com");
        assert_eq!(headers.get_all("To").len(), 2);

        headers.set("To", "charlie@example.com");
        assert_eq!(headers.get_all("To"), vec!["charlie@example.com"]);
        let keys: Vec<_> = headers.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["To", "Subject"]);
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.add("Subject", "Test");
        headers.remove("subject");
        assert!(headers.get("Subject").is_none());
    }

    #[test]
    fn test_headers_display_preserves_order() {
        let mut headers = Headers::new();
        headers.add("Zeta", "1");
        headers.add("Alpha", "2");
        assert_eq!(headers.to_string(), "Zeta: 1\r\nAlpha: 2\r\n");
    }

    #[test]
    fn test_header_from_raw() {
        let raw = RawHeader::new(b"Subject".to_vec(), b"Hello, world".to_vec());
        assert_eq!(Header::from(&raw), Header::new("Subject", "Hello, world"));
    }

    #[test]
    fn test_eight_bit_value_keeps_received_bytes() {
        let raw = RawHeader::new(b"X-Name".to_vec(), b"Jos\xe9".to_vec());
        let header = Header::from(&raw);
        assert_eq!(header.value, "Jos\u{fffd}");
        assert_eq!(header.value_bytes(), b"Jos\xe9");
    }

    #[test]
    fn test_reassigned_value_drops_received_bytes() {
        let raw = RawHeader::new(b"X-Name".to_vec(), b"Jos\xe9".to_vec());
        let mut header = Header::from(&raw);
        header.value = "Jose".to_string();
        assert_eq!(header.value_bytes(), b"Jose");

        let raw = RawHeader::new(b"X-Name".to_vec(), b"\xff".to_vec());
        let mut headers: Headers = [Header::from(&raw)].into_iter().collect();
        headers.set("X-Name", "\u{fffd}");
        let header = headers.iter().next().unwrap();
        assert_eq!(header.value_bytes(), "\u{fffd}".as_bytes());
    }
}
