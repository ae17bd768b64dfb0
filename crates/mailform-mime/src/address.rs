//! Mailbox address parsing.
//!
//! Accepts `local@domain`, `<local@domain>`, `Name <local@domain>` and
//! `"Quoted, Name" <local@domain>`, and comma-separated lists of those.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A mailbox with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    /// Display name, unquoted.
    pub name: Option<String>,
    /// Part before the `@`.
    pub local_part: String,
    /// Part after the `@`.
    pub domain: String,
}

impl Address {
    /// Creates an address without a display name.
    #[must_use]
    pub fn new(local_part: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: None,
            local_part: local_part.into(),
            domain: domain.into(),
        }
    }

    /// Creates an address with a display name.
    #[must_use]
    pub fn with_name(
        name: impl Into<String>,
        local_part: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            local_part: local_part.into(),
            domain: domain.into(),
        }
    }

    /// Returns the bare `local@domain` form, as used in SMTP envelopes.
    #[must_use]
    pub fn mailbox(&self) -> String {
        format!("{}@{}", self.local_part, self.domain)
    }

    /// Parses a single address from text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressParse`] if the text is not a valid address.
    pub fn parse(text: &str) -> Result<Self> {
        parse_single(text)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => {
                f.write_str("\"")?;
                for c in name.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, "\" <{}@{}>", self.local_part, self.domain)
            }
            None => write!(f, "{}@{}", self.local_part, self.domain),
        }
    }
}

/// Parses a single address.
///
/// # Errors
///
/// Returns [`Error::AddressParse`] on empty input, a mailbox without `@`,
/// an unterminated angle bracket or quoted name, or trailing garbage.
pub fn parse_address(input: &[u8]) -> Result<Address> {
    parse_single(as_text(input)?)
}

/// Parses a comma-separated address list.
///
/// The list fails as a whole if any element fails; no partial list is
/// returned.
///
/// # Errors
///
/// Returns [`Error::AddressParse`] on empty input, a dangling or doubled
/// comma, or any element that fails [`parse_address`].
pub fn parse_address_list(input: &[u8]) -> Result<Vec<Address>> {
    let text = as_text(input)?;
    if text.trim().is_empty() {
        return Err(Error::address("empty address list"));
    }

    split_top_level(text)
        .into_iter()
        .map(|element| {
            if element.trim().is_empty() {
                Err(Error::address(format!("dangling comma in {text:?}")))
            } else {
                parse_single(element)
            }
        })
        .collect()
}

fn as_text(input: &[u8]) -> Result<&str> {
    std::str::from_utf8(input).map_err(|_| Error::address("address is not valid UTF-8"))
}

fn parse_single(text: &str) -> Result<Address> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::address("empty address"));
    }

    let Some(open) = find_unquoted(text, '<') else {
        if find_unquoted(text, '>').is_some() {
            return Err(Error::address(format!("unmatched '>' in {text:?}")));
        }
        let (local_part, domain) = parse_mailbox_spec(text)?;
        return Ok(Address {
            name: None,
            local_part,
            domain,
        });
    };

    let rest = &text[open + 1..];
    let close = rest
        .find('>')
        .ok_or_else(|| Error::address(format!("unterminated angle bracket in {text:?}")))?;
    if !rest[close + 1..].trim().is_empty() {
        return Err(Error::address(format!("unexpected text after '>' in {text:?}")));
    }

    let name = parse_display_name(&text[..open])?;
    let (local_part, domain) = parse_mailbox_spec(&rest[..close])?;
    Ok(Address {
        name,
        local_part,
        domain,
    })
}

fn parse_display_name(raw: &str) -> Result<Option<String>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let Some(quoted) = raw.strip_prefix('"') else {
        return Ok(Some(raw.to_string()));
    };

    let mut name = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    name.push(escaped);
                }
            }
            '"' => {
                if !chars.as_str().trim().is_empty() {
                    return Err(Error::address(format!(
                        "unexpected text after quoted name in {raw:?}"
                    )));
                }
                return Ok((!name.is_empty()).then_some(name));
            }
            _ => name.push(c),
        }
    }

    Err(Error::address(format!("unterminated quoted name in {raw:?}")))
}

fn parse_mailbox_spec(spec: &str) -> Result<(String, String)> {
    let spec = spec.trim();
    let (local, domain) = spec
        .rsplit_once('@')
        .ok_or_else(|| Error::address(format!("missing '@' in {spec:?}")))?;

    if local.is_empty() {
        return Err(Error::address(format!("empty local part in {spec:?}")));
    }
    if domain.is_empty() {
        return Err(Error::address(format!("empty domain in {spec:?}")));
    }
    if domain.contains(char::is_whitespace) || domain.contains(['<', '>', ',']) {
        return Err(Error::address(format!("invalid domain in {spec:?}")));
    }
    if !local.starts_with('"') && local.contains(char::is_whitespace) {
        return Err(Error::address(format!("whitespace in local part of {spec:?}")));
    }

    Ok((local.to_string(), domain.to_string()))
}

/// Finds `target` outside of double quotes.
fn find_unquoted(text: &str, target: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' && in_quotes {
            escaped = true;
        } else if c == '"' {
            in_quotes = !in_quotes;
        } else if c == target && !in_quotes {
            return Some(i);
        }
    }
    None
}

/// Splits on commas that are outside quotes and angle brackets.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut elements = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' if !in_angle => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                elements.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    elements.push(&text[start..]);
    elements
}
