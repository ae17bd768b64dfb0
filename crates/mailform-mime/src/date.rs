//! Origination date parsing and formatting.

use chrono::{DateTime, FixedOffset};

/// A timestamp layout accepted in the `Date` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// A `chrono` format string.
    Pattern(&'static str),
    /// RFC 2822 parsing, including obsolete zone names such as `GMT` or `EST`.
    Rfc2822,
}

/// Accepted `Date` layouts, tried in order. The first is also the layout
/// used when rendering.
pub const DATE_FORMATS: &[DateFormat] = &[
    DateFormat::Pattern("%a, %d %b %Y %H:%M:%S %z"),
    DateFormat::Pattern("%d %b %Y %H:%M:%S %z"),
    DateFormat::Pattern("%a, %d %b %Y %H:%M %z"),
    DateFormat::Pattern("%d %b %Y %H:%M %z"),
    DateFormat::Rfc2822,
];

const RENDER_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Parses a `Date` header value against [`DATE_FORMATS`].
///
/// A trailing comment such as `(UTC)` is ignored. Returns `None` if no
/// format matches.
#[must_use]
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = strip_trailing_comment(value.trim());
    DATE_FORMATS.iter().find_map(|format| match format {
        DateFormat::Pattern(pattern) => DateTime::parse_from_str(value, pattern).ok(),
        DateFormat::Rfc2822 => DateTime::parse_from_rfc2822(value).ok(),
    })
}

/// Formats a timestamp with the first accepted layout.
#[must_use]
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.format(RENDER_FORMAT).to_string()
}

fn strip_trailing_comment(value: &str) -> &str {
    if value.ends_with(')') {
        if let Some(open) = value.rfind('(') {
            return value[..open].trim_end();
        }
    }
    value
}
