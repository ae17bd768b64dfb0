//! Structured header interpretation.
//!
//! Maps raw header pairs onto [`HeaderInfo`] fields and interprets the body
//! according to `Content-Type`.

use crate::address::{Address, parse_address, parse_address_list};
use crate::content_type::ContentType;
use crate::date::parse_date;
use crate::encoding::generate_message_id;
use crate::error::{Error, Result};
use crate::header::Header;
use crate::message::{Body, Diagnostic, HeaderInfo, Message};
use crate::multipart::split_multipart;
use crate::raw::RawMessage;

/// Header fields with a dedicated [`HeaderInfo`] slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Subject,
    From,
    To,
    Cc,
    Bcc,
    ReplyTo,
    Sender,
    Date,
    MessageId,
    InReplyTo,
    References,
    Comments,
    Keywords,
    ContentType,
}

const RECOGNIZED: &[(&str, Field)] = &[
    ("Subject", Field::Subject),
    ("From", Field::From),
    ("To", Field::To),
    ("Cc", Field::Cc),
    ("Bcc", Field::Bcc),
    ("Reply-To", Field::ReplyTo),
    ("Sender", Field::Sender),
    ("Date", Field::Date),
    ("Message-ID", Field::MessageId),
    ("In-Reply-To", Field::InReplyTo),
    ("References", Field::References),
    ("Comments", Field::Comments),
    ("Keywords", Field::Keywords),
    ("Content-Type", Field::ContentType),
];

impl Field {
    fn lookup(key: &str) -> Option<Self> {
        RECOGNIZED
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|&(_, field)| field)
    }
}

/// Interprets a raw message.
///
/// Every header is kept in `full_headers`; unrecognized ones also go to
/// `opt_headers`. List-valued fields accumulate across repeated headers,
/// single-valued fields take the last occurrence. A missing `Message-ID` is
/// derived from the raw body. An unparsable `Date` leaves the field unset and
/// records a [`Diagnostic`].
///
/// # Errors
///
/// Returns [`Error::AddressParse`] for a malformed address field,
/// [`Error::MissingBoundary`] for a multipart type without boundary, and
/// any error from splitting the multipart body.
pub fn process(raw: RawMessage) -> Result<Message> {
    let mut info = HeaderInfo::default();
    let mut diagnostics = Vec::new();

    for raw_header in &raw.headers {
        let header = Header::from(raw_header);
        info.full_headers.push(header.clone());

        match Field::lookup(&header.key) {
            Some(field) => apply(&mut info, field, &header, &mut diagnostics)?,
            None => info.opt_headers.push(header),
        }
    }

    if info.message_id.is_empty() {
        info.message_id = generate_message_id(&raw.body);
    }

    let body = interpret_body(&info.content_type, raw.body)?;

    Ok(Message {
        header: info,
        body,
        diagnostics,
    })
}

fn apply(
    info: &mut HeaderInfo,
    field: Field,
    header: &Header,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<()> {
    let value = header.value.as_str();
    match field {
        Field::Subject => info.subject = value.to_string(),
        Field::From => info.from.extend(address_list(header)?),
        Field::To => info.to.extend(address_list(header)?),
        Field::Cc => info.cc.extend(address_list(header)?),
        Field::Bcc => info.bcc.extend(address_list(header)?),
        Field::ReplyTo => info.reply_to.extend(address_list(header)?),
        Field::Sender => {
            if !value.trim().is_empty() {
                info.sender = Some(
                    parse_address(value.as_bytes()).map_err(|e| in_field(header, e))?,
                );
            }
        }
        Field::Date => match parse_date(value) {
            Some(date) => info.date = Some(date),
            None => {
                tracing::warn!(value, "ignoring unparsable Date header");
                info.date = None;
                diagnostics.push(Diagnostic::UnparsableDate(value.to_string()));
            }
        },
        Field::MessageId => info.message_id = value.trim().to_string(),
        Field::InReplyTo => info.in_reply_to.extend(whitespace_tokens(value)),
        Field::Comments => info.comments.extend(whitespace_tokens(value)),
        Field::References => info.references.extend(comma_tokens(value)),
        Field::Keywords => info.keywords.extend(comma_tokens(value)),
        Field::ContentType => info.content_type = value.to_string(),
    }
    Ok(())
}

/// An empty address field yields an empty list rather than an error.
fn address_list(header: &Header) -> Result<Vec<Address>> {
    if header.value.trim().is_empty() {
        return Ok(Vec::new());
    }
    parse_address_list(header.value.as_bytes()).map_err(|e| in_field(header, e))
}

fn in_field(header: &Header, error: Error) -> Error {
    match error {
        Error::AddressParse(reason) => Error::AddressParse(format!("{}: {reason}", header.key)),
        other => other,
    }
}

fn whitespace_tokens(value: &str) -> impl Iterator<Item = String> + '_ {
    value.split_whitespace().map(str::to_string)
}

fn comma_tokens(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn interpret_body(content_type: &str, body: Vec<u8>) -> Result<Body> {
    let multipart = if content_type.trim().is_empty() {
        None
    } else {
        match ContentType::parse(content_type) {
            Ok(ct) if ct.is_multipart() => Some(ct),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(content_type, error = %e, "treating body as single part");
                None
            }
        }
    };

    match multipart {
        Some(ct) => {
            let boundary = ct.boundary().ok_or(Error::MissingBoundary)?;
            Ok(Body::Multipart(split_multipart(&body, boundary)?))
        }
        None => Ok(Body::Text(body)),
    }
}
