//! Message construction.

use crate::address::{Address, parse_address, parse_address_list};
use crate::content_type::ContentType;
use crate::encoding::{encode_rfc2047, generate_message_id};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Body, HeaderInfo, Message, Part};
use crate::render::{check_header_name, render_body};
use chrono::{DateTime, FixedOffset, SubsecRound, Utc};

/// Builder for outgoing messages.
///
/// Addresses are given as text and parsed on [`build`](Self::build). The
/// subject is RFC 2047 encoded when it is not plain ASCII. `Reply-To`
/// defaults to `From` unless set explicitly, `Date` defaults to now and the
/// `Message-ID` is derived from the rendered body.
///
/// # Example
///
/// ```ignore
/// use mailform_mime::MessageBuilder;
///
/// let message = MessageBuilder::new()
///     .from("alice@example.com")
///     .to("bob@example.com")
///     .subject("Lunch")
///     .text_body("Noon?")
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    subject: String,
    from: Option<String>,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    reply_to: Vec<String>,
    date: Option<DateTime<FixedOffset>>,
    text: Option<String>,
    html: Option<String>,
    multipart: Option<(String, Vec<Part>)>,
    headers: Headers,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the author. May be a comma-separated list.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Adds a `To` recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds a `Cc` recipient.
    #[must_use]
    pub fn cc(mut self, recipient: impl Into<String>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Adds a `Bcc` recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: impl Into<String>) -> Self {
        self.bcc.push(recipient.into());
        self
    }

    /// Adds a `Reply-To` address.
    #[must_use]
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to.push(address.into());
        self
    }

    /// Sets the date.
    #[must_use]
    pub const fn date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets a plain text body.
    #[must_use]
    pub fn text_body(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets an HTML body. Combined with a text body this produces
    /// `multipart/alternative`.
    #[must_use]
    pub fn html_body(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Sets a `multipart/mixed` body. Takes precedence over text and HTML
    /// bodies.
    #[must_use]
    pub fn multipart(mut self, boundary: impl Into<String>, parts: Vec<Part>) -> Self {
        self.multipart = Some((boundary.into(), parts));
        self
    }

    /// Adds an extra header, kept in `opt_headers`.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Builds the message.
    ///
    /// # Errors
    ///
    /// Returns an error if an address does not parse, no author was set, an
    /// extra header name is invalid, or a multipart body is empty.
    pub fn build(self) -> Result<Message> {
        let from_text = self
            .from
            .ok_or_else(|| Error::address("From: no author given"))?;
        let from = parse_address_list(from_text.as_bytes())?;
        let to = parse_each(&self.to)?;
        let cc = parse_each(&self.cc)?;
        let bcc = parse_each(&self.bcc)?;
        let reply_to = if self.reply_to.is_empty() {
            from.clone()
        } else {
            parse_each(&self.reply_to)?
        };

        let (content_type, body) = match (self.multipart, self.text, self.html) {
            (Some((boundary, parts)), _, _) => (
                ContentType::multipart_mixed(boundary),
                Body::Multipart(parts),
            ),
            (None, Some(text), Some(html)) => alternative(text, html),
            (None, None, Some(html)) => (ContentType::text_html(), Body::Text(html.into_bytes())),
            (None, text, None) => (
                ContentType::text_plain(),
                Body::Text(text.unwrap_or_default().into_bytes()),
            ),
        };
        let content_type = content_type.to_string();
        let message_id = generate_message_id(&render_body(&content_type, &body)?);

        let mut opt_headers = Headers::new();
        opt_headers.add("MIME-Version", "1.0");
        for header in &self.headers {
            check_header_name(&header.key)?;
            opt_headers.push(header.clone());
        }

        let header = HeaderInfo {
            opt_headers,
            message_id,
            date: Some(
                self.date
                    .unwrap_or_else(|| Utc::now().trunc_subsecs(0).fixed_offset()),
            ),
            from,
            reply_to,
            to,
            cc,
            bcc,
            subject: encode_rfc2047(&self.subject, "utf-8")?,
            content_type,
            ..HeaderInfo::default()
        };

        Ok(Message {
            header,
            body,
            diagnostics: Vec::new(),
        })
    }
}

fn parse_each(addresses: &[String]) -> Result<Vec<Address>> {
    addresses
        .iter()
        .map(|a| parse_address(a.as_bytes()))
        .collect()
}

fn alternative(text: String, html: String) -> (ContentType, Body) {
    let mut seed = text.clone().into_bytes();
    seed.extend_from_slice(html.as_bytes());
    let boundary = format!("alt-{}", generate_message_id(&seed));

    let part = |ct: ContentType, content: String| {
        let mut headers = Headers::new();
        headers.add("Content-Type", ct.to_string());
        Part::new(headers, content.into_bytes())
    };
    let parts = vec![
        part(ContentType::text_plain(), text),
        part(ContentType::text_html(), html),
    ];
    (
        ContentType::multipart_alternative(boundary),
        Body::Multipart(parts),
    )
}

impl Message {
    /// Creates a plain text message with the minimum headers.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` or a recipient does not parse.
    pub fn new_text<I, S>(
        subject: impl Into<String>,
        content: impl Into<String>,
        from: impl Into<String>,
        to: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        to.into_iter()
            .fold(MessageBuilder::new().from(from), |b, r| b.to(r))
            .subject(subject)
            .text_body(content)
            .build()
    }

    /// Creates an HTML message with the minimum headers.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` or a recipient does not parse.
    pub fn new_html<I, S>(
        subject: impl Into<String>,
        content: impl Into<String>,
        from: impl Into<String>,
        to: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        to.into_iter()
            .fold(MessageBuilder::new().from(from), |b, r| b.to(r))
            .subject(subject)
            .html_body(content)
            .build()
    }
}
