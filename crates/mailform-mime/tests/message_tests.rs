//! End-to-end parsing and rendering tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use mailform_mime::{
    Address, Body, Diagnostic, Error, Headers, Message, MessageBuilder, Part, encoding, parse,
    parse_address_list, parse_raw, process, split_multipart,
};

/// Compares two messages ignoring `full_headers`, whose order and content
/// legitimately change across a render.
fn assert_same_message(left: &Message, right: &Message) {
    let (l, r) = (&left.header, &right.header);
    assert_eq!(l.opt_headers, r.opt_headers);
    assert_eq!(l.message_id, r.message_id);
    assert_eq!(l.date, r.date);
    assert_eq!(l.from, r.from);
    assert_eq!(l.sender, r.sender);
    assert_eq!(l.reply_to, r.reply_to);
    assert_eq!(l.to, r.to);
    assert_eq!(l.cc, r.cc);
    assert_eq!(l.bcc, r.bcc);
    assert_eq!(l.subject, r.subject);
    assert_eq!(l.comments, r.comments);
    assert_eq!(l.keywords, r.keywords);
    assert_eq!(l.content_type, r.content_type);
    assert_eq!(l.in_reply_to, r.in_reply_to);
    assert_eq!(l.references, r.references);
    assert_eq!(left.body, right.body);
}

fn reparse(message: &Message) -> Message {
    let mut again = parse(&message.render().unwrap()).unwrap();
    again.normalize();
    again
}

const THREADED: &str = concat!(
    "Return-Path: <alice@example.com>\r\n",
    "Message-ID: <1234@example.com>\r\n",
    "Date: Fri, 21 Nov 1997 09:55:06 -0600\r\n",
    "From: \"Alice Liddell\" <alice@example.com>\r\n",
    "To: bob@example.org,\r\n",
    "  \"Carol \\\"C\\\" Lewis\" <carol@example.net>\r\n",
    "Cc: dave@example.com\r\n",
    "Subject: Re: Tea party\r\n",
    "In-Reply-To: <1000@example.org>\r\n",
    "References: <999@example.org>, <1000@example.org>\r\n",
    "Keywords: tea, party\r\n",
    "Comments: sent from the garden\r\n",
    "X-Priority: 3\r\n",
    "\r\n",
    "See you at four.\r\n",
);

#[test]
fn test_processes_simple_message() {
    let message = parse(b"Subject: Hello, world\r\n\r\nG'day, mate.\r\n").unwrap();
    assert_eq!(message.header.subject, "Hello, world");
    assert_eq!(message.text(), Some("G'day, mate.\r\n"));
    assert_eq!(message.header.full_headers.len(), 1);
}

#[test]
fn test_processes_threaded_message() {
    let message = parse(THREADED.as_bytes()).unwrap();
    let h = &message.header;

    assert_eq!(h.message_id, "<1234@example.com>");
    assert_eq!(h.from[0].name.as_deref(), Some("Alice Liddell"));
    assert_eq!(h.to.len(), 2);
    assert_eq!(h.to[1].name.as_deref(), Some("Carol \"C\" Lewis"));
    assert_eq!(h.to[1].mailbox(), "carol@example.net");
    assert_eq!(h.cc, vec![Address::new("dave", "example.com")]);
    assert_eq!(h.in_reply_to, vec!["<1000@example.org>"]);
    assert_eq!(h.references, vec!["<999@example.org>", "<1000@example.org>"]);
    assert_eq!(h.keywords, vec!["tea", "party"]);
    assert_eq!(h.comments, vec!["sent", "from", "the", "garden"]);
    assert_eq!(h.date.unwrap().to_rfc3339(), "1997-11-21T09:55:06-06:00");
    assert_eq!(h.full_headers.len(), 12);

    let opt: Vec<_> = h.opt_headers.iter().map(|h| h.key.as_str()).collect();
    assert_eq!(opt, vec!["Return-Path", "X-Priority"]);
    assert!(message.diagnostics.is_empty());
}

#[test]
fn test_threaded_message_round_trips() {
    let mut message = parse(THREADED.as_bytes()).unwrap();
    message.normalize();
    assert_same_message(&message, &reparse(&message));
}

#[test]
fn test_render_is_stable_after_one_pass() {
    let first = parse(THREADED.as_bytes()).unwrap().render().unwrap();
    let second = parse(&first).unwrap().render().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_multipart_round_trip() {
    let mut plain = Headers::new();
    plain.add("Content-Type", "text/plain; charset=utf-8");
    let mut html = Headers::new();
    html.add("Content-Type", "text/html; charset=utf-8");
    html.add("Content-ID", "<part2@example.com>");

    let parts = vec![
        Part::new(plain, b"plain text\r\nsecond line".to_vec()),
        Part::new(html, b"<p>markup</p>\r\n".to_vec()),
    ];
    let message = MessageBuilder::new()
        .from("alice@example.com")
        .to("bob@example.com")
        .subject("Parts")
        .multipart("frontier", parts.clone())
        .build()
        .unwrap();

    let rendered = message.render().unwrap();
    let raw = parse_raw(&rendered).unwrap();
    let split = split_multipart(&raw.body, "frontier").unwrap();
    assert_eq!(split, parts);

    let reparsed = reparse(&message);
    assert_eq!(reparsed.parts(), parts.as_slice());
    assert_eq!(reparsed.header.message_id, message.header.message_id);
}

#[test]
fn test_missing_message_id_is_deterministic() {
    let input = b"Subject: one\r\n\r\nsame body\r\n";
    let other = b"Subject: two\r\nX-Other: 1\r\n\r\nsame body\r\n";

    let first = parse(input).unwrap();
    let second = parse(input).unwrap();
    let third = parse(other).unwrap();

    assert_eq!(first.header.message_id, second.header.message_id);
    assert_eq!(first.header.message_id, third.header.message_id);
    assert_eq!(
        first.header.message_id,
        encoding::generate_message_id(b"same body\r\n")
    );
    assert_eq!(first.header.message_id.len(), encoding::MESSAGE_ID_LEN);
}

#[test]
fn test_address_list_is_all_or_nothing() {
    let list = parse_address_list(b"a@x.com, b@y.com").unwrap();
    assert_eq!(list, vec![Address::new("a", "x.com"), Address::new("b", "y.com")]);

    assert!(parse_address_list(b"a@x.com, not-an-address, b@y.com").is_err());
    assert!(parse_address_list(b"not-an-address, b@y.com").is_err());
    assert!(parse_address_list(b"a@x.com, b@").is_err());
}

#[test]
fn test_bad_address_header_names_the_field() {
    let err = parse(b"Cc: a@x.com, broken\r\n\r\n").unwrap_err();
    match err {
        Error::AddressParse(reason) => assert!(reason.starts_with("Cc:"), "{reason}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unparsable_date_is_a_diagnostic() {
    let message = parse(b"Date: someday soon\r\nSubject: x\r\n\r\n").unwrap();
    assert!(message.header.date.is_none());
    assert_eq!(
        message.diagnostics,
        vec![Diagnostic::UnparsableDate("someday soon".to_string())]
    );
    assert_eq!(message.header.subject, "x");
}

#[test]
fn test_multipart_without_boundary_fails() {
    let err = parse(b"Content-Type: multipart/mixed\r\n\r\n--x\r\n\r\na\r\n--x--\r\n").unwrap_err();
    assert!(matches!(err, Error::MissingBoundary));
}

#[test]
fn test_raw_then_process_matches_parse() {
    let raw = parse_raw(THREADED.as_bytes()).unwrap();
    assert_eq!(raw.headers.len(), 12);
    assert_eq!(process(raw).unwrap(), parse(THREADED.as_bytes()).unwrap());
}

#[test]
fn test_built_message_parses_back() {
    let message = Message::new_text(
        "Größe",
        "body\r\n",
        "\"Alice\" <alice@example.com>",
        ["bob@example.com"],
    )
    .unwrap();
    let reparsed = reparse(&message);

    assert_eq!(reparsed.header.decoded_subject().unwrap(), "Größe");
    assert_eq!(reparsed.header.reply_to, message.header.from);
    assert_eq!(reparsed.header.date, message.header.date);
    assert_eq!(reparsed.header.opt_headers.get("MIME-Version"), Some("1.0"));
    assert_eq!(reparsed.body, Body::Text(b"body\r\n".to_vec()));
}

const LATIN1: &[u8] = b"From: jose@example.com\r\n\
Subject: Caf\xe9 con leche\r\n\
Message-ID: <latin1@example.com>\r\n\
Content-Type: text/plain; charset=iso-8859-1\r\n\
X-Name: Jos\xe9\r\n\
\r\n\
Un caf\xe9, por favor.\r\n";

#[test]
fn test_eight_bit_message_round_trips_byte_for_byte() {
    let mut message = parse(LATIN1).unwrap();
    message.normalize();
    assert_eq!(
        message.body,
        Body::Text(b"Un caf\xe9, por favor.\r\n".to_vec())
    );
    assert!(message.text().is_none());
    let name = message.header.opt_headers.iter().next().unwrap();
    assert_eq!(name.value_bytes(), b"Jos\xe9");

    let rendered = message.render().unwrap();
    assert!(rendered.ends_with(b"\r\n\r\nUn caf\xe9, por favor.\r\n"));
    assert!(
        rendered
            .windows(b"X-Name: Jos\xe9\r\n".len())
            .any(|w| w == b"X-Name: Jos\xe9\r\n")
    );
    assert!(
        rendered
            .windows(b"Subject: Caf\xe9 con leche\r\n".len())
            .any(|w| w == b"Subject: Caf\xe9 con leche\r\n")
    );

    let reparsed = reparse(&message);
    assert_same_message(&message, &reparsed);
    assert_eq!(reparsed.render().unwrap(), rendered);
}

#[test]
fn test_injected_header_name_is_rejected() {
    let mut message = parse(b"Subject: s\r\nMessage-ID: id\r\n\r\nbody\r\n").unwrap();
    message.header.opt_headers.add("X-A: 1\r\nBcc", "evil@x.com");
    assert!(matches!(message.render(), Err(Error::InvalidHeaderName(_))));
}
