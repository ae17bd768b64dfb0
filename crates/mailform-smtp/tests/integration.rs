//! Integration tests for SMTP delivery.
//!
//! These tests use a mock stream to simulate SMTP server replies
//! without requiring a real server connection.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailform_mime::Message;
use mailform_smtp::connection::SmtpStream;
use mailform_smtp::{
    Credentials, Envelope, Error, Mailer, Result, Security, SmtpServer, SmtpTransport, Transport,
};

/// Mock stream that returns predefined replies.
struct MockStream {
    /// Replies to return (in order).
    responses: Cursor<Vec<u8>>,
    /// Captured commands sent by the client.
    sent: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    fn new(responses: &str) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let stream = Self {
            responses: Cursor::new(responses.as_bytes().to_vec()),
            sent: Arc::clone(&sent),
        };
        (stream, sent)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.responses.get_ref();
        let pos = usize::try_from(self.responses.position()).unwrap();

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn sent_text(sent: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8(sent.lock().unwrap().clone()).unwrap()
}

fn envelope() -> Envelope {
    Envelope::new(
        "a@example.com".to_string(),
        vec!["b@example.com".to_string(), "c@example.com".to_string()],
    )
}

fn localhost() -> SmtpTransport {
    SmtpTransport::new(SmtpServer::localhost("a@example.com").unwrap())
}

const GREETING: &str = "220 mock.example.com ESMTP ready\r\n";

#[tokio::test]
async fn test_plain_delivery_session() {
    init_tracing();
    let (mock, sent) = MockStream::new(&format!(
        "{GREETING}\
         250-mock.example.com\r\n250 8BITMIME\r\n\
         250 sender ok\r\n\
         250 rcpt ok\r\n\
         250 rcpt ok\r\n\
         354 go ahead\r\n\
         250 queued\r\n\
         221 bye\r\n"
    ));

    localhost()
        .with_client_hostname("client.example.com")
        .deliver(SmtpStream::new(mock), &envelope(), b"Subject: hi\r\n\r\nbody\r\n")
        .await
        .unwrap();

    assert_eq!(
        sent_text(&sent),
        "EHLO client.example.com\r\n\
         MAIL FROM:<a@example.com> BODY=8BITMIME\r\n\
         RCPT TO:<b@example.com>\r\n\
         RCPT TO:<c@example.com>\r\n\
         DATA\r\n\
         Subject: hi\r\n\r\nbody\r\n.\r\n\
         QUIT\r\n"
    );
}

#[tokio::test]
async fn test_auth_plain_session() {
    init_tracing();
    let (mock, sent) = MockStream::new(&format!(
        "{GREETING}\
         250-mock.example.com\r\n250-AUTH LOGIN PLAIN\r\n250 SIZE 1000\r\n\
         235 authenticated\r\n\
         250 ok\r\n250 ok\r\n250 ok\r\n\
         354 go ahead\r\n\
         250 queued\r\n\
         221 bye\r\n"
    ));
    let server = SmtpServer::localhost("a@example.com")
        .unwrap()
        .with_credentials(Credentials::new("user", "pass"));

    SmtpTransport::new(server)
        .deliver(SmtpStream::new(mock), &envelope(), b"x\r\n")
        .await
        .unwrap();

    let sent = sent_text(&sent);
    assert!(sent.contains("AUTH PLAIN AHVzZXIAcGFzcw==\r\n"));
    assert!(sent.contains("MAIL FROM:<a@example.com> SIZE=3\r\n"));
}

#[tokio::test]
async fn test_rejected_recipient_aborts_before_data() {
    let (mock, sent) = MockStream::new(&format!(
        "{GREETING}250 mock\r\n250 ok\r\n550 5.1.1 no such user\r\n"
    ));

    let err = localhost()
        .deliver(SmtpStream::new(mock), &envelope(), b"x")
        .await
        .unwrap_err();

    assert!(err.is_permanent());
    match err {
        Error::SmtpError { code, message } => {
            assert_eq!(code, 550);
            assert_eq!(message, "5.1.1 no such user");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!sent_text(&sent).contains("DATA"));
}

#[tokio::test]
async fn test_unavailable_greeting() {
    let (mock, sent) = MockStream::new("554 no service\r\n");
    let err = localhost()
        .deliver(SmtpStream::new(mock), &envelope(), b"x")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SmtpError { code: 554, .. }));
    assert!(sent_text(&sent).is_empty());
}

#[tokio::test]
async fn test_size_limit_is_enforced_locally() {
    let (mock, sent) = MockStream::new(&format!("{GREETING}250-mock\r\n250 SIZE 10\r\n"));
    let err = localhost()
        .deliver(SmtpStream::new(mock), &envelope(), &[b'x'; 64])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MessageTooLarge(64)));
    assert!(!sent_text(&sent).contains("MAIL FROM"));
}

#[tokio::test]
async fn test_starttls_must_be_advertised() {
    let (mock, _sent) = MockStream::new(&format!("{GREETING}250 mock\r\n"));
    let mut server = SmtpServer::localhost("a@example.com").unwrap();
    server.security = Security::StartTls;

    let err = SmtpTransport::new(server)
        .deliver(SmtpStream::new(mock), &envelope(), b"x")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotSupported(_)));
}

#[tokio::test]
async fn test_server_closing_early_is_protocol_error() {
    let (mock, _sent) = MockStream::new(GREETING);
    let err = localhost()
        .deliver(SmtpStream::new(mock), &envelope(), b"x")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

/// Transport that runs a real SMTP session against one mock stream.
struct MockTransport {
    inner: SmtpTransport,
    stream: Mutex<Option<MockStream>>,
}

impl Transport for MockTransport {
    async fn send(&self, envelope: &Envelope, payload: &[u8]) -> Result<()> {
        let mock = self
            .stream
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| Error::Protocol("transport used twice".into()))?;
        self.inner
            .deliver(SmtpStream::new(mock), envelope, payload)
            .await
    }
}

#[tokio::test]
async fn test_mailer_end_to_end() {
    init_tracing();
    let (mock, sent) = MockStream::new(&format!(
        "{GREETING}250 mock\r\n250 ok\r\n250 ok\r\n250 ok\r\n354 go\r\n250 queued\r\n221 bye\r\n"
    ));
    let server = SmtpServer::localhost("fallback@example.com").unwrap();
    let transport = MockTransport {
        inner: SmtpTransport::new(server.clone()),
        stream: Mutex::new(Some(mock)),
    };
    let mailer = Mailer::new(server, transport);

    let mut message = Message::new_text(
        "Dots",
        "line\r\n.hidden\r\n",
        "\"Alice\" <alice@example.com>",
        ["bob@example.com"],
    )
    .unwrap();
    message
        .header
        .bcc
        .push(mailform_mime::Address::new("carol", "example.com"));

    mailer.send(&message).await.unwrap();

    let sent = sent_text(&sent);
    assert!(sent.contains("MAIL FROM:<alice@example.com>\r\n"));
    assert!(sent.contains("RCPT TO:<bob@example.com>\r\nRCPT TO:<carol@example.com>\r\n"));
    assert!(sent.contains("\r\nline\r\n..hidden\r\n.\r\nQUIT\r\n"));
    assert!(sent.contains("Bcc: carol@example.com\r\n"));
}

#[tokio::test]
async fn test_client_state_machine_with_scripted_io() {
    let io = tokio_test::io::Builder::new()
        .read(b"220 ready\r\n")
        .write(b"EHLO me\r\n")
        .read(b"250-mock\r\n250-8BITMIME\r\n250 SIZE 100\r\n")
        .write(b"MAIL FROM:<a@example.com> BODY=8BITMIME SIZE=5\r\n")
        .read(b"250 ok\r\n")
        .write(b"RCPT TO:<b@example.com>\r\n")
        .read(b"250 ok\r\n")
        .write(b"DATA\r\n")
        .read(b"354 go\r\n")
        .write(b"..x\r\n.\r\n")
        .read(b"250 queued\r\n")
        .write(b"QUIT\r\n")
        .read(b"221 bye\r\n")
        .build();

    let client = mailform_smtp::Client::from_stream(SmtpStream::new(io))
        .await
        .unwrap()
        .ehlo("me")
        .await
        .unwrap();
    assert!(client.capabilities().eight_bit_mime);
    assert_eq!(client.capabilities().max_size, Some(100));

    let client = client
        .mail_from("a@example.com", 5)
        .await
        .unwrap()
        .rcpt_to("b@example.com")
        .await
        .unwrap()
        .send_data(b".x\r\n")
        .await
        .unwrap();
    client.quit().await.unwrap();
}

#[test]
fn test_server_config_serde_round_trip() {
    let server = SmtpServer::gmail("alias@example.com", "me@gmail.com", "secret").unwrap();
    let json = serde_json::to_string(&server).unwrap();
    let back: SmtpServer = serde_json::from_str(&json).unwrap();
    assert_eq!(back, server);
    assert_eq!(back.from.mailbox(), "alias@example.com");
}
