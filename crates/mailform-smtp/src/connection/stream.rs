//! Low-level SMTP stream handling.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

/// Any bidirectional byte stream an SMTP session can run over.
pub trait Io: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

/// SMTP stream: line-oriented reads and flushed writes over TCP, TLS or
/// any other [`Io`].
pub struct SmtpStream {
    reader: BufReader<Box<dyn Io>>,
    tls: bool,
}

impl fmt::Debug for SmtpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpStream").field("tls", &self.tls).finish_non_exhaustive()
    }
}

impl SmtpStream {
    /// Wraps a plain (unencrypted) stream.
    pub fn new(io: impl Io + 'static) -> Self {
        Self {
            reader: BufReader::new(Box::new(io)),
            tls: false,
        }
    }

    /// Returns true if the stream is encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        self.tls
    }

    /// Reads a line from the stream, without its line terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the peer closed the connection.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(Error::Protocol("Connection closed by server".into()));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Writes data to the stream and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let writer = self.reader.get_mut();
        writer.write_all(data).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Upgrades the stream to TLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already encrypted, the hostname is
    /// invalid, or the TLS handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        if self.tls {
            return Err(Error::Protocol("Already using TLS".into()));
        }
        let inner = self.reader.into_inner();
        let tls_stream = tls_connect(hostname, inner).await?;
        Ok(Self {
            reader: BufReader::new(Box::new(tls_stream)),
            tls: true,
        })
    }
}

/// Connects to an SMTP server over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect(hostname: &str, port: u16) -> Result<SmtpStream> {
    let addr = format!("{hostname}:{port}");
    let stream = TcpStream::connect(&addr).await?;
    tracing::debug!(%addr, "connected");
    Ok(SmtpStream::new(stream))
}

/// Connects to an SMTP server over TLS (implicit TLS on port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16) -> Result<SmtpStream> {
    let addr = format!("{hostname}:{port}");
    let tcp_stream = TcpStream::connect(&addr).await?;
    let tls_stream = tls_connect(hostname, tcp_stream).await?;
    tracing::debug!(%addr, "connected with TLS");
    Ok(SmtpStream {
        reader: BufReader::new(Box::new(tls_stream)),
        tls: true,
    })
}

async fn tls_connect<S>(hostname: &str, stream: S) -> Result<tokio_rustls::client::TlsStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("Invalid hostname: {hostname}")))?;
    create_tls_connector()
        .connect(server_name, stream)
        .await
        .map_err(handshake_error)
}

/// tokio-rustls reports handshake failures as `io::Error` wrapping the
/// rustls error.
fn handshake_error(error: io::Error) -> Error {
    if let Some(tls) = error
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    {
        return Error::Tls(tls.clone());
    }
    Error::Io(error)
}

/// Creates a TLS connector with the bundled web PKI roots.
fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_lines_and_write() {
        let (client, mut server) = tokio::io::duplex(256);
        let mut stream = SmtpStream::new(client);

        server.write_all(b"220 ready\r\n250 ok\n").await.unwrap();
        assert_eq!(stream.read_line().await.unwrap(), "220 ready");
        assert_eq!(stream.read_line().await.unwrap(), "250 ok");

        stream.write_all(b"QUIT\r\n").await.unwrap();
        let mut buf = [0u8; 6];
        tokio::io::AsyncReadExt::read_exact(&mut server, &mut buf)
            .await
            .unwrap();
        assert_eq!(&buf, b"QUIT\r\n");
    }

    #[tokio::test]
    async fn test_eof_is_protocol_error() {
        let (client, server) = tokio::io::duplex(16);
        drop(server);
        let mut stream = SmtpStream::new(client);
        assert!(matches!(stream.read_line().await, Err(Error::Protocol(_))));
        assert!(!stream.is_tls());
    }

    #[test]
    fn test_handshake_failure_maps_to_tls_error() {
        let failure = io::Error::new(
            io::ErrorKind::InvalidData,
            rustls::Error::General("bad certificate".into()),
        );
        assert!(matches!(handshake_error(failure), Error::Tls(_)));

        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert!(matches!(handshake_error(reset), Error::Io(_)));
    }
}
