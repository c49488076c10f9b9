//! Connection — wraps a stream and speaks the client side of IRC.
//!
//! Inbound traffic is read as raw chunks (framing belongs to
//! [`LineFramer`](super::framer::LineFramer)); outbound lines go through a
//! [`FramedWrite`] that appends the `\r\n` terminator. Typed senders keep
//! RFC 1459/2812 command assembly in one place, so callers never splice
//! wire syntax themselves.

use std::io;

use bytes::BytesMut;
use futures::SinkExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio_util::codec::{Encoder, FramedWrite};
use tracing::{debug, warn};

use super::framer::MAX_LINE_LENGTH;

/// Encodes one outbound line, appending `\r\n`.
///
/// Content longer than 510 bytes cannot fit a legal IRC line; such sends
/// are refused with a warning rather than truncated or split.
#[derive(Debug, Default)]
pub struct LineEncoder;

impl<'a> Encoder<&'a str> for LineEncoder {
    type Error = io::Error;

    fn encode(&mut self, line: &'a str, dst: &mut BytesMut) -> io::Result<()> {
        if line.len() > MAX_LINE_LENGTH - 2 {
            warn!(length = line.len(), "refusing to send overlong line");
            return Ok(());
        }
        dst.reserve(line.len() + 2);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

/// One live connection to an IRC server (or, in tests, any duplex stream).
#[derive(Debug)]
pub struct Connection<S> {
    reader: ReadHalf<S>,
    writer: FramedWrite<WriteHalf<S>, LineEncoder>,
}

impl Connection<TcpStream> {
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        Ok(Self::new(stream))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub fn new(stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader,
            writer: FramedWrite::new(writer, LineEncoder),
        }
    }

    /// Read a raw chunk of bytes. Returns 0 when the peer closed.
    pub async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf).await
    }

    /// Send one pre-assembled line (terminator appended by the encoder).
    pub async fn send(&mut self, line: &str) -> io::Result<()> {
        debug!(%line, "send");
        self.writer.send(line).await
    }

    /// Flush and shut down the write side.
    pub async fn close(&mut self) -> io::Result<()> {
        debug!("closing connection");
        self.writer.close().await
    }

    // ── Typed senders (RFC 1459 / RFC 2812) ──────────────────────

    /// RFC 2812 3.1.1 — PASS must precede NICK and USER.
    pub async fn password(&mut self, password: &str) -> io::Result<()> {
        self.send(&format!("PASS {password}")).await
    }

    /// RFC 2812 3.1.2.
    pub async fn nick(&mut self, nickname: &str) -> io::Result<()> {
        debug_assert!(!nickname.contains(' '));
        self.send(&format!("NICK {nickname}")).await
    }

    /// RFC 2812 3.1.3 — "user mode unused :realname".
    pub async fn user(&mut self, username: &str, realname: &str) -> io::Result<()> {
        self.send(&format!("USER {username} 0 * :{realname}")).await
    }

    /// RFC 2812 3.2.1.
    pub async fn join(&mut self, channel: &str) -> io::Result<()> {
        debug_assert!(channel.starts_with('#'));
        self.send(&format!("JOIN {channel}")).await
    }

    /// RFC 2812 3.3.1. Empty text is silently skipped — the wire format
    /// cannot carry it.
    pub async fn privmsg(&mut self, target: &str, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.send(&format!("PRIVMSG {target} :{text}")).await
    }

    /// RFC 2812 3.3.2.
    pub async fn notice(&mut self, target: &str, text: &str) -> io::Result<()> {
        self.send(&format!("NOTICE {target} :{text}")).await
    }

    /// RFC 2812 3.7.3 — params echoed verbatim from the PING probe.
    pub async fn pong(&mut self, params: &str) -> io::Result<()> {
        self.send(&format!("PONG {params}")).await
    }

    /// RFC 2812 3.1.7.
    pub async fn quit(&mut self, message: &str) -> io::Result<()> {
        self.send(&format!("QUIT :{message}")).await
    }
}
