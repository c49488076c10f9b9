//! Line framer — turns a fragmented TCP byte stream into complete IRC lines.
//!
//! Owns the receive buffer. Each call to [`LineFramer::ingest`] appends a
//! newly received chunk and returns every line completed by it; trailing
//! incomplete bytes stay buffered for the next call. Lines are complete
//! only when terminated by `\r\n` (per RFC 2812) and no longer than
//! [`MAX_LINE_LENGTH`] bytes including the terminator. Anything overlong
//! is dropped and reported, never fatal to the stream.

use bytes::{Buf, BytesMut};
use tracing::warn;

/// Maximum line length (including `\r\n`). RFC 2812 says 512 bytes.
pub const MAX_LINE_LENGTH: usize = 512;

/// Buffer-owning incremental line extractor.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: BytesMut,
    /// Set while skipping an overlong run that has not terminated yet.
    discarding: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a received chunk and extract every line it completes.
    ///
    /// Returned frames have the `\r\n` stripped, in wire order. A `\r\n`
    /// split across two chunks is recognized once the second arrives.
    pub fn ingest(&mut self, chunk: &[u8]) -> Vec<BytesMut> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();

        loop {
            match self.buf.windows(2).position(|w| w == b"\r\n") {
                Some(pos) if self.discarding => {
                    // Tail of an overlong run: drop through the terminator.
                    self.buf.advance(pos + 2);
                    self.discarding = false;
                }
                Some(pos) if pos + 2 > MAX_LINE_LENGTH => {
                    warn!(length = pos + 2, "dropping overlong line");
                    self.buf.advance(pos + 2);
                }
                Some(pos) => {
                    let frame = self.buf.split_to(pos);
                    self.buf.advance(2); // skip \r\n
                    frames.push(frame);
                }
                None => {
                    // No complete line. A partial already at the limit can
                    // never terminate within it, so stop buffering it.
                    if !self.discarding && self.buf.len() >= MAX_LINE_LENGTH {
                        warn!(buffered = self.buf.len(), "unterminated overlong line, discarding");
                        self.discarding = true;
                    }
                    if self.discarding {
                        // Keep a lone trailing CR; its LF may be in the
                        // next chunk.
                        let keep = usize::from(self.buf.last() == Some(&b'\r'));
                        let drop = self.buf.len() - keep;
                        self.buf.advance(drop);
                    }
                    break;
                }
            }
        }

        frames
    }
}
