//! Sentinel-delimited framing.
//!
//! A single read from the network may carry part of a frame, exactly one
//! frame, or several frames back to back. [`FrameDecoder`] accumulates raw
//! bytes and hands out one complete frame at a time, keeping whatever follows
//! the sentinel for the next call. [`FrameReader`] drives a decoder from any
//! [`AsyncRead`] source.

use crate::{ProtocolError, DEFAULT_MAX_FRAME_LEN, SENTINEL};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Size of a single receive call.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Serializes an outgoing frame: tag line, one line per field, then the sentinel.
pub fn encode_frame<S: AsRef<str>>(tag: &str, fields: &[S]) -> String {
    let mut frame = String::with_capacity(100);
    frame.push_str(crate::COMMAND_PREFIX);
    frame.push_str(tag);
    frame.push('\n');
    for field in fields {
        frame.push_str(field.as_ref());
        frame.push('\n');
    }
    frame.push_str(SENTINEL);
    frame
}

/// Accumulates received bytes and splits them into sentinel-terminated frames.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already searched for the sentinel.
    scanned: usize,
    max_frame_len: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            max_frame_len,
        }
    }

    /// Appends freshly received bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Removes and returns the next complete frame, sentinel included.
    ///
    /// Returns `Ok(None)` while the sentinel has not been seen yet. Bytes after
    /// the sentinel stay buffered. Fails once more than `max_frame_len` bytes
    /// are pending without a sentinel among them.
    ///
    /// Only bytes added since the previous call are searched, plus enough of
    /// the old tail to catch a sentinel split across reads.
    pub fn next_frame(&mut self) -> Result<Option<String>, ProtocolError> {
        let sentinel = SENTINEL.as_bytes();
        let from = self.scanned.saturating_sub(sentinel.len() - 1);
        if let Some(offset) = self.buffer[from..]
            .windows(sentinel.len())
            .position(|window| window == sentinel)
        {
            let end = from + offset + sentinel.len();
            let frame: Vec<u8> = self.buffer.drain(..end).collect();
            self.scanned = 0;
            return Ok(Some(String::from_utf8_lossy(&frame).into_owned()));
        }
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.max_frame_len {
            return Err(ProtocolError::FrameTooLarge {
                limit: self.max_frame_len,
            });
        }

        Ok(None)
    }

    /// Number of buffered bytes not yet returned as a frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// True when the buffer holds anything besides line breaks and spaces.
    pub fn has_partial_frame(&self) -> bool {
        self.buffer.iter().any(|byte| !byte.is_ascii_whitespace())
    }
}

/// Reads whole frames from a byte stream.
pub struct FrameReader<R> {
    reader: R,
    decoder: FrameDecoder,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_frame_len(reader, DEFAULT_MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(reader: R, max_frame_len: usize) -> Self {
        Self {
            reader,
            decoder: FrameDecoder::with_max_frame_len(max_frame_len),
        }
    }

    /// Waits for the next frame.
    ///
    /// `Ok(None)` means the peer closed the stream between frames. Closing
    /// with a partial frame buffered is [`ProtocolError::Framing`]. The future
    /// is cancel-safe: dropping it never loses bytes already received.
    pub async fn read_frame(&mut self) -> Result<Option<String>, ProtocolError> {
        let mut chunk = [0u8; READ_BUFFER_SIZE];
        loop {
            if let Some(frame) = self.decoder.next_frame()? {
                return Ok(Some(frame));
            }

            let count = self.reader.read(&mut chunk).await?;
            if count == 0 {
                if self.decoder.has_partial_frame() {
                    return Err(ProtocolError::Framing {
                        pending: self.decoder.pending(),
                    });
                }
                return Ok(None);
            }
            self.decoder.extend(&chunk[..count]);
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
