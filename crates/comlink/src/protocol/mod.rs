//! Pluggable frame recognizers.
//!
//! A [`ComProtocol`] looks at the bytes a link has accumulated and answers
//! with a [`ParseStatus`]:
//!
//! ```text
//!            NotAFrame          MidFrame             FoundFrame
//! rx ──► "not mine, try    "mine so far, send   "complete: response is in
//!         the next one"     me more bytes"        the buffer, clear rx"
//! ```
//!
//! Rules every implementation follows:
//!
//! - Reject cheaply. A wrong leading byte must yield `NotAFrame` without
//!   scanning the rest of the buffer; the link asks every protocol on every
//!   byte while idle.
//! - Rejection is stateless. State may only be kept while a match is in
//!   progress, and must be dropped in [`ComProtocol::reset`], which the link
//!   calls whenever it abandons the match.
//! - `parse` runs to completion without blocking.

pub mod ascii;
pub mod binary;

use core::fmt;

use thiserror_no_std::Error;

use crate::config::DEFAULT_PARSE_TIMEOUT_MS;

/// Whether the link should call [`ComProtocol::follow_up`] after the
/// response to a frame has been transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FollowUp {
    /// Nothing to do after the response.
    #[default]
    None,
    /// Call `follow_up()` once the response is out.
    Requested,
}

/// Outcome of offering the accumulated bytes to a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseStatus {
    /// The bytes are not (the start of) a frame of this protocol.
    NotAFrame,
    /// The bytes are a proper prefix of a frame of this protocol.
    MidFrame,
    /// The bytes are exactly one complete frame.
    FoundFrame(FollowUp),
}

/// A frame recognizer and responder, registered with a [`ComLink`](crate::ComLink).
pub trait ComProtocol {
    /// How long a started match may wait for its remaining bytes.
    fn parse_timeout_ms(&self) -> u64 {
        DEFAULT_PARSE_TIMEOUT_MS
    }

    /// Classify `rx`, writing any response for a complete frame to
    /// `response`.
    fn parse(&mut self, rx: &[u8], response: &mut ResponseBuffer<'_>) -> ParseStatus;

    /// Runs after the response to a frame returning
    /// `FoundFrame(FollowUp::Requested)` has been handed to the device.
    fn follow_up(&mut self) {}

    /// Forget any partial-match state. Called on every abandoned match.
    fn reset(&mut self) {}
}

/// The response did not fit in the link's response storage.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("response buffer full")]
pub struct BufferFull;

/// Append-only view over the link's response storage, handed to
/// [`ComProtocol::parse`].
///
/// Implements [`core::fmt::Write`] so text protocols can `write!` replies.
pub struct ResponseBuffer<'b> {
    buf: &'b mut [u8],
    len: usize,
}

impl<'b> ResponseBuffer<'b> {
    /// Empty response over `buf`.
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Append `bytes`. On overflow nothing is written.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), BufferFull> {
        let end = self.len.checked_add(bytes.len()).ok_or(BufferFull)?;
        let dst = self.buf.get_mut(self.len..end).ok_or(BufferFull)?;
        dst.copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    /// Append one byte.
    pub fn push(&mut self, byte: u8) -> Result<(), BufferFull> {
        self.write(&[byte])
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.get(..self.len).unwrap_or_default()
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when nothing was written.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Space left.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.len)
    }

    /// Discard what was written.
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl fmt::Write for ResponseBuffer<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use core::fmt::Write as _;

    #[test]
    fn writes_accumulate() {
        let mut storage = [0u8; 8];
        let mut response = ResponseBuffer::new(&mut storage);
        response.write(b"ab").unwrap();
        response.push(b'c').unwrap();
        assert_eq!(response.as_bytes(), b"abc");
        assert_eq!(response.remaining(), 5);
    }

    #[test]
    fn overflow_writes_nothing() {
        let mut storage = [0u8; 4];
        let mut response = ResponseBuffer::new(&mut storage);
        response.write(b"abc").unwrap();
        assert_eq!(response.write(b"de"), Err(BufferFull));
        assert_eq!(response.as_bytes(), b"abc");
    }

    #[test]
    fn formatted_replies() {
        let mut storage = [0u8; 16];
        let mut response = ResponseBuffer::new(&mut storage);
        writeln!(response, "$rate={}", 50).unwrap();
        assert_eq!(response.as_bytes(), b"$rate=50\n");
        response.clear();
        assert!(response.is_empty());
    }
}
