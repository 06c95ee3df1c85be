//! Length-prefixed binary frames with a CRC-32 trailer.
//!
//! # Frame layout
//!
//! ```text
//! ┌──────┬──────┬──────────┬──────────┬─────────────┬────────────┐
//! │ 0xA5 │ 0x5A │ id (LE)  │ len (LE) │ payload     │ crc32 (LE) │
//! │  1B  │  1B  │   2B     │   2B     │ len bytes   │    4B      │
//! └──────┴──────┴──────────┴──────────┴─────────────┴────────────┘
//!                └──────── covered by the CRC ──────┘
//! ```
//!
//! `len` is bounded by [`MAX_PAYLOAD`]; a larger value rejects the frame as
//! soon as the header is complete, so a corrupt length cannot hold the link
//! in a match until the timeout.

use thiserror_no_std::Error;

use crate::config::{DEFAULT_PARSE_TIMEOUT_MS, MAX_PAYLOAD};
use crate::protocol::{ComProtocol, FollowUp, ParseStatus, ResponseBuffer};

/// Two-byte frame preamble.
pub const SYNC: [u8; 2] = [0xA5, 0x5A];
/// Preamble + id + length.
pub const HEADER_LEN: usize = 6;
/// CRC trailer length.
pub const CRC_LEN: usize = 4;
/// Largest encoded frame.
pub const MAX_FRAME: usize = HEADER_LEN + MAX_PAYLOAD + CRC_LEN;

/// Framing failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload longer than [`MAX_PAYLOAD`].
    #[error("payload exceeds the frame limit")]
    PayloadTooLarge,
    /// Output buffer too small for the encoded frame.
    #[error("output buffer too small")]
    BufferTooSmall,
}

/// A frame to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryFrame<'p> {
    /// Message ID.
    pub id: u16,
    /// Message body.
    pub payload: &'p [u8],
}

impl<'p> BinaryFrame<'p> {
    /// Frame carrying `payload` under `id`.
    pub const fn new(id: u16, payload: &'p [u8]) -> Self {
        Self { id, payload }
    }

    /// Size of the encoded frame.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN
            .saturating_add(self.payload.len())
            .saturating_add(CRC_LEN)
    }

    /// Encode into `out`, returning the number of bytes written.
    pub fn encode(&self, out: &mut [u8]) -> Result<usize, FrameError> {
        let len = u16::try_from(self.payload.len())
            .ok()
            .filter(|&len| usize::from(len) <= MAX_PAYLOAD)
            .ok_or(FrameError::PayloadTooLarge)?;
        let total = self.encoded_len();
        let out = out.get_mut(..total).ok_or(FrameError::BufferTooSmall)?;

        let (header, rest) = out.split_at_mut(HEADER_LEN);
        let (body, trailer) = rest.split_at_mut(self.payload.len());
        header.copy_from_slice(&[
            SYNC[0],
            SYNC[1],
            self.id.to_le_bytes()[0],
            self.id.to_le_bytes()[1],
            len.to_le_bytes()[0],
            len.to_le_bytes()[1],
        ]);
        body.copy_from_slice(self.payload);

        let mut crc = crc32fast::Hasher::new();
        crc.update(header.get(SYNC.len()..).unwrap_or_default());
        crc.update(body);
        trailer.copy_from_slice(&crc.finalize().to_le_bytes());
        Ok(total)
    }

    /// Encode straight into a response.
    pub fn write_to(&self, reply: &mut ResponseBuffer<'_>) -> Result<(), FrameError> {
        let mut frame = [0u8; MAX_FRAME];
        let len = self.encode(&mut frame)?;
        reply
            .write(frame.get(..len).unwrap_or_default())
            .map_err(|_| FrameError::BufferTooSmall)
    }
}

/// Receiver of complete, CRC-checked frames.
pub trait BinaryHandler {
    /// Handle message `id`, writing any reply to `reply`.
    fn on_message(&mut self, id: u16, payload: &[u8], reply: &mut ResponseBuffer<'_>)
        -> FollowUp;

    /// Runs after a reply for which `on_message` requested a follow-up has
    /// been transmitted.
    fn follow_up(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    id: u16,
    len: usize,
}

impl Header {
    /// Decode a complete header; `None` if the length is out of range.
    fn decode(rx: &[u8]) -> Option<Self> {
        let field = |at: usize| -> Option<u16> {
            let bytes = rx.get(at..at.checked_add(2)?)?;
            Some(u16::from_le_bytes([*bytes.first()?, *bytes.get(1)?]))
        };
        let id = field(2)?;
        let len = usize::from(field(4)?);
        (len <= MAX_PAYLOAD).then_some(Self { id, len })
    }

    fn frame_len(self) -> usize {
        HEADER_LEN
            .saturating_add(self.len)
            .saturating_add(CRC_LEN)
    }
}

/// [`ComProtocol`] for CRC-protected binary frames.
///
/// The decoded header is cached while a frame is in flight and dropped on
/// completion, rejection or [`reset`](ComProtocol::reset).
pub struct BinaryProtocol<H> {
    handler: H,
    timeout_ms: u64,
    header: Option<Header>,
}

impl<H: BinaryHandler> BinaryProtocol<H> {
    /// Protocol forwarding complete frames to `handler`.
    pub const fn new(handler: H) -> Self {
        Self {
            handler,
            timeout_ms: DEFAULT_PARSE_TIMEOUT_MS,
            header: None,
        }
    }

    /// Override the parse timeout.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// The wrapped handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The wrapped handler, mutably.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// `true` while a partially received frame is cached.
    pub fn is_mid_frame(&self) -> bool {
        self.header.is_some()
    }

    fn reject(&mut self) -> ParseStatus {
        self.header = None;
        ParseStatus::NotAFrame
    }
}

impl<H: BinaryHandler> ComProtocol for BinaryProtocol<H> {
    fn parse_timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn parse(&mut self, rx: &[u8], response: &mut ResponseBuffer<'_>) -> ParseStatus {
        // Reject on the first differing sync byte.
        let sync_len = rx.len().min(SYNC.len());
        if rx.is_empty() || rx.get(..sync_len) != SYNC.get(..sync_len) {
            return self.reject();
        }
        if rx.len() < HEADER_LEN {
            return ParseStatus::MidFrame;
        }

        let header = match self.header {
            Some(header) => header,
            None => match Header::decode(rx) {
                Some(header) => header,
                None => {
                    debug!("binary frame length out of range");
                    return self.reject();
                }
            },
        };
        let frame_len = header.frame_len();
        if rx.len() < frame_len {
            self.header = Some(header);
            return ParseStatus::MidFrame;
        }
        if rx.len() > frame_len {
            return self.reject();
        }

        let crc_at = frame_len.saturating_sub(CRC_LEN);
        let covered = rx.get(SYNC.len()..crc_at).unwrap_or_default();
        let expected = match rx.get(crc_at..) {
            Some(&[a, b, c, d]) => u32::from_le_bytes([a, b, c, d]),
            _ => return self.reject(),
        };
        if crc32fast::hash(covered) != expected {
            debug!("binary frame {} failed its CRC", header.id);
            return self.reject();
        }

        self.header = None;
        let payload = rx.get(HEADER_LEN..crc_at).unwrap_or_default();
        ParseStatus::FoundFrame(self.handler.on_message(header.id, payload, response))
    }

    fn follow_up(&mut self) {
        self.handler.follow_up();
    }

    fn reset(&mut self) {
        self.header = None;
    }
}
