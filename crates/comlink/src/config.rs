//! Compile-time link configuration.
//!
//! Capacities are fixed at build time; there is no heap to grow into.

/// Protocols a single link can dispatch to.
pub const MAX_PROTOCOLS: usize = 4;

/// Parse timeout used by protocols that do not override
/// [`ComProtocol::parse_timeout_ms`](crate::ComProtocol::parse_timeout_ms).
pub const DEFAULT_PARSE_TIMEOUT_MS: u64 = 100;

/// Default receive queue depth, in bytes.
///
/// Must cover the bytes that can arrive between two worker wake-ups; at
/// 115200 baud that is ~11 bytes per millisecond.
pub const RX_QUEUE_DEPTH: usize = 256;

/// Largest binary frame payload.
pub const MAX_PAYLOAD: usize = 128;

/// Longest ASCII command line, excluding the terminator.
pub const MAX_LINE: usize = 64;

/// Bytes moved from a polled device per `received_bytes` call.
pub const POLL_CHUNK: usize = 32;
