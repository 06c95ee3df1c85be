//! Byte-stream framing and protocol dispatch for Plat4m
//!
//! A [`ComLink`] wraps one [`platform::ComInterfaceDevice`]. Received bytes
//! are queued from interrupt context in an [`RxQueue`], accumulated by the
//! link worker, and offered to registered [`ComProtocol`]s in registration
//! order. The first protocol to recognise a complete frame consumes it and
//! may answer through the same device.
//!
//! # Crate layout
//!
//! - [`link`]: the dispatch engine and its worker loop
//! - [`queue`]: interrupt-safe receive queue
//! - [`protocol`]: the protocol trait, response buffer, and the ASCII and
//!   binary protocols
//! - [`bridge`]: carrying topic samples across a link
//! - [`config`]: compile-time capacities and timeouts
//!
//! # Features
//!
//! - `std`: host builds (enables `platform/std`)
//! - `defmt`: defmt derives and log output on target
//! - `tracing`: log output on host builds

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

#[macro_use]
mod fmt;

pub mod bridge;
pub mod config;
pub mod link;
pub mod protocol;
pub mod queue;

pub use bridge::{ExternalSink, TopicPublisher, TopicSubscriberExternal};
pub use link::{AbandonReason, ComLink, ComLinkError, LinkStats};
pub use protocol::ascii::{AsciiCommand, AsciiHandler, AsciiProtocol};
pub use protocol::binary::{BinaryFrame, BinaryHandler, BinaryProtocol, FrameError};
pub use protocol::{BufferFull, ComProtocol, FollowUp, ParseStatus, ResponseBuffer};
pub use queue::RxQueue;
