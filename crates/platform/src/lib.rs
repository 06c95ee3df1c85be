//! Hardware Abstraction Layer (HAL) for Plat4m
//!
//! This crate provides the trait-based seams the Plat4m core is written
//! against, so the pub/sub bus and the framing engine build and test without
//! physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (components: button, pid)
//!         ↓
//! Core Layers (topic bus, comlink framing engine)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (Embassy HAL + PAC)
//! ```
//!
//! # Abstractions
//!
//! - [`ComInterfaceDevice`] - byte-stream transport (UART, USB-serial, ...)
//! - [`Clock`] - monotonic millisecond time source
//! - [`gpio`] - digital input/output pins
//!
//! # Features
//!
//! - `std`: Expose [`mocks`] to other crates' tests
//! - `defmt`: Enable defmt derives
//!
//! # Example
//!
//! ```no_run
//! use platform::ComInterfaceDevice;
//!
//! fn greet<D: ComInterfaceDevice>(device: &mut D) -> Result<(), D::Error> {
//!     device.transmit_bytes(b"$hello\n", true)
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)] // hardware accessors — callers decide

pub mod clock;
pub mod com;
pub mod config;
pub mod gpio;
pub mod mocks;

pub use clock::{Clock, EmbassyClock};
pub use com::{ComInterfaceDevice, SharedDevice};
pub use gpio::{HalInputPin, HalOutputPin, InputPin, OutputPin, PinState};
