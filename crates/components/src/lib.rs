//! Application components for Plat4m
//!
//! Small building blocks written purely against the [`platform`] traits, so
//! they run unchanged on target hardware and in host tests.
//!
//! - [`button`]: debounced push button over an [`platform::InputPin`]
//! - [`pid`]: PID control-loop controller with anti-windup
//!
//! # Features
//!
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

pub mod button;
pub mod pid;

pub use button::{Button, ButtonEvent, Polarity};
pub use pid::{PidController, PidGains};
