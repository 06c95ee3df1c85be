//! In-process publish/subscribe bus for Plat4m
//!
//! Publishers push typed, timestamped samples onto a [`Topic`]; subscribers
//! receive them synchronously through a callback, optionally downsampled.
//! Topics and services are resolved by numeric ID through fixed-capacity
//! registries ([`TopicManager`], [`ServiceManager`]), which the composition
//! root may park in a [`RegistrySlot`].
//!
//! # Example
//!
//! ```
//! use core::cell::Cell;
//! use topic::{TopicId, TopicManager, TopicSample, TopicSubscriber};
//!
//! let last = Cell::new(0u32);
//! let on_sample = |s: &TopicSample<u32>| last.set(s.value);
//! let every_second = TopicSubscriber::new(TopicId(1), 2, on_sample);
//!
//! let mut topics: TopicManager<'_, u32> = TopicManager::new();
//! topics.create(TopicId(1))?;
//! every_second.enable(&mut topics)?;
//!
//! for (t, v) in [42, 71, 23].into_iter().enumerate() {
//!     topics.publish(TopicId(1), &TopicSample::new(t as u64, v))?;
//! }
//! assert_eq!(last.get(), 71);
//! # Ok::<(), topic::TopicError>(())
//! ```
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

pub mod manager;
pub mod registry;
pub mod service;
pub mod slot;
pub mod subscriber;
pub mod topic;

pub use manager::{TopicManager, DEFAULT_MAX_TOPICS};
pub use registry::{Identified, Registry, RegistryError};
pub use service::{Service, ServiceError, ServiceId, ServiceManager};
pub use slot::RegistrySlot;
pub use subscriber::{Downsampler, TopicSubscriber};
pub use topic::{Subscriber, Topic, TopicId, TopicSample, DEFAULT_MAX_SUBSCRIBERS};

use thiserror_no_std::Error;

/// Topic bus failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TopicError {
    /// No topic with this ID exists (subscribe before create, or publish to
    /// an unknown ID).
    #[error("topic {0:?} not found")]
    TopicNotFound(TopicId),
    /// The topic's subscriber list is full.
    #[error("topic {0:?} has no free subscriber slot")]
    SubscriberLimit(TopicId),
    /// The underlying registry rejected the operation.
    #[error("topic registry: {0}")]
    Registry(RegistryError),
}

impl From<RegistryError> for TopicError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}
