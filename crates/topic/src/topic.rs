//! Typed in-process broadcast channel.
//!
//! A [`Topic`] fans each published [`TopicSample`] out to its subscribers,
//! synchronously and in registration order. There is no queueing: a slow
//! subscriber makes `publish` slow, and a panicking one stops the fan-out for
//! everyone registered after it.
//!
//! Publishing is not re-entrant. A subscriber must not publish to the topic
//! that is currently delivering to it.

use serde::{Deserialize, Serialize};

use crate::registry::Identified;
use crate::TopicError;

/// Default number of subscribers per topic.
pub const DEFAULT_MAX_SUBSCRIBERS: usize = 8;

/// Process-unique topic ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TopicId(pub u16);

/// Timestamped sample envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TopicSample<S> {
    /// Time the sample was taken, in milliseconds.
    pub timestamp_ms: u64,
    /// Payload.
    pub value: S,
}

impl<S> TopicSample<S> {
    /// Wrap `value` taken at `timestamp_ms`.
    pub const fn new(timestamp_ms: u64, value: S) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}

/// Receiver of topic samples.
///
/// Delivery takes `&self`; subscribers keep any state they need in `Cell`s.
pub trait Subscriber<S> {
    /// Handle one sample. Copy what must outlive the call.
    fn on_sample(&self, sample: &TopicSample<S>);
}

impl<S, F> Subscriber<S> for F
where
    F: Fn(&TopicSample<S>),
{
    fn on_sample(&self, sample: &TopicSample<S>) {
        self(sample);
    }
}

/// A topic carrying samples of type `S` to at most `N` subscribers.
///
/// Subscribers are borrowed, not owned: each must outlive the topic (`'a`).
pub struct Topic<'a, S, const N: usize = DEFAULT_MAX_SUBSCRIBERS> {
    id: TopicId,
    subscribers: heapless::Vec<&'a dyn Subscriber<S>, N>,
}

impl<'a, S, const N: usize> Topic<'a, S, N> {
    /// Create a topic with no subscribers.
    pub const fn new(id: TopicId) -> Self {
        Self {
            id,
            subscribers: heapless::Vec::new(),
        }
    }

    /// This topic's ID.
    pub fn id(&self) -> TopicId {
        self.id
    }

    /// Append `subscriber` to the delivery list.
    ///
    /// Subscribing the same subscriber twice is a no-op.
    pub fn subscribe(&mut self, subscriber: &'a dyn Subscriber<S>) -> Result<(), TopicError> {
        if self.is_subscribed(subscriber) {
            return Ok(());
        }
        self.subscribers
            .push(subscriber)
            .map_err(|_| TopicError::SubscriberLimit(self.id))
    }

    /// Remove `subscriber`. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, subscriber: &dyn Subscriber<S>) -> bool {
        let target = address(subscriber);
        match self
            .subscribers
            .iter()
            .position(|s| address(*s) == target)
        {
            Some(index) => {
                self.subscribers.remove(index);
                true
            }
            None => false,
        }
    }

    /// `true` if `subscriber` is on the delivery list.
    pub fn is_subscribed(&self, subscriber: &dyn Subscriber<S>) -> bool {
        let target = address(subscriber);
        self.subscribers.iter().any(|s| address(*s) == target)
    }

    /// Number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `sample` to every subscriber, in registration order.
    ///
    /// Publishing to a topic without subscribers does nothing.
    pub fn publish(&self, sample: &TopicSample<S>) {
        for subscriber in &self.subscribers {
            subscriber.on_sample(sample);
        }
    }

    /// Wrap `value` in a [`TopicSample`] and publish it.
    pub fn publish_value(&self, timestamp_ms: u64, value: S) {
        self.publish(&TopicSample::new(timestamp_ms, value));
    }
}

impl<S, const N: usize> Identified for Topic<'_, S, N> {
    type Id = TopicId;

    fn id(&self) -> TopicId {
        self.id
    }
}

/// Identity of a subscriber: its data address, vtable ignored.
///
/// Zero-sized subscribers may share an address; give them state (or wrap
/// them in a `TopicSubscriber`) when they need to be told apart.
fn address<S>(subscriber: &dyn Subscriber<S>) -> *const () {
    let ptr: *const (dyn Subscriber<S> + '_) = subscriber;
    ptr.cast()
}
