//! Topic bridging across a link.
//!
//! Outbound, a [`TopicSubscriberExternal`] serializes each (downsampled)
//! sample with postcard and transmits it as a binary frame whose ID is the
//! topic ID. Inbound, a [`TopicPublisher`] is the [`BinaryHandler`] that turns
//! such frames back into samples and publishes them locally.
//!
//! ```text
//! board A: Topic ─► TopicSubscriberExternal ─► UART ─┐
//!                                                    │
//! board B: Topic ◄─ TopicPublisher ◄─ BinaryProtocol ◄┘
//! ```

use core::cell::Cell;
use core::marker::PhantomData;

use embassy_sync::blocking_mutex::raw::RawMutex;
use platform::{ComInterfaceDevice, SharedDevice};
use serde::de::DeserializeOwned;
use serde::Serialize;
use topic::{Subscriber, TopicError, TopicId, TopicManager, TopicSample, TopicSubscriber};

use crate::config::MAX_PAYLOAD;
use crate::protocol::binary::{BinaryFrame, BinaryHandler, MAX_FRAME};
use crate::protocol::{FollowUp, ResponseBuffer};

/// Publishes samples received as binary frames.
///
/// A frame with ID `n` is decoded as a postcard `TopicSample<S>` and
/// published on `TopicId(n)`. Undecodable payloads and unknown topics are
/// counted and otherwise ignored.
pub struct TopicPublisher<'r, 's, S, const T: usize, const N: usize> {
    topics: &'r TopicManager<'s, S, T, N>,
    published: u32,
    dropped: u32,
}

impl<'r, 's, S, const T: usize, const N: usize> TopicPublisher<'r, 's, S, T, N> {
    /// Publisher into `topics`.
    pub fn new(topics: &'r TopicManager<'s, S, T, N>) -> Self {
        Self {
            topics,
            published: 0,
            dropped: 0,
        }
    }

    /// Samples published so far.
    pub fn published(&self) -> u32 {
        self.published
    }

    /// Frames that could not be published.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<S: DeserializeOwned, const T: usize, const N: usize> BinaryHandler
    for TopicPublisher<'_, '_, S, T, N>
{
    fn on_message(&mut self, id: u16, payload: &[u8], _reply: &mut ResponseBuffer<'_>) -> FollowUp {
        let published = postcard::from_bytes::<TopicSample<S>>(payload)
            .ok()
            .and_then(|sample| self.topics.publish(TopicId(id), &sample).ok());
        match published {
            Some(()) => self.published = self.published.saturating_add(1),
            None => {
                warn!("frame {} not published", id);
                self.dropped = self.dropped.saturating_add(1);
            }
        }
        FollowUp::None
    }
}

/// Transmit side of a [`TopicSubscriberExternal`].
pub struct ExternalSink<'d, S, M: RawMutex, D> {
    topic_id: TopicId,
    device: SharedDevice<'d, M, D>,
    sent: Cell<u32>,
    errors: Cell<u32>,
    _sample: PhantomData<fn(&S)>,
}

impl<'d, S: Serialize, M: RawMutex, D: ComInterfaceDevice> ExternalSink<'d, S, M, D> {
    /// Sink framing samples of `topic_id` onto `device`.
    pub const fn new(topic_id: TopicId, device: SharedDevice<'d, M, D>) -> Self {
        Self {
            topic_id,
            device,
            sent: Cell::new(0),
            errors: Cell::new(0),
            _sample: PhantomData,
        }
    }

    fn send(&self, sample: &TopicSample<S>) -> bool {
        let mut payload = [0u8; MAX_PAYLOAD];
        let Ok(encoded) = postcard::to_slice(sample, &mut payload) else {
            return false;
        };
        let mut frame = [0u8; MAX_FRAME];
        let Ok(len) = BinaryFrame::new(self.topic_id.0, encoded).encode(&mut frame) else {
            return false;
        };
        let mut device = self.device;
        device
            .transmit_bytes(frame.get(..len).unwrap_or_default(), false)
            .is_ok()
    }
}

impl<S: Serialize, M: RawMutex, D: ComInterfaceDevice> Subscriber<S>
    for ExternalSink<'_, S, M, D>
{
    fn on_sample(&self, sample: &TopicSample<S>) {
        if self.send(sample) {
            self.sent.set(self.sent.get().saturating_add(1));
        } else {
            warn!("sample for topic {} not transmitted", self.topic_id.0);
            self.errors.set(self.errors.get().saturating_add(1));
        }
    }
}

/// Topic subscriber that forwards samples over a link instead of handling
/// them locally.
pub struct TopicSubscriberExternal<'d, S, M: RawMutex, D> {
    inner: TopicSubscriber<S, ExternalSink<'d, S, M, D>>,
}

impl<'d, S, M, D> TopicSubscriberExternal<'d, S, M, D>
where
    S: Serialize,
    M: RawMutex,
    D: ComInterfaceDevice,
{
    /// Forward one sample in `downsample_factor` of `topic_id` to `device`.
    pub const fn new(
        topic_id: TopicId,
        downsample_factor: u32,
        device: SharedDevice<'d, M, D>,
    ) -> Self {
        Self {
            inner: TopicSubscriber::new(
                topic_id,
                downsample_factor,
                ExternalSink::new(topic_id, device),
            ),
        }
    }

    /// Start forwarding.
    pub fn enable<'a, const T: usize, const N: usize>(
        &'a self,
        topics: &mut TopicManager<'a, S, T, N>,
    ) -> Result<(), TopicError>
    where
        S: 'a,
        'd: 'a,
        M: 'a,
        D: 'a,
    {
        self.inner.enable(topics)
    }

    /// Stop forwarding.
    pub fn disable<const T: usize, const N: usize>(
        &self,
        topics: &mut TopicManager<'_, S, T, N>,
    ) -> Result<bool, TopicError> {
        self.inner.disable(topics)
    }

    /// Samples transmitted.
    pub fn sent(&self) -> u32 {
        self.inner.handler().sent.get()
    }

    /// Samples that failed to encode or transmit.
    pub fn errors(&self) -> u32 {
        self.inner.handler().errors.get()
    }
}
