//! Downsampling topic subscribers.

use core::cell::Cell;
use core::marker::PhantomData;

use crate::manager::TopicManager;
use crate::topic::{Subscriber, TopicId, TopicSample};
use crate::TopicError;

/// Every-Nth-sample gate.
///
/// A factor of 0 or 1 passes every sample. Otherwise the counter increments
/// per sample and the gate opens (and the counter resets) when it reaches the
/// factor, so N samples yield ⌊N / factor⌋ deliveries.
#[derive(Debug, Default)]
pub struct Downsampler {
    factor: Cell<u32>,
    seen: Cell<u32>,
}

impl Downsampler {
    /// Gate passing one sample out of every `factor`.
    pub const fn new(factor: u32) -> Self {
        Self {
            factor: Cell::new(factor),
            seen: Cell::new(0),
        }
    }

    /// Count one sample; `true` if it should be delivered.
    pub fn tick(&self) -> bool {
        let factor = self.factor.get();
        if factor <= 1 {
            return true;
        }
        let seen = self.seen.get().saturating_add(1);
        if seen >= factor {
            self.seen.set(0);
            true
        } else {
            self.seen.set(seen);
            false
        }
    }

    /// Forget samples counted so far.
    pub fn reset(&self) {
        self.seen.set(0);
    }

    /// Current factor.
    pub fn factor(&self) -> u32 {
        self.factor.get()
    }

    /// Change the factor. The counter restarts.
    pub fn set_factor(&self, factor: u32) {
        self.factor.set(factor);
        self.reset();
    }
}

/// Subscriber bound to one topic ID, forwarding downsampled samples to
/// `handler`.
///
/// The subscriber registers itself on [`enable`](Self::enable) and
/// deregisters on [`disable`](Self::disable); it never owns the topic. While
/// disabled it drops every sample it is handed.
pub struct TopicSubscriber<S, H> {
    topic_id: TopicId,
    downsampler: Downsampler,
    enabled: Cell<bool>,
    handler: H,
    _sample: PhantomData<fn(&S)>,
}

impl<S, H: Subscriber<S>> TopicSubscriber<S, H> {
    /// Subscriber for `topic_id` delivering one sample in `downsample_factor`.
    pub const fn new(topic_id: TopicId, downsample_factor: u32, handler: H) -> Self {
        Self {
            topic_id,
            downsampler: Downsampler::new(downsample_factor),
            enabled: Cell::new(false),
            handler,
            _sample: PhantomData,
        }
    }

    /// Topic this subscriber listens to.
    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    /// `true` between `enable` and `disable`.
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// The downsampling gate.
    pub fn downsampler(&self) -> &Downsampler {
        &self.downsampler
    }

    /// The wrapped handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Reset the sample counter and register with the topic.
    pub fn enable<'a, const T: usize, const N: usize>(
        &'a self,
        topics: &mut TopicManager<'a, S, T, N>,
    ) -> Result<(), TopicError>
    where
        S: 'a,
        H: 'a,
    {
        self.downsampler.reset();
        topics.subscribe(self.topic_id, self)?;
        self.enabled.set(true);
        trace!("subscriber enabled on topic {}", self.topic_id.0);
        Ok(())
    }

    /// Deregister from the topic. `Ok(false)` if it was not registered.
    pub fn disable<const T: usize, const N: usize>(
        &self,
        topics: &mut TopicManager<'_, S, T, N>,
    ) -> Result<bool, TopicError> {
        self.enabled.set(false);
        topics.unsubscribe(self.topic_id, self)
    }
}

impl<S, H: Subscriber<S>> Subscriber<S> for TopicSubscriber<S, H> {
    fn on_sample(&self, sample: &TopicSample<S>) {
        if self.enabled.get() && self.downsampler.tick() {
            self.handler.on_sample(sample);
        }
    }
}
