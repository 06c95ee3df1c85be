//! Topic registry.
//!
//! `TopicManager` resolves topics by ID so components can publish and
//! subscribe without threading topic references through every layer. It owns
//! its topics; subscribers stay borrowed for `'a`.

use crate::registry::Registry;
use crate::topic::{Subscriber, Topic, TopicId, TopicSample, DEFAULT_MAX_SUBSCRIBERS};
use crate::TopicError;

/// Default number of topics per manager.
pub const DEFAULT_MAX_TOPICS: usize = 8;

/// Registry of up to `T` topics of sample type `S`, each with up to `N`
/// subscribers.
pub struct TopicManager<
    'a,
    S,
    const T: usize = DEFAULT_MAX_TOPICS,
    const N: usize = DEFAULT_MAX_SUBSCRIBERS,
> {
    topics: Registry<Topic<'a, S, N>, T>,
}

impl<'a, S, const T: usize, const N: usize> TopicManager<'a, S, T, N> {
    /// Create an empty manager.
    pub const fn new() -> Self {
        Self {
            topics: Registry::new(),
        }
    }

    /// Return the topic with `id`, creating it if absent.
    ///
    /// Calling this twice with the same ID yields the same topic.
    pub fn create(&mut self, id: TopicId) -> Result<&mut Topic<'a, S, N>, TopicError> {
        if self.topics.contains(id) {
            return self.find_mut(id);
        }
        debug!("creating topic {}", id.0);
        self.topics.add(Topic::new(id)).map_err(TopicError::from)
    }

    /// Topic with `id`.
    pub fn find(&self, id: TopicId) -> Result<&Topic<'a, S, N>, TopicError> {
        self.topics
            .find(id)
            .map_err(|_| TopicError::TopicNotFound(id))
    }

    /// Mutable topic with `id`.
    pub fn find_mut(&mut self, id: TopicId) -> Result<&mut Topic<'a, S, N>, TopicError> {
        self.topics
            .find_mut(id)
            .map_err(|_| TopicError::TopicNotFound(id))
    }

    /// Remove the topic with `id`, dropping its subscriber list.
    pub fn remove(&mut self, id: TopicId) -> Result<Topic<'a, S, N>, TopicError> {
        self.topics
            .remove(id)
            .map_err(|_| TopicError::TopicNotFound(id))
    }

    /// Subscribe to an existing topic.
    ///
    /// Subscribing before the topic is created fails with
    /// [`TopicError::TopicNotFound`]; the registration is never dropped
    /// silently.
    pub fn subscribe(
        &mut self,
        id: TopicId,
        subscriber: &'a dyn Subscriber<S>,
    ) -> Result<(), TopicError> {
        match self.find_mut(id) {
            Ok(topic) => topic.subscribe(subscriber),
            Err(e) => {
                warn!("subscribe to unknown topic {}", id.0);
                Err(e)
            }
        }
    }

    /// Unsubscribe from topic `id`. `Ok(false)` if it was not subscribed.
    pub fn unsubscribe(
        &mut self,
        id: TopicId,
        subscriber: &dyn Subscriber<S>,
    ) -> Result<bool, TopicError> {
        self.find_mut(id).map(|topic| topic.unsubscribe(subscriber))
    }

    /// Publish `sample` on topic `id`.
    pub fn publish(&self, id: TopicId, sample: &TopicSample<S>) -> Result<(), TopicError> {
        self.find(id).map(|topic| topic.publish(sample))
    }

    /// Number of topics.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// `true` when no topic exists.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl<S, const T: usize, const N: usize> Default for TopicManager<'_, S, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::RegistryError;
    use core::cell::Cell;

    #[test]
    fn create_twice_returns_the_same_topic() {
        let hits = Cell::new(0u32);
        let sub = |_: &TopicSample<u32>| hits.set(hits.get() + 1);

        let mut topics: TopicManager<'_, u32> = TopicManager::new();
        topics.create(TopicId(4)).unwrap().subscribe(&sub).unwrap();
        let again = topics.create(TopicId(4)).unwrap();

        assert_eq!(again.subscriber_count(), 1);
        assert_eq!(topics.len(), 1);
    }

    #[test]
    fn find_unknown_topic_is_not_found() {
        let topics: TopicManager<'_, u32> = TopicManager::new();
        assert!(matches!(
            topics.find(TopicId(77)),
            Err(TopicError::TopicNotFound(TopicId(77)))
        ));
    }

    #[test]
    fn subscribe_before_create_fails_loudly() {
        let sub = |_: &TopicSample<u32>| {};
        let mut topics: TopicManager<'_, u32> = TopicManager::new();
        assert_eq!(
            topics.subscribe(TopicId(1), &sub),
            Err(TopicError::TopicNotFound(TopicId(1)))
        );
    }

    #[test]
    fn publish_routes_by_id() {
        let a_hits = Cell::new(0u32);
        let b_hits = Cell::new(0u32);
        let a = |_: &TopicSample<u32>| a_hits.set(a_hits.get() + 1);
        let b = |_: &TopicSample<u32>| b_hits.set(b_hits.get() + 1);

        let mut topics: TopicManager<'_, u32> = TopicManager::new();
        topics.create(TopicId(1)).unwrap();
        topics.create(TopicId(2)).unwrap();
        topics.subscribe(TopicId(1), &a).unwrap();
        topics.subscribe(TopicId(2), &b).unwrap();

        topics.publish(TopicId(2), &TopicSample::new(0, 5)).unwrap();

        assert_eq!(a_hits.get(), 0);
        assert_eq!(b_hits.get(), 1);
    }

    #[test]
    fn topic_limit_is_reported() {
        let mut topics: TopicManager<'_, u8, 1> = TopicManager::new();
        topics.create(TopicId(1)).unwrap();
        assert!(matches!(
            topics.create(TopicId(2)),
            Err(TopicError::Registry(RegistryError::Full))
        ));
    }
}
