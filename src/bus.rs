//! In-process, topic-keyed publish/subscribe.
//!
//! The [`EventBus`] connects mutation resolvers to subscription streams. Every
//! call to [`EventBus::subscribe`] registers its own unbounded channel and
//! returns a [`Subscriber`] stream; [`EventBus::publish`] pushes a clone of the
//! payload into every channel registered on the topic at that moment.
//!
//! Nothing is buffered on the bus itself: a publish with no subscribers is
//! dropped, and a subscriber never sees events published before it joined.
//! Dropping a [`Subscriber`] (for example when async-graphql tears down a
//! WebSocket subscription) removes its registration.

use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Topic published after the downstream service confirms a new Pokemon.
pub const POKEMON_CREATED: &str = "pokemonCreated";

type SubscriberId = u64;

struct Registry<T> {
    next_id: SubscriberId,
    topics: HashMap<String, HashMap<SubscriberId, mpsc::UnboundedSender<T>>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            topics: HashMap::new(),
        }
    }
}

/// Broadcast event bus keyed by topic name.
///
/// Cloning is cheap; clones share the same subscriber registry. Construct one
/// per gateway (or per test) and hand it to whoever publishes or subscribes.
pub struct EventBus<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: Clone + Send + 'static> EventBus<T> {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Deliver `payload` to every subscriber currently registered on `topic`.
    ///
    /// Never blocks and never fails. Returns how many subscribers the payload
    /// was handed to; registrations whose receiver is gone are pruned.
    pub fn publish(&self, topic: &str, payload: T) -> usize {
        let mut registry = lock(&self.registry);

        // Delivery happens under the lock so concurrent publishes on a topic
        // reach every subscriber in the same order.
        let Some(subscribers) = registry.topics.get_mut(topic) else {
            tracing::trace!(topic, "publish dropped, no subscribers");
            return 0;
        };

        subscribers.retain(|_, tx| tx.send(payload.clone()).is_ok());
        let delivered = subscribers.len();
        if delivered == 0 {
            registry.topics.remove(topic);
        }

        tracing::trace!(topic, delivered, "published event");
        delivered
    }

    /// Register a new subscriber on `topic`.
    ///
    /// The returned stream only yields payloads published after this call and
    /// ends only when the bus side goes away, which never happens while the
    /// subscriber itself holds the registration.
    pub fn subscribe(&self, topic: &str) -> Subscriber<T> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .topics
            .entry(topic.to_string())
            .or_default()
            .insert(id, tx);
        drop(registry);

        tracing::debug!(topic, subscriber = id, "subscriber registered");

        Subscriber {
            stream: UnboundedReceiverStream::new(rx),
            _registration: Registration {
                registry: Arc::clone(&self.registry),
                topic: topic.to_string(),
                id,
            },
        }
    }

    /// Number of live registrations on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        lock(&self.registry)
            .topics
            .get(topic)
            .map_or(0, HashMap::len)
    }
}

impl<T: Clone + Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T> std::fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = lock(&self.registry);
        let topics: HashMap<&str, usize> = registry
            .topics
            .iter()
            .map(|(topic, subs)| (topic.as_str(), subs.len()))
            .collect();
        f.debug_struct("EventBus").field("topics", &topics).finish()
    }
}

fn lock<T>(registry: &Mutex<Registry<T>>) -> MutexGuard<'_, Registry<T>> {
    // A panic while holding the lock cannot leave the maps half-updated.
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Removes a subscriber from the registry when dropped.
struct Registration<T> {
    registry: Arc<Mutex<Registry<T>>>,
    topic: String,
    id: SubscriberId,
}

impl<T> Drop for Registration<T> {
    fn drop(&mut self) {
        let mut registry = lock(&self.registry);
        if let Some(subscribers) = registry.topics.get_mut(&self.topic) {
            subscribers.remove(&self.id);
            if subscribers.is_empty() {
                registry.topics.remove(&self.topic);
            }
        }
        tracing::debug!(topic = %self.topic, subscriber = self.id, "subscriber removed");
    }
}

/// Stream of payloads for one subscription. Deregisters on drop.
pub struct Subscriber<T> {
    stream: UnboundedReceiverStream<T>,
    _registration: Registration<T>,
}

impl<T> Stream for Subscriber<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.get_mut().stream).poll_next(cx)
    }
}

impl<T> std::fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("topic", &self._registration.topic)
            .field("id", &self._registration.id)
            .finish()
    }
}
