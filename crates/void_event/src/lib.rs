//! # void_event - Broadcast Event Bus
//!
//! Typed publish/subscribe bus shared between producers on any thread:
//! - Callback subscribers (`Fn(&E)`) invoked synchronously on publish
//! - Channel subscribers backed by `crossbeam-channel`
//! - Priority ordering between subscribers
//! - Publish/delivery statistics
//!
//! A bus is an ordinary value. Construct one per process (or per test) and
//! hand out `Arc<EventBus<E>>` clones to everything that publishes or listens.
//!
//! ```ignore
//! let bus = Arc::new(EventBus::<Ping>::new());
//! let id = bus.subscribe(|ping: &Ping| println!("got {}", ping.0));
//! bus.publish(Ping(1));
//! bus.unsubscribe(id);
//! ```

use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Event priority
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// Trait for events carried by an [`EventBus`]
pub trait Event: Clone + Send + Sync + 'static {}

// Blanket implementation
impl<T: Clone + Send + Sync + 'static> Event for T {}

/// Callback handler type
pub type EventHandler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

/// Where a subscriber's events go
enum Sink<E> {
    Callback(EventHandler<E>),
    Channel(Sender<E>),
}

impl<E> Clone for Sink<E> {
    fn clone(&self) -> Self {
        match self {
            Sink::Callback(handler) => Sink::Callback(Arc::clone(handler)),
            Sink::Channel(sender) => Sink::Channel(sender.clone()),
        }
    }
}

struct Subscriber<E> {
    id: SubscriberId,
    priority: Priority,
    sink: Sink<E>,
}

impl<E> Clone for Subscriber<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            priority: self.priority,
            sink: self.sink.clone(),
        }
    }
}

/// Event bus statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventBusStats {
    /// Total events published
    pub events_published: u64,
    /// Total deliveries (one per subscriber per event)
    pub events_delivered: u64,
    /// Current subscriber count
    pub subscribers: usize,
}

/// Broadcast bus for a single event type.
///
/// Every event published is delivered exactly once to every subscriber that
/// was registered when `publish` took its snapshot. Handlers run outside the
/// subscriber lock, so a handler may subscribe or unsubscribe without
/// deadlocking.
pub struct EventBus<E: Event> {
    /// Subscribers, kept sorted by priority (highest first)
    subscribers: RwLock<Vec<Subscriber<E>>>,
    /// Next subscriber ID
    next_subscriber_id: AtomicU64,
    published: AtomicU64,
    delivered: AtomicU64,
}

impl<E: Event> EventBus<E> {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_subscriber_id: AtomicU64::new(1),
            published: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
        }
    }

    /// Subscribe a callback
    pub fn subscribe<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe_with_priority(handler, Priority::Normal)
    }

    /// Subscribe a callback with priority
    pub fn subscribe_with_priority<F>(&self, handler: F, priority: Priority) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.insert(Sink::Callback(Arc::new(handler)), priority)
    }

    /// Subscribe through an unbounded channel.
    ///
    /// The subscription is dropped automatically on the first publish after
    /// the returned receiver has been dropped.
    pub fn subscribe_channel(&self) -> (SubscriberId, Receiver<E>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let id = self.insert(Sink::Channel(tx), Priority::Normal);
        (id, rx)
    }

    fn insert(&self, sink: Sink<E>, priority: Priority) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber_id.fetch_add(1, Ordering::Relaxed));

        let mut subscribers = self.subscribers.write();
        subscribers.push(Subscriber { id, priority, sink });
        // Stable sort keeps registration order within a priority
        subscribers.sort_by(|a, b| b.priority.cmp(&a.priority));

        id
    }

    /// Unsubscribe. Returns false if the ID was not subscribed.
    ///
    /// Removal applies to the next `publish`. A publish already running
    /// delivers from the snapshot it took on entry, so a subscriber removed
    /// while it runs, whether from another thread or from a handler earlier
    /// in the same delivery, still receives that one event.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|sub| sub.id != id);
        subscribers.len() != before
    }

    /// Publish an event to every current subscriber. Returns the number of
    /// deliveries made.
    pub fn publish(&self, event: E) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);

        let snapshot: Vec<Subscriber<E>> = self.subscribers.read().clone();
        let mut delivered = 0;
        let mut disconnected = Vec::new();

        for sub in &snapshot {
            match &sub.sink {
                Sink::Callback(handler) => {
                    handler(&event);
                    delivered += 1;
                }
                Sink::Channel(sender) => {
                    if sender.send(event.clone()).is_ok() {
                        delivered += 1;
                    } else {
                        disconnected.push(sub.id);
                    }
                }
            }
        }

        if !disconnected.is_empty() {
            log::debug!("Pruning {} disconnected channel subscriber(s)", disconnected.len());
            self.subscribers
                .write()
                .retain(|sub| !disconnected.contains(&sub.id));
        }

        self.delivered.fetch_add(delivered as u64, Ordering::Relaxed);
        delivered
    }

    /// Remove every subscriber
    pub fn clear(&self) {
        self.subscribers.write().clear();
    }

    /// Get current subscriber count
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Get statistics
    pub fn stats(&self) -> EventBusStats {
        EventBusStats {
            events_published: self.published.load(Ordering::Relaxed),
            events_delivered: self.delivered.load(Ordering::Relaxed),
            subscribers: self.subscriber_count(),
        }
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("event", &std::any::type_name::<E>())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{Event, EventBus, EventBusStats, EventHandler, Priority, SubscriberId};
}
