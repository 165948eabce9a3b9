//! Event bus and bounded audit log.
//!
//! ```text
//!                 ┌──────────────── EventBus ────────────────┐
//!  ChangeEvent ──▶│ state_change      ─▶ sub, sub, …         │
//!                 │ param_change      ─▶ sub, …              │
//!                 │ param_change_bulk ─▶ sub, …              │
//!                 │ any               ─▶ sub, sub, …         │
//!                 └──────────────────────────────────────────┘
//! ```
//!
//! Delivery is synchronous.  Subscribers of the event's own topic run
//! first, then catch-all subscribers, each group in registration order.
//! A failing or panicking subscriber is isolated: the failure is handed
//! back to the bus owner and delivery continues with the next subscriber.

use std::panic::{AssertUnwindSafe, catch_unwind};

use heapless::HistoryBuffer;

use super::events::{ChangeEvent, EventKind};
use crate::error::SubscriberError;

/// Audit log capacity.  Oldest entries are evicted first.
pub const AUDIT_CAPACITY: usize = 50;

// ---------------------------------------------------------------------------
// Subscribers
// ---------------------------------------------------------------------------

/// Channel a subscriber listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Kind(EventKind),
    /// Receives every event.
    Any,
}

impl From<EventKind> for Topic {
    fn from(kind: EventKind) -> Self {
        Self::Kind(kind)
    }
}

/// Callback invoked for each published event on its topic.
pub trait EventSubscriber: Send {
    fn on_event(&mut self, event: &ChangeEvent) -> Result<(), SubscriberError>;
}

impl<F> EventSubscriber for F
where
    F: FnMut(&ChangeEvent) -> Result<(), SubscriberError> + Send,
{
    fn on_event(&mut self, event: &ChangeEvent) -> Result<(), SubscriberError> {
        self(event)
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A subscriber that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub subscription: SubscriptionId,
    pub topic: Topic,
    pub error: SubscriberError,
}

struct Subscription {
    id: SubscriptionId,
    topic: Topic,
    subscriber: Box<dyn EventSubscriber>,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Ordered subscriber list, owned by the runtime store.
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
    failure_count: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` on `topic`.  Delivery order is registration order.
    pub fn subscribe(
        &mut self,
        topic: impl Into<Topic>,
        subscriber: impl EventSubscriber + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            topic: topic.into(),
            subscriber: Box::new(subscriber),
        });
        id
    }

    /// Remove a subscription.  Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Total failures isolated since construction.
    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    /// Deliver `event` to its topic, then to catch-all subscribers.
    pub fn publish(&mut self, event: &ChangeEvent) -> Vec<DeliveryFailure> {
        let mut failures = Vec::new();
        for topic in [Topic::Kind(event.kind), Topic::Any] {
            for sub in self.subscriptions.iter_mut().filter(|s| s.topic == topic) {
                if let Err(error) = deliver(sub.subscriber.as_mut(), event) {
                    failures.push(DeliveryFailure {
                        subscription: sub.id,
                        topic,
                        error,
                    });
                }
            }
        }
        self.failure_count += failures.len() as u64;
        failures
    }
}

fn deliver(
    subscriber: &mut dyn EventSubscriber,
    event: &ChangeEvent,
) -> Result<(), SubscriberError> {
    match catch_unwind(AssertUnwindSafe(|| subscriber.on_event(event))) {
        Ok(result) => result,
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_owned());
            Err(SubscriberError(format!("subscriber panicked: {msg}")))
        }
    }
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

/// Fixed-capacity FIFO ring of the most recent change events.
pub struct AuditLog {
    entries: HistoryBuffer<ChangeEvent, AUDIT_CAPACITY>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: HistoryBuffer::new(),
        }
    }

    /// Append, evicting the oldest entry once full.
    pub fn append(&mut self, event: ChangeEvent) {
        self.entries.write(event);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ChangeEvent> {
        self.entries.oldest_ordered()
    }

    /// The last `n` entries in insertion order.
    pub fn recent(&self, n: usize) -> Vec<ChangeEvent> {
        let skip = self.len().saturating_sub(n);
        self.iter().skip(skip).cloned().collect()
    }
}
