//! Change notifications.
//!
//! Events carry identity only. Observers re-query the ingestor for the
//! current snapshot when one arrives.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::state::DeviceKey;

/// Which selection changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionLevel {
    Project,
    Device { project: String },
    Packet { device: DeviceKey },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A project was added
    ProjectsChanged,
    /// A device was added to the project
    DevicesChanged { project: String },
    /// A packet was added or updated, or the list was cleared
    PacketsChanged { device: DeviceKey },
    /// Selection at `level` is now `id`
    SelectionChanged {
        level: SelectionLevel,
        id: Option<String>,
    },
}

pub type SubscriptionId = u64;

/// Receiving end of a subscription
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    rx: UnboundedReceiver<Event>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next event, or None once unsubscribed and drained
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// All queued events
    pub fn drain(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// Fan-out registry. Each subscriber gets its own unbounded queue, so
/// publishing never blocks and never drops.
#[derive(Debug, Default)]
pub struct EventBus {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, UnboundedSender<Event>)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push((id, tx));
        Subscription { id, rx }
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.lock();
        let before = subs.len();
        subs.retain(|(sub_id, _)| *sub_id != id);
        subs.len() != before
    }

    pub fn publish(&self, event: Event) {
        self.publish_all(std::iter::once(event));
    }

    /// Deliver events in order to every live subscriber. Subscribers whose
    /// receiver was dropped are removed.
    pub fn publish_all(&self, events: impl IntoIterator<Item = Event>) {
        let mut subs = self.subscribers.lock();
        for event in events {
            tracing::trace!(?event, subscribers = subs.len(), "publish");
            subs.retain(|(_, tx)| tx.send(event.clone()).is_ok());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
