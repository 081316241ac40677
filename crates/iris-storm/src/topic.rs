//! Fan-out of published events to every subscriber of a topic.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::event::Event;
use crate::queue::EventQueue;
use crate::subscriber::Subscriber;

/// A named topic holding one [`EventQueue`] per subscriber.
///
/// Poisoned queues are dropped from the topic on the next publish.
pub struct Topic {
    name: String,
    runtime: Handle,
    queues: RwLock<HashMap<String, Arc<EventQueue>>>,
}

impl Topic {
    /// Create a topic delivering on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_handle(name, Handle::current())
    }

    /// Create a topic delivering on `runtime`.
    pub fn with_handle(name: impl Into<String>, runtime: Handle) -> Self {
        Self {
            name: name.into(),
            runtime,
            queues: RwLock::new(HashMap::new()),
        }
    }

    /// Topic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a subscriber, replacing any subscriber with the same id.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> Arc<EventQueue> {
        let id = subscriber.id().to_string();
        let queue = EventQueue::with_handle(subscriber, self.runtime.clone());
        let replaced = self
            .queues
            .write()
            .insert(id.clone(), Arc::clone(&queue))
            .is_some();
        info!(topic = %self.name, subscriber = %id, replaced, "subscribed");
        queue
    }

    /// Remove the subscriber with `id`. Returns whether it was subscribed.
    pub fn unsubscribe(&self, id: &str) -> bool {
        let removed = self.queues.write().remove(id).is_some();
        if removed {
            info!(topic = %self.name, subscriber = id, "unsubscribed");
        }
        removed
    }

    /// Queue of the subscriber with `id`.
    pub fn queue(&self, id: &str) -> Option<Arc<EventQueue>> {
        self.queues.read().get(id).cloned()
    }

    /// Number of subscribers, poisoned ones included until reaped.
    pub fn subscriber_count(&self) -> usize {
        self.queues.read().len()
    }

    /// Hand `event` to every live subscriber. Returns how many received it.
    pub fn publish(&self, event: Event) -> usize {
        self.reap();

        let event = Arc::new(event);
        let queues: Vec<Arc<EventQueue>> = self.queues.read().values().cloned().collect();
        for queue in &queues {
            queue.publish(Arc::clone(&event));
        }
        debug!(
            topic = %self.name,
            operation = %event.operation,
            recipients = queues.len(),
            "event published"
        );
        queues.len()
    }

    /// Wait until no subscriber has a delivery in flight.
    pub async fn flush(&self) {
        let queues: Vec<Arc<EventQueue>> = self.queues.read().values().cloned().collect();
        for queue in queues {
            queue.idle().await;
        }
    }

    fn reap(&self) {
        let mut queues = self.queues.write();
        queues.retain(|id, queue| {
            if !queue.is_poisoned() {
                return true;
            }
            info!(
                topic = %self.name,
                subscriber = %id,
                fault = ?queue.fault(),
                "removing poisoned subscriber"
            );
            false
        });
    }
}
