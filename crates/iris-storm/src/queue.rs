//! Per-subscriber event queue.
//!
//! Events are delivered one at a time in publish order. `publish` appends to
//! the pending sequence and, when the queue is idle, spawns a delivery task
//! that keeps taking the head until the queue drains. The subscriber is
//! called outside the queue lock, so a slow subscriber never blocks
//! publishers.
//!
//! The first failed delivery (an error, a panic, or the delivery task being
//! dropped with its runtime) poisons the queue: the fault is kept, pending
//! events are dropped, and later publishes are ignored.

use std::collections::VecDeque;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use metrics::counter;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::event::Event;
use crate::subscriber::{DeliveryError, Subscriber};

/// Observable state of an [`EventQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueState {
    /// Nothing in flight.
    Idle,
    /// One delivery in flight.
    Delivering,
    /// A delivery failed; nothing will be delivered again.
    Poisoned,
}

#[derive(Default)]
struct Inner {
    /// Head is the event in flight while `busy`.
    pending: VecDeque<Arc<Event>>,
    busy: bool,
    fault: Option<DeliveryError>,
    delivered: u64,
}

/// Ordered, one-at-a-time delivery to a single subscriber.
pub struct EventQueue {
    subscriber: Arc<dyn Subscriber>,
    runtime: Handle,
    inner: Mutex<Inner>,
    settled: Notify,
}

impl EventQueue {
    /// Create a queue delivering on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(subscriber: Arc<dyn Subscriber>) -> Arc<Self> {
        Self::with_handle(subscriber, Handle::current())
    }

    /// Create a queue delivering on `runtime`.
    pub fn with_handle(subscriber: Arc<dyn Subscriber>, runtime: Handle) -> Arc<Self> {
        Arc::new(Self {
            subscriber,
            runtime,
            inner: Mutex::new(Inner::default()),
            settled: Notify::new(),
        })
    }

    /// Id of the subscriber this queue delivers to.
    pub fn subscriber_id(&self) -> &str {
        self.subscriber.id()
    }

    /// Queue `event` for delivery. Never blocks and never fails; events
    /// published to a poisoned queue are dropped.
    pub fn publish(self: &Arc<Self>, event: impl Into<Arc<Event>>) {
        let start = {
            let mut inner = self.inner.lock();
            if inner.fault.is_some() {
                counter!("iris_events_dropped_total").increment(1);
                return;
            }
            inner.pending.push_back(event.into());
            !std::mem::replace(&mut inner.busy, true)
        };

        if start {
            let task = DrainTask {
                queue: Arc::clone(self),
                settled: false,
            };
            drop(self.runtime.spawn(task.run()));
        }
    }

    /// Current state.
    pub fn state(&self) -> QueueState {
        let inner = self.inner.lock();
        if inner.fault.is_some() {
            QueueState::Poisoned
        } else if inner.busy {
            QueueState::Delivering
        } else {
            QueueState::Idle
        }
    }

    /// Events not yet delivered, including the one in flight.
    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Successful deliveries so far.
    pub fn delivered(&self) -> u64 {
        self.inner.lock().delivered
    }

    /// The fault that poisoned the queue, if any.
    pub fn fault(&self) -> Option<DeliveryError> {
        self.inner.lock().fault.clone()
    }

    /// Whether a delivery has failed.
    pub fn is_poisoned(&self) -> bool {
        self.inner.lock().fault.is_some()
    }

    /// Wait until no delivery is in flight: the queue drained or got poisoned.
    pub async fn idle(&self) {
        loop {
            let settled = self.settled.notified();
            tokio::pin!(settled);
            let _ = settled.as_mut().enable();
            if self.state() != QueueState::Delivering {
                return;
            }
            settled.await;
        }
    }

    /// Record the outcome of the head delivery. Returns whether another
    /// delivery should start.
    fn complete(&self, outcome: Result<(), DeliveryError>) -> bool {
        let fault = match outcome {
            Ok(()) => {
                let mut inner = self.inner.lock();
                let _ = inner.pending.pop_front();
                inner.delivered += 1;
                counter!("iris_events_delivered_total").increment(1);
                if !inner.pending.is_empty() {
                    return true;
                }
                inner.busy = false;
                drop(inner);
                self.settled.notify_waiters();
                return false;
            }
            Err(fault) => fault,
        };
        self.poison(fault);
        false
    }

    fn poison(&self, fault: DeliveryError) {
        let mut inner = self.inner.lock();
        let discarded = inner.pending.len().saturating_sub(1);
        inner.pending.clear();
        inner.busy = false;
        inner.fault = Some(fault.clone());
        drop(inner);

        counter!("iris_subscribers_poisoned_total").increment(1);
        warn!(
            subscriber = self.subscriber.id(),
            error = %fault,
            discarded,
            "event delivery failed, subscriber poisoned"
        );
        self.settled.notify_waiters();
    }

    fn settle(&self) {
        self.inner.lock().busy = false;
        self.settled.notify_waiters();
        debug!(subscriber = self.subscriber.id(), "delivery task found no pending events");
    }
}

/// The delivery task of a queue. Dropping it before it settles (the runtime
/// shut down before or during a delivery) poisons the queue with
/// [`DeliveryError::Cancelled`], so `busy` never outlives the task.
struct DrainTask {
    queue: Arc<EventQueue>,
    settled: bool,
}

impl DrainTask {
    async fn run(mut self) {
        let queue = Arc::clone(&self.queue);
        loop {
            let head = queue.inner.lock().pending.front().cloned();
            let Some(event) = head else {
                self.settled = true;
                queue.settle();
                return;
            };

            let outcome = AssertUnwindSafe(queue.subscriber.deliver(&event))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(DeliveryError::Panicked(panic_message(panic.as_ref()))));

            if !queue.complete(outcome) {
                self.settled = true;
                return;
            }
        }
    }
}

impl Drop for DrainTask {
    fn drop(&mut self) {
        if !self.settled {
            self.queue.poison(DeliveryError::Cancelled);
        }
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("EventQueue")
            .field("subscriber", &self.subscriber.id())
            .field("pending", &inner.pending.len())
            .field("busy", &inner.busy)
            .field("fault", &inner.fault)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
