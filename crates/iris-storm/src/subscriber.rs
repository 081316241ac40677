//! The delivery capability of a subscriber.

use async_trait::async_trait;
use thiserror::Error;

use crate::event::Event;

/// Terminal failure of one delivery. Poisons the subscriber's queue.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The subscriber could not be reached.
    #[error("subscriber unreachable: {0}")]
    Unreachable(String),
    /// The subscriber refused the event.
    #[error("subscriber rejected event: {0}")]
    Rejected(String),
    /// The delivery code panicked.
    #[error("delivery panicked: {0}")]
    Panicked(String),
    /// The delivery task was dropped before it finished, e.g. because its
    /// runtime shut down.
    #[error("delivery task cancelled")]
    Cancelled,
}

/// A pub/sub destination.
#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
    /// Stable id, used as the topic key and in logs.
    fn id(&self) -> &str;

    /// Deliver one event. Called at most once at a time per queue.
    async fn deliver(&self, event: &Event) -> Result<(), DeliveryError>;
}
