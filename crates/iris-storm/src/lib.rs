//! # iris-storm
//!
//! Publish/subscribe delivery:
//!
//! - [`EventQueue`]: ordered, one-in-flight delivery to one [`Subscriber`],
//!   poisoned by the first failure
//! - [`Topic`]: fan-out of each published [`Event`] to every subscriber queue

#![deny(unsafe_code)]

pub mod event;
pub mod queue;
pub mod subscriber;
pub mod topic;

pub use event::Event;
pub use queue::{EventQueue, QueueState};
pub use subscriber::{DeliveryError, Subscriber};
pub use topic::Topic;
