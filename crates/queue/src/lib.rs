//! Bounded concurrent priority queue.
//!
//! [`PriorityQueue`] holds at most `capacity` items, hands them out highest
//! priority first and FIFO within a priority, and never blocks: overflow and
//! underflow come back as values. Blocking behavior lives in [`retry`], which
//! turns a rejected admission into a wait on a timer or on the queue's own
//! signal channels, with cooperative cancellation.

/// Narrow capability traits implemented by the queue.
pub mod capability;
/// Queue and retry configuration.
pub mod config;
/// Admission, removal and signal errors.
pub mod error;
mod ordering;
/// The bounded priority queue.
pub mod queue;
/// Retry-until-accepted protocols.
pub mod retry;
/// Non-blocking notification channels.
pub mod signal;
mod store;
/// Priority type and item wrapper.
pub mod wrapper;

pub use capability::{
	Capacity, Dequeuer, EnqueueLossy, Enqueuer, Event, GarbageCollector, Length, LossyOutcome, Owner, Peeker, PriorityEnqueueLossy,
	PriorityEnqueuer, Resizer,
};
pub use config::{DEFAULT_CAPACITY, DEFAULT_POLL_INTERVAL, QueueConfig, RetryStrategy};
pub use error::{DequeueError, EnqueueError, SignalClosed};
pub use queue::PriorityQueue;
pub use signal::{Signal, SignalReceiver};
pub use wrapper::{DEFAULT_PRIORITY, Priority};
