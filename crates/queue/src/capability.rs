//! Narrow capability traits.
//!
//! [`PriorityQueue`](crate::PriorityQueue) implements all of them; the retry
//! helpers and other collaborators depend only on the subset they need, so a
//! different queue type can be substituted as long as it honors the same
//! non-blocking contract.

use crate::error::{DequeueError, EnqueueError};
use crate::signal::SignalReceiver;
use crate::wrapper::Priority;

/// Result of a lossy admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LossyOutcome<T> {
	/// The item was admitted without displacing anything.
	Admitted,
	/// The item was admitted by evicting the returned lowest-priority resident.
	Evicted(T),
	/// The queue was full of items at least as urgent; the incoming item is
	/// handed back and the queue is unchanged.
	Rejected(T),
}

impl<T> LossyOutcome<T> {
	/// The discarded payload, if any.
	pub fn discarded(self) -> Option<T> {
		match self {
			Self::Admitted => None,
			Self::Evicted(item) | Self::Rejected(item) => Some(item),
		}
	}

	pub fn is_admitted(&self) -> bool {
		!matches!(self, Self::Rejected(_))
	}
}

/// Lifecycle ownership.
pub trait Owner<T> {
	/// Drains and returns every remaining item, then closes the queue.
	/// Calling it again returns an empty vector.
	fn close(&self) -> Vec<T>;

	fn is_closed(&self) -> bool;
}

pub trait Length {
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

pub trait Capacity {
	fn capacity(&self) -> usize;
}

/// Access to the queue's notification channels.
pub trait Event {
	/// Pulsed after every successful admission call.
	fn signal_in(&self) -> SignalReceiver;

	/// Pulsed after every successful removal call.
	fn signal_out(&self) -> SignalReceiver;
}

/// Read-only snapshots in dequeue order.
pub trait Peeker<T> {
	fn peek(&self) -> Vec<T>;

	fn peek_head(&self) -> Option<T>;

	fn peek_from_head(&self, n: usize) -> Vec<T>;
}

pub trait Dequeuer<T> {
	/// Removes the head item.
	fn dequeue(&self) -> Result<T, DequeueError>;

	/// Removes up to `n` items from the head. Empty on underflow.
	fn dequeue_multiple(&self, n: usize) -> Vec<T>;

	/// Removes everything up to the queue's capacity.
	fn flush(&self) -> Vec<T>;
}

/// Priority-agnostic admission using [`DEFAULT_PRIORITY`](crate::DEFAULT_PRIORITY).
pub trait Enqueuer<T> {
	fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>>;

	/// Admits items in order. On overflow the un-admitted suffix is returned;
	/// the admitted prefix stays queued.
	fn enqueue_multiple(&self, items: Vec<T>) -> Result<(), EnqueueError<Vec<T>>>;
}

pub trait EnqueueLossy<T> {
	fn enqueue_lossy(&self, item: T) -> Result<LossyOutcome<T>, EnqueueError<T>>;
}

pub trait PriorityEnqueuer<T> {
	fn priority_enqueue(&self, item: T, priority: Priority) -> Result<(), EnqueueError<T>>;

	/// Admits items in order with per-item priorities when `priorities`
	/// matches `items` in length, otherwise the first priority (or the
	/// default when empty) for all of them.
	///
	/// Not all-or-nothing: on overflow the admitted prefix stays queued and
	/// only the suffix is returned.
	fn priority_enqueue_multiple(&self, items: Vec<T>, priorities: &[Priority]) -> Result<(), EnqueueError<Vec<T>>>;
}

pub trait PriorityEnqueueLossy<T> {
	/// Admits `item`, evicting the lowest-priority resident when full and
	/// `priority` is strictly higher than it.
	fn priority_enqueue_lossy(&self, item: T, priority: Priority) -> Result<LossyOutcome<T>, EnqueueError<T>>;
}

pub trait Resizer<T> {
	/// Changes the capacity and returns any items discarded to fit.
	fn resize(&self, capacity: usize) -> Vec<T>;
}

pub trait GarbageCollector {
	/// Reallocates internal storage without changing contents.
	fn garbage_collect(&self);
}
