//! Error types for queue admission, removal and signal waits.

use thiserror::Error;

/// Admission failure.
///
/// Both variants hand the rejected payload back so the caller can retry,
/// drop it, or surface it upstream. For batched admissions the payload is the
/// suffix of the batch that was not admitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnqueueError<T> {
	/// The queue was at capacity.
	#[error("queue is at capacity")]
	Overflow(T),
	/// The queue has been closed.
	#[error("queue is closed")]
	Closed(T),
}

impl<T> EnqueueError<T> {
	/// Returns the rejected payload.
	pub fn into_inner(self) -> T {
		match self {
			Self::Overflow(item) | Self::Closed(item) => item,
		}
	}

	/// Borrows the rejected payload.
	pub fn inner(&self) -> &T {
		match self {
			Self::Overflow(item) | Self::Closed(item) => item,
		}
	}

	pub fn is_overflow(&self) -> bool {
		matches!(self, Self::Overflow(_))
	}

	pub fn is_closed(&self) -> bool {
		matches!(self, Self::Closed(_))
	}
}

/// Removal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DequeueError {
	/// The queue was empty.
	#[error("queue is empty")]
	Underflow,
	/// The queue has been closed.
	#[error("queue is closed")]
	Closed,
}

/// Returned by [`SignalReceiver::recv`](crate::SignalReceiver::recv) once the
/// owning queue closed the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("signal channel closed")]
pub struct SignalClosed;
