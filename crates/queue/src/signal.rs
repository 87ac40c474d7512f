//! Bounded, non-blocking, coalescing notification channel.
//!
//! A [`Signal`] holds at most `capacity` pending pulses. [`Signal::try_send`]
//! never blocks: when the channel is full the pulse is dropped. Each pulse is
//! consumed by exactly one receiver, so with several receivers a pulse wakes
//! one of them. The queue sizes its signals to its own capacity, which keeps
//! at least one pulse alive across any burst of operations.

use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Notify;

use crate::error::SignalClosed;

struct SignalShared {
	pending: AtomicUsize,
	capacity: AtomicUsize,
	closed: AtomicBool,
	notify: Notify,
}

impl SignalShared {
	fn take(&self) -> bool {
		self.pending
			.fetch_update(Ordering::AcqRel, Ordering::Acquire, |pending| pending.checked_sub(1))
			.is_ok()
	}
}

/// Sending half of a signal channel, owned by the queue.
pub struct Signal {
	shared: Arc<SignalShared>,
}

/// Receiving half of a signal channel.
///
/// Cheap to clone; every clone competes for the same pulses.
#[derive(Clone)]
pub struct SignalReceiver {
	shared: Arc<SignalShared>,
}

impl Signal {
	/// Creates an open channel holding at most `capacity` pending pulses
	/// (coerced to at least 1).
	pub fn new(capacity: usize) -> Self {
		Self {
			shared: Arc::new(SignalShared {
				pending: AtomicUsize::new(0),
				capacity: AtomicUsize::new(capacity.max(1)),
				closed: AtomicBool::new(false),
				notify: Notify::new(),
			}),
		}
	}

	/// Returns a receiver bound to this channel.
	pub fn subscribe(&self) -> SignalReceiver {
		SignalReceiver {
			shared: Arc::clone(&self.shared),
		}
	}

	/// Records one pulse without blocking.
	///
	/// Returns `false` when the pulse was dropped because the channel is full
	/// or closed.
	pub fn try_send(&self) -> bool {
		let shared = &self.shared;
		if shared.closed.load(Ordering::Acquire) {
			return false;
		}
		let capacity = shared.capacity.load(Ordering::Acquire);
		let sent = shared
			.pending
			.fetch_update(Ordering::AcqRel, Ordering::Acquire, |pending| (pending < capacity).then_some(pending + 1))
			.is_ok();
		if sent {
			shared.notify.notify_one();
		}
		sent
	}

	/// Closes the channel and wakes every waiting receiver.
	///
	/// Pending pulses are discarded. Returns `false` if the channel was
	/// already closed; repeated calls are harmless.
	pub fn close(&self) -> bool {
		let shared = &self.shared;
		if shared.closed.swap(true, Ordering::AcqRel) {
			return false;
		}
		shared.pending.store(0, Ordering::Release);
		shared.notify.notify_waiters();
		true
	}

	pub fn is_closed(&self) -> bool {
		self.shared.closed.load(Ordering::Acquire)
	}

	/// Maximum number of pending pulses.
	pub fn capacity(&self) -> usize {
		self.shared.capacity.load(Ordering::Acquire)
	}

	/// Changes the pending-pulse limit, dropping pulses above it.
	pub(crate) fn set_capacity(&self, capacity: usize) {
		let capacity = capacity.max(1);
		let shared = &self.shared;
		shared.capacity.store(capacity, Ordering::Release);
		let _ = shared
			.pending
			.fetch_update(Ordering::AcqRel, Ordering::Acquire, |pending| Some(pending.min(capacity)));
	}
}

impl std::fmt::Debug for Signal {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Signal")
			.field("pending", &self.shared.pending.load(Ordering::Relaxed))
			.field("capacity", &self.capacity())
			.field("closed", &self.is_closed())
			.finish()
	}
}

impl SignalReceiver {
	/// Waits for one pulse.
	///
	/// Returns [`SignalClosed`] once the channel has been closed, including
	/// for receivers that were already waiting.
	pub async fn recv(&self) -> Result<(), SignalClosed> {
		let shared = &self.shared;
		loop {
			// Register interest before checking state so a pulse or close
			// landing in between still wakes this waiter.
			let mut notified = pin!(shared.notify.notified());
			notified.as_mut().enable();

			if shared.closed.load(Ordering::Acquire) {
				return Err(SignalClosed);
			}
			if shared.take() {
				return Ok(());
			}
			notified.await;
		}
	}

	/// Consumes one pending pulse without waiting.
	pub fn try_recv(&self) -> bool {
		!self.is_closed() && self.shared.take()
	}

	/// Number of pulses currently pending.
	pub fn pending(&self) -> usize {
		self.shared.pending.load(Ordering::Acquire)
	}

	pub fn is_closed(&self) -> bool {
		self.shared.closed.load(Ordering::Acquire)
	}
}

impl std::fmt::Debug for SignalReceiver {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SignalReceiver")
			.field("pending", &self.pending())
			.field("closed", &self.is_closed())
			.finish()
	}
}
