use parking_lot::RwLock;

use crate::capability::{
	Capacity, Dequeuer, EnqueueLossy, Enqueuer, Event, GarbageCollector, Length, LossyOutcome, Owner, Peeker, PriorityEnqueueLossy,
	PriorityEnqueuer, Resizer,
};
use crate::config::QueueConfig;
use crate::error::{DequeueError, EnqueueError};
use crate::signal::{Signal, SignalReceiver};
use crate::store::SequencedStore;
use crate::wrapper::{DEFAULT_PRIORITY, Priority, Wrapper};

/// Bounded, priority-ordered queue shared between producers and consumers.
///
/// Items leave in priority order, highest first, and FIFO within a priority.
/// Every operation is non-blocking and holds the internal lock for its whole
/// duration, so concurrent calls are linearizable. Overflow and underflow are
/// returned as values; the retry helpers in [`crate::retry`] turn them into
/// waits.
///
/// Two [`Signal`] channels sized to the queue's capacity announce activity:
/// the input signal after each successful admission call and the output
/// signal after each successful removal call. Sends to them never block, so a
/// slow waiter can never stall the queue.
///
/// Once closed, admissions return [`EnqueueError::Closed`], removals return
/// [`DequeueError::Closed`] or nothing, and `len`/`capacity` read as zero.
pub struct PriorityQueue<T> {
	state: RwLock<Option<SequencedStore<T>>>,
	signal_in: Signal,
	signal_out: Signal,
}

impl<T> PriorityQueue<T> {
	/// Creates an empty queue. A `capacity` below 1 is coerced to 1.
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			state: RwLock::new(Some(SequencedStore::new(capacity))),
			signal_in: Signal::new(capacity),
			signal_out: Signal::new(capacity),
		}
	}

	/// Creates an empty queue sized from `config`.
	pub fn with_config(config: &QueueConfig) -> Self {
		Self::new(config.capacity())
	}

	/// Admits `item` at `priority`, or hands it back on overflow.
	pub fn priority_enqueue(&self, item: T, priority: Priority) -> Result<(), EnqueueError<T>> {
		let mut state = self.state.write();
		let Some(store) = state.as_mut() else {
			return Err(EnqueueError::Closed(item));
		};
		if let Err(rejected) = store.append(Wrapper::new(item, priority)) {
			tracing::trace!(capacity = store.capacity(), priority, "queue.overflow");
			return Err(EnqueueError::Overflow(rejected.into_item()));
		}
		store.sort();
		self.signal_in.try_send();
		Ok(())
	}

	/// Admits `items` in order and returns the un-admitted suffix on overflow.
	///
	/// Priorities are per item when `priorities` matches `items` in length,
	/// otherwise the first one (or [`DEFAULT_PRIORITY`]) applies to all.
	pub fn priority_enqueue_multiple(&self, items: Vec<T>, priorities: &[Priority]) -> Result<(), EnqueueError<Vec<T>>> {
		let mut state = self.state.write();
		let Some(store) = state.as_mut() else {
			return Err(EnqueueError::Closed(items));
		};

		let per_item = priorities.len() == items.len();
		let shared = priorities.first().copied().unwrap_or(DEFAULT_PRIORITY);
		let mut admitted = 0usize;
		let mut remaining = None;
		let mut pending = items.into_iter();
		while let Some(item) = pending.next() {
			let priority = if per_item { priorities[admitted] } else { shared };
			if let Err(rejected) = store.append(Wrapper::new(item, priority)) {
				let mut rest = Vec::with_capacity(pending.len() + 1);
				rest.push(rejected.into_item());
				rest.extend(pending);
				remaining = Some(rest);
				break;
			}
			admitted += 1;
		}

		if admitted > 0 {
			store.sort();
			self.signal_in.try_send();
		}
		match remaining {
			Some(rest) => {
				tracing::trace!(admitted, remaining = rest.len(), capacity = store.capacity(), "queue.overflow.partial");
				Err(EnqueueError::Overflow(rest))
			}
			None => Ok(()),
		}
	}

	/// Admits `item`, evicting the lowest-priority resident when full and
	/// `priority` is strictly higher than it.
	pub fn priority_enqueue_lossy(&self, item: T, priority: Priority) -> Result<LossyOutcome<T>, EnqueueError<T>> {
		let mut state = self.state.write();
		let Some(store) = state.as_mut() else {
			return Err(EnqueueError::Closed(item));
		};

		let wrapper = match store.append(Wrapper::new(item, priority)) {
			Ok(()) => {
				store.sort();
				self.signal_in.try_send();
				return Ok(LossyOutcome::Admitted);
			}
			Err(wrapper) => wrapper,
		};

		match store.lowest_priority() {
			Some(lowest) if priority > lowest => {}
			lowest => {
				tracing::trace!(priority, ?lowest, "queue.lossy.reject");
				return Ok(LossyOutcome::Rejected(wrapper.into_item()));
			}
		}

		let evicted = store.replace_lowest(wrapper);
		store.sort();
		self.signal_in.try_send();
		match evicted {
			Some(evicted) => {
				tracing::trace!(priority, "queue.lossy.evict");
				Ok(LossyOutcome::Evicted(evicted))
			}
			None => Ok(LossyOutcome::Admitted),
		}
	}

	/// Admits `item` at [`DEFAULT_PRIORITY`].
	pub fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
		self.priority_enqueue(item, DEFAULT_PRIORITY)
	}

	/// Admits `items` at [`DEFAULT_PRIORITY`].
	pub fn enqueue_multiple(&self, items: Vec<T>) -> Result<(), EnqueueError<Vec<T>>> {
		self.priority_enqueue_multiple(items, &[])
	}

	/// Lossy admission at [`DEFAULT_PRIORITY`].
	pub fn enqueue_lossy(&self, item: T) -> Result<LossyOutcome<T>, EnqueueError<T>> {
		self.priority_enqueue_lossy(item, DEFAULT_PRIORITY)
	}

	/// Removes the highest-priority, earliest-admitted item.
	pub fn dequeue(&self) -> Result<T, DequeueError> {
		let mut state = self.state.write();
		let Some(store) = state.as_mut() else {
			return Err(DequeueError::Closed);
		};
		let item = store.remove_front().ok_or(DequeueError::Underflow)?;
		self.signal_out.try_send();
		Ok(item)
	}

	/// Removes up to `n` items from the head. Empty on underflow.
	pub fn dequeue_multiple(&self, n: usize) -> Vec<T> {
		let mut state = self.state.write();
		let Some(store) = state.as_mut() else {
			return Vec::new();
		};
		let Some(items) = store.remove_front_many(n) else {
			return Vec::new();
		};
		if !items.is_empty() {
			self.signal_out.try_send();
		}
		items
	}

	/// Removes every queued item, up to capacity.
	pub fn flush(&self) -> Vec<T> {
		let mut state = self.state.write();
		let Some(store) = state.as_mut() else {
			return Vec::new();
		};
		let Some(items) = store.remove_front_many(store.capacity()) else {
			return Vec::new();
		};
		self.signal_out.try_send();
		items
	}

	/// Number of queued items; 0 once closed.
	pub fn len(&self) -> usize {
		self.state.read().as_ref().map_or(0, SequencedStore::len)
	}

	/// Returns `true` if nothing is queued.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Maximum number of items; 0 once closed.
	pub fn capacity(&self) -> usize {
		self.state.read().as_ref().map_or(0, SequencedStore::capacity)
	}

	/// Returns `true` after [`close`](Self::close).
	pub fn is_closed(&self) -> bool {
		self.state.read().is_none()
	}

	/// Receiver pulsed after each successful admission call.
	pub fn signal_in(&self) -> SignalReceiver {
		self.signal_in.subscribe()
	}

	/// Receiver pulsed after each successful removal call.
	pub fn signal_out(&self) -> SignalReceiver {
		self.signal_out.subscribe()
	}

	/// Drains the queue, closes both signals and marks it unusable.
	///
	/// Items come back in dequeue order. Safe to call more than once.
	pub fn close(&self) -> Vec<T> {
		let mut state = self.state.write();
		let remaining = state
			.take()
			.and_then(|mut store| store.remove_front_many(store.len()))
			.unwrap_or_default();
		let closed_in = self.signal_in.close();
		let closed_out = self.signal_out.close();
		if closed_in || closed_out {
			tracing::debug!(drained = remaining.len(), "queue.close");
		}
		remaining
	}

	/// Changes the capacity. A `capacity` below 1 is coerced to 1.
	///
	/// Shrinking below the current length discards the lowest-priority
	/// residents, returned in dequeue order. Growing pulses the output signal
	/// because room just became available. Existing signal receivers stay
	/// valid.
	pub fn resize(&self, capacity: usize) -> Vec<T> {
		let capacity = capacity.max(1);
		let mut state = self.state.write();
		let Some(store) = state.as_mut() else {
			return Vec::new();
		};
		let previous = store.capacity();
		if capacity == previous {
			return Vec::new();
		}

		let discarded = store.remove_back_many(store.len().saturating_sub(capacity));
		store.set_capacity(capacity);
		self.signal_in.set_capacity(capacity);
		self.signal_out.set_capacity(capacity);
		if capacity > previous {
			self.signal_out.try_send();
		}
		tracing::debug!(previous, capacity, discarded = discarded.len(), "queue.resize");
		discarded
	}

	/// Reallocates the backing buffer at exactly the configured capacity.
	pub fn garbage_collect(&self) {
		if let Some(store) = self.state.write().as_mut() {
			store.compact();
		}
	}
}

impl<T: Clone> PriorityQueue<T> {
	/// Snapshot of every item in dequeue order.
	pub fn peek(&self) -> Vec<T> {
		self.state
			.read()
			.as_ref()
			.map(|store| store.iter().cloned().collect())
			.unwrap_or_default()
	}

	/// Clone of the head item, if any.
	pub fn peek_head(&self) -> Option<T> {
		self.state.read().as_ref().and_then(|store| store.iter().next().cloned())
	}

	/// Clones of up to `n` items from the head.
	pub fn peek_from_head(&self, n: usize) -> Vec<T> {
		self.state
			.read()
			.as_ref()
			.map(|store| store.iter().take(n).cloned().collect())
			.unwrap_or_default()
	}
}

impl<T> std::fmt::Debug for PriorityQueue<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.read();
		f.debug_struct("PriorityQueue")
			.field("len", &state.as_ref().map_or(0, SequencedStore::len))
			.field("capacity", &state.as_ref().map_or(0, SequencedStore::capacity))
			.field("closed", &state.is_none())
			.finish()
	}
}

impl<T> Owner<T> for PriorityQueue<T> {
	fn close(&self) -> Vec<T> {
		PriorityQueue::close(self)
	}

	fn is_closed(&self) -> bool {
		PriorityQueue::is_closed(self)
	}
}

impl<T> Length for PriorityQueue<T> {
	fn len(&self) -> usize {
		PriorityQueue::len(self)
	}
}

impl<T> Capacity for PriorityQueue<T> {
	fn capacity(&self) -> usize {
		PriorityQueue::capacity(self)
	}
}

impl<T> Event for PriorityQueue<T> {
	fn signal_in(&self) -> SignalReceiver {
		PriorityQueue::signal_in(self)
	}

	fn signal_out(&self) -> SignalReceiver {
		PriorityQueue::signal_out(self)
	}
}

impl<T: Clone> Peeker<T> for PriorityQueue<T> {
	fn peek(&self) -> Vec<T> {
		PriorityQueue::peek(self)
	}

	fn peek_head(&self) -> Option<T> {
		PriorityQueue::peek_head(self)
	}

	fn peek_from_head(&self, n: usize) -> Vec<T> {
		PriorityQueue::peek_from_head(self, n)
	}
}

impl<T> Dequeuer<T> for PriorityQueue<T> {
	fn dequeue(&self) -> Result<T, DequeueError> {
		PriorityQueue::dequeue(self)
	}

	fn dequeue_multiple(&self, n: usize) -> Vec<T> {
		PriorityQueue::dequeue_multiple(self, n)
	}

	fn flush(&self) -> Vec<T> {
		PriorityQueue::flush(self)
	}
}

impl<T> Enqueuer<T> for PriorityQueue<T> {
	fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
		PriorityQueue::enqueue(self, item)
	}

	fn enqueue_multiple(&self, items: Vec<T>) -> Result<(), EnqueueError<Vec<T>>> {
		PriorityQueue::enqueue_multiple(self, items)
	}
}

impl<T> EnqueueLossy<T> for PriorityQueue<T> {
	fn enqueue_lossy(&self, item: T) -> Result<LossyOutcome<T>, EnqueueError<T>> {
		PriorityQueue::enqueue_lossy(self, item)
	}
}

impl<T> PriorityEnqueuer<T> for PriorityQueue<T> {
	fn priority_enqueue(&self, item: T, priority: Priority) -> Result<(), EnqueueError<T>> {
		PriorityQueue::priority_enqueue(self, item, priority)
	}

	fn priority_enqueue_multiple(&self, items: Vec<T>, priorities: &[Priority]) -> Result<(), EnqueueError<Vec<T>>> {
		PriorityQueue::priority_enqueue_multiple(self, items, priorities)
	}
}

impl<T> PriorityEnqueueLossy<T> for PriorityQueue<T> {
	fn priority_enqueue_lossy(&self, item: T, priority: Priority) -> Result<LossyOutcome<T>, EnqueueError<T>> {
		PriorityQueue::priority_enqueue_lossy(self, item, priority)
	}
}

impl<T> Resizer<T> for PriorityQueue<T> {
	fn resize(&self, capacity: usize) -> Vec<T> {
		PriorityQueue::resize(self, capacity)
	}
}

impl<T> GarbageCollector for PriorityQueue<T> {
	fn garbage_collect(&self) {
		PriorityQueue::garbage_collect(self)
	}
}
