//! Fixed-capacity sequenced store of wrapped items.
//!
//! The store never grows past its configured capacity: admissions beyond it
//! are reported back to the caller rather than triggering a reallocation.
//! Primitives preserve the residual order and never touch signal channels;
//! pulses are the queue's responsibility so a batched call fires once.

use std::collections::VecDeque;

use crate::ordering;
use crate::wrapper::{Priority, Wrapper};

pub(crate) struct SequencedStore<T> {
	items: VecDeque<Wrapper<T>>,
	capacity: usize,
}

impl<T> SequencedStore<T> {
	/// Creates an empty store. `capacity` must already be coerced to >= 1.
	pub(crate) fn new(capacity: usize) -> Self {
		debug_assert!(capacity > 0, "store capacity must be > 0");
		Self {
			items: VecDeque::with_capacity(capacity),
			capacity,
		}
	}

	pub(crate) fn len(&self) -> usize {
		self.items.len()
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub(crate) fn capacity(&self) -> usize {
		self.capacity
	}

	pub(crate) fn is_full(&self) -> bool {
		self.items.len() >= self.capacity
	}

	/// Appends to the back. Hands the wrapper back on overflow without
	/// mutating the store.
	pub(crate) fn append(&mut self, wrapper: Wrapper<T>) -> Result<(), Wrapper<T>> {
		if self.is_full() {
			return Err(wrapper);
		}
		self.items.push_back(wrapper);
		Ok(())
	}

	/// Removes the item at position 0. `None` on underflow.
	pub(crate) fn remove_front(&mut self) -> Option<T> {
		self.items.pop_front().map(Wrapper::into_item)
	}

	/// Removes up to `n` items from the front, in front-to-back order.
	/// `None` on underflow.
	pub(crate) fn remove_front_many(&mut self, n: usize) -> Option<Vec<T>> {
		if self.is_empty() {
			return None;
		}
		let n = n.min(self.items.len());
		Some(self.items.drain(..n).map(Wrapper::into_item).collect())
	}

	/// Removes up to `n` items from the back, returned in front-to-back order.
	pub(crate) fn remove_back_many(&mut self, n: usize) -> Vec<T> {
		let n = n.min(self.items.len());
		let start = self.items.len() - n;
		self.items.drain(start..).map(Wrapper::into_item).collect()
	}

	/// Priority of the eviction candidate: the last wrapper in order, which is
	/// the lowest priority and, among equals, the most recently admitted.
	pub(crate) fn lowest_priority(&self) -> Option<Priority> {
		self.items.back().map(|w| w.priority)
	}

	/// Replaces the eviction candidate with `wrapper` and returns the evicted
	/// payload. The caller re-sorts afterwards.
	pub(crate) fn replace_lowest(&mut self, wrapper: Wrapper<T>) -> Option<T> {
		let evicted = self.items.pop_back();
		self.items.push_back(wrapper);
		evicted.map(Wrapper::into_item)
	}

	/// Reapplies the ordering policy.
	pub(crate) fn sort(&mut self) {
		ordering::sort(&mut self.items);
		debug_assert!(ordering::is_ordered(&self.items));
	}

	pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
		self.items.iter().map(|w| &w.item)
	}

	/// Changes the capacity. Callers trim the contents first when shrinking.
	pub(crate) fn set_capacity(&mut self, capacity: usize) {
		debug_assert!(capacity >= self.items.len());
		self.capacity = capacity;
		self.compact();
	}

	/// Moves the contents into a fresh buffer sized exactly to capacity.
	pub(crate) fn compact(&mut self) {
		let mut fresh = VecDeque::with_capacity(self.capacity);
		fresh.extend(self.items.drain(..));
		self.items = fresh;
	}

	#[cfg(test)]
	pub(crate) fn buffer_capacity(&self) -> usize {
		self.items.capacity()
	}
}
