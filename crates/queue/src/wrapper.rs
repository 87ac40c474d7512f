use std::time::Instant;

/// Scheduling priority. Larger values are more urgent.
pub type Priority = i64;

/// Priority assigned to items admitted without an explicit priority.
pub const DEFAULT_PRIORITY: Priority = 0;

/// One admitted item plus its scheduling metadata.
///
/// `enqueued_at` is captured when the item is admitted and only ever used to
/// break ties between equal priorities.
#[derive(Debug, Clone)]
pub(crate) struct Wrapper<T> {
	pub(crate) item: T,
	pub(crate) priority: Priority,
	pub(crate) enqueued_at: Instant,
}

impl<T> Wrapper<T> {
	/// Wraps `item`, stamping it with the current instant.
	pub(crate) fn new(item: T, priority: Priority) -> Self {
		Self {
			item,
			priority,
			enqueued_at: Instant::now(),
		}
	}

	#[cfg(test)]
	pub(crate) fn at(item: T, priority: Priority, enqueued_at: Instant) -> Self {
		Self { item, priority, enqueued_at }
	}

	pub(crate) fn into_item(self) -> T {
		self.item
	}
}
