//! Ordering policy for the sequenced store.
//!
//! Wrappers are ordered by priority, highest first, and by admission instant,
//! earliest first, within equal priority. The sort is stable, so wrappers with
//! identical keys keep their relative position and equal-priority admissions
//! stay FIFO even when two instants compare equal.

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::wrapper::Wrapper;

/// Two-key comparator: priority descending, then `enqueued_at` ascending.
pub(crate) fn compare<T>(lhs: &Wrapper<T>, rhs: &Wrapper<T>) -> Ordering {
	rhs.priority.cmp(&lhs.priority).then_with(|| lhs.enqueued_at.cmp(&rhs.enqueued_at))
}

/// Re-establishes the ordering invariant after a mutation.
pub(crate) fn sort<T>(items: &mut VecDeque<Wrapper<T>>) {
	items.make_contiguous().sort_by(compare);
}

/// Returns `true` when `items` satisfies the ordering invariant.
pub(crate) fn is_ordered<T>(items: &VecDeque<Wrapper<T>>) -> bool {
	items
		.iter()
		.zip(items.iter().skip(1))
		.all(|(lhs, rhs)| compare(lhs, rhs) != Ordering::Greater)
}
