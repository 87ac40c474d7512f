//! Retry-until-accepted protocols.
//!
//! Each helper attempts a non-blocking queue operation once and, while the
//! queue reports overflow (or underflow for the removal helpers), waits for a
//! retry opportunity and tries again. Two wait strategies exist:
//!
//! * timer variants tick on a fixed interval (`rate`),
//! * `*_event` variants wait on the queue's own signal channel: admission
//!   helpers on the output signal, removal helpers on the input signal.
//!
//! Cancellation is cooperative. When the token fires the helper performs
//! exactly one final attempt and returns its result, so a rejected item is
//! always handed back inside the error. A signal channel closing while
//! waiting is treated the same way. A closed queue ends the loop at once.
//!
//! Batched helpers do not keep a batch together under contention: other
//! producers may interleave between the admitted prefix and later retries.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::capability::{Dequeuer, Enqueuer, Event, Owner, PriorityEnqueuer};
use crate::config::RetryStrategy;
use crate::error::{DequeueError, EnqueueError};
use crate::signal::SignalReceiver;
use crate::wrapper::Priority;

/// Floor applied to timer rates; a zero period cannot drive an interval.
const MIN_RATE: Duration = Duration::from_millis(1);

enum Trigger {
	Timer(Interval),
	Signal(SignalReceiver),
}

impl Trigger {
	fn timer(rate: Duration) -> Self {
		let rate = rate.max(MIN_RATE);
		let mut interval = time::interval_at(Instant::now() + rate, rate);
		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
		Self::Timer(interval)
	}

	/// Waits for the next retry opportunity. Returns `false` once the
	/// trigger can never fire again.
	async fn wait(&mut self) -> bool {
		match self {
			Self::Timer(interval) => {
				interval.tick().await;
				true
			}
			Self::Signal(rx) => rx.recv().await.is_ok(),
		}
	}
}

/// Shared retry loop.
///
/// `attempt` performs one non-blocking try. `resume` inspects its outcome and
/// either recovers the state for another try (`Ok`) or ends the loop with the
/// outcome (`Err`). The trigger is only built once the first try fails.
async fn drive<S, R>(
	state: S,
	cancel: &CancellationToken,
	trigger: impl FnOnce() -> Trigger,
	mut attempt: impl FnMut(S) -> R,
	resume: impl Fn(R) -> Result<S, R>,
) -> R {
	let mut state = match resume(attempt(state)) {
		Ok(state) => state,
		Err(done) => return done,
	};
	let mut trigger = trigger();
	let mut retries = 0u64;
	loop {
		let woke = tokio::select! {
			biased;
			() = cancel.cancelled() => {
				tracing::trace!(retries, "retry.cancelled");
				false
			}
			open = trigger.wait() => {
				if !open {
					tracing::trace!(retries, "retry.signal_closed");
				}
				open
			}
		};
		if !woke {
			return attempt(state);
		}
		retries += 1;
		state = match resume(attempt(state)) {
			Ok(state) => state,
			Err(done) => return done,
		};
	}
}

fn retry_overflow<T>(outcome: Result<(), EnqueueError<T>>) -> Result<T, Result<(), EnqueueError<T>>> {
	match outcome {
		Err(EnqueueError::Overflow(item)) => Ok(item),
		other => Err(other),
	}
}

fn retry_underflow<T>(outcome: Result<T, DequeueError>) -> Result<(), Result<T, DequeueError>> {
	match outcome {
		Err(DequeueError::Underflow) => Ok(()),
		other => Err(other),
	}
}

/// Per-item priorities for the not-yet-admitted suffix of a batch.
///
/// Overflow always hands back a suffix, so the matching priorities are the
/// same-length suffix of the original slice. A broadcast batch keeps only its
/// first priority, so a suffix that happens to match the slice length is not
/// mistaken for per-item priorities.
fn remaining_priorities(priorities: &[Priority], original_len: usize, remaining: usize) -> &[Priority] {
	if priorities.len() == original_len && remaining <= priorities.len() {
		&priorities[priorities.len() - remaining..]
	} else {
		&priorities[..priorities.len().min(1)]
	}
}

/// Admits `item`, retrying every `rate` until it is accepted.
pub async fn must_priority_enqueue<Q, T>(
	queue: &Q,
	item: T,
	priority: Priority,
	cancel: &CancellationToken,
	rate: Duration,
) -> Result<(), EnqueueError<T>>
where
	Q: PriorityEnqueuer<T> + ?Sized,
{
	drive(
		item,
		cancel,
		|| Trigger::timer(rate),
		|item| queue.priority_enqueue(item, priority),
		retry_overflow,
	)
	.await
}

/// Admits `item`, retrying whenever the queue reports a removal.
pub async fn must_priority_enqueue_event<Q, T>(
	queue: &Q,
	item: T,
	priority: Priority,
	cancel: &CancellationToken,
) -> Result<(), EnqueueError<T>>
where
	Q: PriorityEnqueuer<T> + Event + ?Sized,
{
	drive(
		item,
		cancel,
		|| Trigger::Signal(queue.signal_out()),
		|item| queue.priority_enqueue(item, priority),
		retry_overflow,
	)
	.await
}

/// Admits a batch, retrying the un-admitted suffix every `rate`.
///
/// Per-item priorities stay attached to their items across partial
/// admissions.
pub async fn must_priority_enqueue_multiple<Q, T>(
	queue: &Q,
	items: Vec<T>,
	priorities: &[Priority],
	cancel: &CancellationToken,
	rate: Duration,
) -> Result<(), EnqueueError<Vec<T>>>
where
	Q: PriorityEnqueuer<T> + ?Sized,
{
	let original_len = items.len();
	drive(
		items,
		cancel,
		|| Trigger::timer(rate),
		|items: Vec<T>| {
			let priorities = remaining_priorities(priorities, original_len, items.len());
			queue.priority_enqueue_multiple(items, priorities)
		},
		retry_overflow,
	)
	.await
}

/// Event-driven counterpart of [`must_priority_enqueue_multiple`].
pub async fn must_priority_enqueue_multiple_event<Q, T>(
	queue: &Q,
	items: Vec<T>,
	priorities: &[Priority],
	cancel: &CancellationToken,
) -> Result<(), EnqueueError<Vec<T>>>
where
	Q: PriorityEnqueuer<T> + Event + ?Sized,
{
	let original_len = items.len();
	drive(
		items,
		cancel,
		|| Trigger::Signal(queue.signal_out()),
		|items: Vec<T>| {
			let priorities = remaining_priorities(priorities, original_len, items.len());
			queue.priority_enqueue_multiple(items, priorities)
		},
		retry_overflow,
	)
	.await
}

/// Admits `item` at the default priority, retrying every `rate`.
pub async fn must_enqueue<Q, T>(queue: &Q, item: T, cancel: &CancellationToken, rate: Duration) -> Result<(), EnqueueError<T>>
where
	Q: Enqueuer<T> + ?Sized,
{
	drive(item, cancel, || Trigger::timer(rate), |item| queue.enqueue(item), retry_overflow).await
}

/// Admits `item` at the default priority, retrying whenever the queue
/// reports a removal.
pub async fn must_enqueue_event<Q, T>(queue: &Q, item: T, cancel: &CancellationToken) -> Result<(), EnqueueError<T>>
where
	Q: Enqueuer<T> + Event + ?Sized,
{
	drive(
		item,
		cancel,
		|| Trigger::Signal(queue.signal_out()),
		|item| queue.enqueue(item),
		retry_overflow,
	)
	.await
}

/// Removes the head item, retrying every `rate` while the queue is empty.
pub async fn must_dequeue<Q, T>(queue: &Q, cancel: &CancellationToken, rate: Duration) -> Result<T, DequeueError>
where
	Q: Dequeuer<T> + ?Sized,
{
	drive((), cancel, || Trigger::timer(rate), |()| queue.dequeue(), retry_underflow).await
}

/// Removes the head item, retrying whenever the queue reports an admission.
pub async fn must_dequeue_event<Q, T>(queue: &Q, cancel: &CancellationToken) -> Result<T, DequeueError>
where
	Q: Dequeuer<T> + Event + ?Sized,
{
	drive((), cancel, || Trigger::Signal(queue.signal_in()), |()| queue.dequeue(), retry_underflow).await
}

/// Flushes the queue, retrying every `rate` until at least one item comes
/// out. Returns an empty vector if the queue is closed or cancellation wins
/// with nothing queued.
pub async fn must_flush<Q, T>(queue: &Q, cancel: &CancellationToken, rate: Duration) -> Vec<T>
where
	Q: Dequeuer<T> + Owner<T> + ?Sized,
{
	drive(
		(),
		cancel,
		|| Trigger::timer(rate),
		|()| queue.flush(),
		|items: Vec<T>| {
			if items.is_empty() && !queue.is_closed() {
				Ok(())
			} else {
				Err(items)
			}
		},
	)
	.await
}

/// Admits `item` using the wait strategy from configuration.
pub async fn enqueue_with_strategy<Q, T>(
	queue: &Q,
	item: T,
	priority: Priority,
	strategy: &RetryStrategy,
	cancel: &CancellationToken,
) -> Result<(), EnqueueError<T>>
where
	Q: PriorityEnqueuer<T> + Event + ?Sized,
{
	match strategy.interval() {
		Some(rate) => must_priority_enqueue(queue, item, priority, cancel, rate).await,
		None => must_priority_enqueue_event(queue, item, priority, cancel).await,
	}
}
