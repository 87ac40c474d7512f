//! Queue and retry configuration.

use std::time::Duration;

/// Capacity used by [`QueueConfig::default`].
pub const DEFAULT_CAPACITY: usize = 128;

/// Poll interval used by [`RetryStrategy::default`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// How a retry helper waits between admission attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "snake_case"))]
pub enum RetryStrategy {
	/// Retry on a fixed-interval timer.
	Poll { interval_ms: u64 },
	/// Retry whenever the queue reports a removal on its output signal.
	Event,
}

impl RetryStrategy {
	/// Timer-driven strategy. Sub-millisecond intervals round up to 1 ms.
	pub fn poll(interval: Duration) -> Self {
		let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(1);
		Self::Poll { interval_ms }
	}

	/// Poll interval, or `None` for the event-driven strategy.
	pub fn interval(&self) -> Option<Duration> {
		match self {
			Self::Poll { interval_ms } => Some(Duration::from_millis((*interval_ms).max(1))),
			Self::Event => None,
		}
	}
}

impl Default for RetryStrategy {
	fn default() -> Self {
		Self::poll(DEFAULT_POLL_INTERVAL)
	}
}

/// Construction-time settings for a [`PriorityQueue`](crate::PriorityQueue).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueConfig {
	capacity: usize,
	retry: RetryStrategy,
}

impl QueueConfig {
	/// Creates a config with the given capacity. Zero is coerced to 1.
	#[must_use]
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			capacity: capacity.max(1),
			..Self::default()
		}
	}

	/// Sets the retry strategy.
	#[must_use]
	pub fn retry(mut self, retry: RetryStrategy) -> Self {
		self.retry = retry;
		self
	}

	/// Effective capacity, never below 1.
	pub fn capacity(&self) -> usize {
		self.capacity.max(1)
	}

	pub fn retry_strategy(&self) -> RetryStrategy {
		self.retry
	}
}

impl Default for QueueConfig {
	fn default() -> Self {
		Self {
			capacity: DEFAULT_CAPACITY,
			retry: RetryStrategy::default(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_capacity_is_coerced() {
		assert_eq!(QueueConfig::with_capacity(0).capacity(), 1);
	}

	#[test]
	fn builder_sets_strategy() {
		let config = QueueConfig::with_capacity(8).retry(RetryStrategy::Event);
		assert_eq!(config.capacity(), 8);
		assert_eq!(config.retry_strategy(), RetryStrategy::Event);
		assert_eq!(config.retry_strategy().interval(), None);
	}

	#[test]
	fn poll_interval_rounds_up_to_one_millisecond() {
		let strategy = RetryStrategy::poll(Duration::from_micros(10));
		assert_eq!(strategy.interval(), Some(Duration::from_millis(1)));
		assert_eq!(RetryStrategy::default().interval(), Some(DEFAULT_POLL_INTERVAL));
	}

	#[cfg(feature = "serde")]
	#[test]
	fn parses_from_toml() {
		let config: QueueConfig = toml::from_str(
			r#"
capacity = 16

[retry]
mode = "poll"
interval_ms = 5
"#,
		)
		.unwrap();
		assert_eq!(config.capacity(), 16);
		assert_eq!(config.retry_strategy().interval(), Some(Duration::from_millis(5)));

		let event: QueueConfig = toml::from_str("[retry]\nmode = \"event\"\n").unwrap();
		assert_eq!(event.capacity(), DEFAULT_CAPACITY);
		assert_eq!(event.retry_strategy(), RetryStrategy::Event);
	}
}
