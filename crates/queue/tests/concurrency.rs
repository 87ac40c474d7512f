use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sluice_queue::retry::{must_dequeue_event, must_enqueue, must_enqueue_event, must_priority_enqueue_event};
use sluice_queue::{DequeueError, EnqueueError, PriorityQueue, QueueConfig, RetryStrategy, retry};
use tokio_util::sync::CancellationToken;

const PRODUCERS: u32 = 4;
const PER_PRODUCER: u32 = 200;

fn init_tracing() {
	let _ = tracing_subscriber::fmt::try_init();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn event_producers_and_consumer_exchange_every_item() {
	init_tracing();
	let queue = Arc::new(PriorityQueue::<u32>::new(8));
	let cancel = CancellationToken::new();

	let mut producers = Vec::new();
	for producer in 0..PRODUCERS {
		let queue = Arc::clone(&queue);
		let cancel = cancel.clone();
		producers.push(tokio::spawn(async move {
			for seq in 0..PER_PRODUCER {
				let item = producer * PER_PRODUCER + seq;
				must_priority_enqueue_event(&*queue, item, i64::from(seq % 3), &cancel).await?;
			}
			Ok::<_, EnqueueError<u32>>(())
		}));
	}

	let consumer_queue = Arc::clone(&queue);
	let consumer_cancel = cancel.clone();
	let consumer = tokio::spawn(async move {
		let mut seen = HashSet::new();
		for _ in 0..PRODUCERS * PER_PRODUCER {
			let item = must_dequeue_event(&*consumer_queue, &consumer_cancel).await?;
			assert!(seen.insert(item), "item {item} delivered twice");
		}
		Ok::<_, DequeueError>(seen)
	});

	let seen = tokio::time::timeout(Duration::from_secs(20), consumer)
		.await
		.expect("consumer should finish")
		.unwrap()
		.unwrap();
	for producer in producers {
		producer.await.unwrap().unwrap();
	}
	assert_eq!(seen.len(), (PRODUCERS * PER_PRODUCER) as usize);
	assert!(queue.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn timer_producers_respect_capacity() {
	init_tracing();
	let queue = Arc::new(PriorityQueue::<u32>::new(4));
	let cancel = CancellationToken::new();
	let done = Arc::new(AtomicBool::new(false));

	let watcher_queue = Arc::clone(&queue);
	let watcher_done = Arc::clone(&done);
	let watcher = tokio::spawn(async move {
		while !watcher_done.load(Ordering::Acquire) {
			assert!(watcher_queue.len() <= watcher_queue.capacity());
			tokio::task::yield_now().await;
		}
	});

	let mut producers = Vec::new();
	for producer in 0..PRODUCERS {
		let queue = Arc::clone(&queue);
		let cancel = cancel.clone();
		producers.push(tokio::spawn(async move {
			for seq in 0..50 {
				must_enqueue(&*queue, producer * 50 + seq, &cancel, Duration::from_millis(1)).await?;
			}
			Ok::<_, EnqueueError<u32>>(())
		}));
	}

	let mut received = 0;
	while received < PRODUCERS * 50 {
		let batch = retry::must_flush(&*queue, &cancel, Duration::from_millis(1)).await;
		assert!(batch.len() <= 4);
		received += batch.len() as u32;
	}
	for producer in producers {
		producer.await.unwrap().unwrap();
	}
	done.store(true, Ordering::Release);
	watcher.await.unwrap();
	assert_eq!(received, PRODUCERS * 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_releases_blocked_producers_with_their_items() {
	init_tracing();
	let queue = Arc::new(PriorityQueue::<u32>::with_config(&QueueConfig::with_capacity(2).retry(RetryStrategy::Event)));
	assert_eq!(queue.enqueue_multiple(vec![0, 1]), Ok(()));
	let cancel = CancellationToken::new();

	let mut blocked = Vec::new();
	for item in 10..13 {
		let queue = Arc::clone(&queue);
		let cancel = cancel.clone();
		blocked.push(tokio::spawn(async move { must_enqueue_event(&*queue, item, &cancel).await }));
	}
	tokio::time::sleep(Duration::from_millis(50)).await;

	let drained = queue.close();
	assert_eq!(drained, vec![0, 1]);

	let mut handed_back = Vec::new();
	for handle in blocked {
		let outcome = tokio::time::timeout(Duration::from_secs(1), handle)
			.await
			.expect("close should release producers")
			.unwrap();
		match outcome {
			Err(EnqueueError::Closed(item)) => handed_back.push(item),
			other => panic!("unexpected outcome {other:?}"),
		}
	}
	handed_back.sort_unstable();
	assert_eq!(handed_back, vec![10, 11, 12]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_unblocks_waiting_producer() {
	init_tracing();
	let queue = Arc::new(PriorityQueue::<u32>::new(1));
	assert_eq!(queue.enqueue(0), Ok(()));
	let cancel = CancellationToken::new();

	let task_queue = Arc::clone(&queue);
	let task_cancel = cancel.clone();
	let waiting = tokio::spawn(async move { must_enqueue_event(&*task_queue, 1, &task_cancel).await });
	tokio::time::sleep(Duration::from_millis(20)).await;
	cancel.cancel();

	let outcome = tokio::time::timeout(Duration::from_secs(1), waiting)
		.await
		.expect("cancellation should release producer")
		.unwrap();
	assert_eq!(outcome, Err(EnqueueError::Overflow(1)));
	assert_eq!(queue.peek(), vec![0]);
}

#[test]
fn std_threads_share_queue_without_loss() {
	init_tracing();
	let queue = Arc::new(PriorityQueue::<u32>::new(16));
	let total = PRODUCERS * PER_PRODUCER;

	let producers: Vec<_> = (0..PRODUCERS)
		.map(|producer| {
			let queue = Arc::clone(&queue);
			std::thread::spawn(move || {
				for seq in 0..PER_PRODUCER {
					let mut item = producer * PER_PRODUCER + seq;
					loop {
						match queue.priority_enqueue(item, i64::from(producer)) {
							Ok(()) => break,
							Err(EnqueueError::Overflow(back)) => {
								item = back;
								std::thread::yield_now();
							}
							Err(EnqueueError::Closed(_)) => panic!("queue closed unexpectedly"),
						}
					}
				}
			})
		})
		.collect();

	let consumer_queue = Arc::clone(&queue);
	let consumer = std::thread::spawn(move || {
		let mut seen = HashSet::new();
		while seen.len() < total as usize {
			let batch = consumer_queue.dequeue_multiple(5);
			if batch.is_empty() {
				std::thread::yield_now();
				continue;
			}
			for item in batch {
				assert!(seen.insert(item), "item {item} delivered twice");
			}
		}
		seen
	});

	for producer in producers {
		producer.join().unwrap();
	}
	let seen = consumer.join().unwrap();
	assert_eq!(seen.len(), total as usize);
	assert!(queue.close().is_empty());
}

#[test]
fn concurrent_lossy_admission_keeps_most_urgent() {
	init_tracing();
	let queue = Arc::new(PriorityQueue::<u32>::new(8));

	let writers: Vec<_> = (0..4u32)
		.map(|writer| {
			let queue = Arc::clone(&queue);
			std::thread::spawn(move || {
				for seq in 0..100u32 {
					let priority = i64::from(seq);
					queue.priority_enqueue_lossy(writer * 1000 + seq, priority).unwrap();
				}
			})
		})
		.collect();
	for writer in writers {
		writer.join().unwrap();
	}

	// The eight most urgent admissions are the 98s and 99s from every writer.
	let survivors = queue.flush();
	assert_eq!(survivors.len(), 8);
	assert!(survivors.iter().all(|item| item % 1000 >= 98), "{survivors:?}");
}
