//! Block-event streams.
//!
//! Each chain produces a lazy, infinite, non-restartable sequence of
//! `(chain_id, block_number)` events, monotonic and gap-free from the block
//! observed at subscription start. A native push subscription (when the
//! transport supports one) is merged with a polling fallback: whichever
//! source observes a new head first wins, duplicates are dropped, and gaps
//! are filled in catch-up order.

use alloy::providers::{DynProvider, Provider};
use alloy::pubsub::SubscriptionStream;
use alloy::rpc::types::Header;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Polling fallback cadence; also the longest native push may stay silent
/// before the fallback delivers.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// One new-block notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEvent {
	pub chain_id: u64,
	pub block_number: u64,
}

/// Receiving half of a chain's block subscription.
pub struct BlockStream {
	rx: mpsc::Receiver<BlockEvent>,
}

impl BlockStream {
	pub(crate) fn new(rx: mpsc::Receiver<BlockEvent>) -> Self {
		Self { rx }
	}

	/// A manually-fed stream, for clients that are not RPC-backed.
	pub fn channel(capacity: usize) -> (mpsc::Sender<BlockEvent>, Self) {
		let (tx, rx) = mpsc::channel(capacity);
		(tx, Self::new(rx))
	}

	/// Next block event; `None` once the producing task has stopped.
	pub async fn next(&mut self) -> Option<BlockEvent> {
		self.rx.recv().await
	}
}

/// Spawns the producer task feeding a [`BlockStream`].
pub(crate) fn spawn_block_task(chain_id: u64, provider: DynProvider) -> BlockStream {
	let (tx, rx) = mpsc::channel(1024);

	tokio::spawn(async move {
		let mut push = match provider.subscribe_blocks().await {
			Ok(subscription) => Some(subscription.into_stream()),
			Err(e) => {
				debug!(chain_id, error = %e, "no native block subscription; polling only");
				None
			}
		};

		let mut poll = tokio::time::interval(POLL_INTERVAL);
		poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

		let mut last_emitted: Option<u64> = None;
		loop {
			let head = tokio::select! {
				header = next_push(&mut push) => match header {
					Some(header) => header.number,
					None => {
						// Push stream ended; the poller keeps the
						// sequence alive and fills any gap.
						warn!(chain_id, "native block subscription ended; falling back to polling");
						push = None;
						continue;
					}
				},
				_ = poll.tick() => match provider.get_block_number().await {
					Ok(number) => number,
					Err(e) => {
						warn!(chain_id, error = %e, "block number poll failed");
						continue;
					}
				},
			};

			for block_number in catch_up(last_emitted, head) {
				if tx.send(BlockEvent { chain_id, block_number }).await.is_err() {
					return;
				}
				last_emitted = Some(block_number);
			}
		}
	});

	BlockStream::new(rx)
}

async fn next_push(push: &mut Option<SubscriptionStream<Header>>) -> Option<Header> {
	match push {
		Some(stream) => stream.next().await,
		None => std::future::pending().await,
	}
}

/// Blocks still owed given the last emitted block and the observed head.
///
/// The first observation yields exactly the head; afterwards every block
/// from `last + 1` up to the head is owed, which makes duplicate head
/// observations empty and reconnect gaps complete.
fn catch_up(last_emitted: Option<u64>, head: u64) -> std::ops::RangeInclusive<u64> {
	match last_emitted {
		None => head..=head,
		Some(last) if head > last => last + 1..=head,
		// Duplicate or stale observation: empty range.
		Some(last) => last + 1..=last,
	}
}
