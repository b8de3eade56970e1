//! TTL-bounded set of request ids currently being executed.

use moka::sync::Cache;
use solver_types::RequestId;
use std::time::Duration;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);
/// Default entry cap; the cache evicts when full.
pub const DEFAULT_CAPACITY: u64 = 1000;

/// Presence of a request id means the executor has taken responsibility for
/// it within the TTL window.
///
/// This is the sole synchronization point between concurrent ticks: the
/// executor inserts before its first on-chain side effect, deletes on
/// irrecoverable failure so a later tick may retry, and otherwise lets the
/// entry expire. Expiry is checked on read, so no background sweep runs.
#[derive(Clone)]
pub struct InFlightCache {
	entries: Cache<RequestId, ()>,
}

impl InFlightCache {
	pub fn new(ttl: Duration, capacity: u64) -> Self {
		Self {
			entries: Cache::builder()
				.time_to_live(ttl)
				.max_capacity(capacity)
				.build(),
		}
	}

	pub fn with_defaults() -> Self {
		Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
	}

	pub fn has(&self, id: &RequestId) -> bool {
		self.entries.contains_key(id)
	}

	pub fn insert(&self, id: RequestId) {
		self.entries.insert(id, ());
	}

	pub fn remove(&self, id: &RequestId) {
		self.entries.invalidate(id);
	}
}

impl Default for InFlightCache {
	fn default() -> Self {
		Self::with_defaults()
	}
}
