//! Canonical per-chain state.

use solver_types::ChainState;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// The canonical snapshot store: one [`ChainState`] per chain, replaced
/// wholesale once per tick.
///
/// Readers never mutate the store — each tick evaluates against a clone, so
/// intra-tick inventory commits cannot leak into later ticks.
#[derive(Default)]
pub struct StateStore {
	states: RwLock<HashMap<u64, ChainState>>,
}

impl StateStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the snapshot for one chain.
	pub async fn replace(&self, chain_id: u64, state: ChainState) {
		self.states.write().await.insert(chain_id, state);
	}

	/// The per-tick working copy.
	pub async fn snapshot(&self) -> HashMap<u64, ChainState> {
		self.states.read().await.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::U256;

	#[tokio::test]
	async fn snapshot_mutations_do_not_reach_the_store() {
		let store = StateStore::new();
		let mut state = ChainState::default();
		state.native_balance = U256::from(5);
		store.replace(7, state).await;

		let mut snapshot = store.snapshot().await;
		if let Some(state) = snapshot.get_mut(&7) {
			state.native_balance = U256::ZERO;
		}

		assert_eq!(store.snapshot().await[&7].native_balance, U256::from(5));
	}

	#[tokio::test]
	async fn replace_overwrites_the_whole_chain_entry() {
		let store = StateStore::new();
		let mut first = ChainState::default();
		first.native_balance = U256::from(1);
		store.replace(7, first).await;

		let second = ChainState::default();
		store.replace(7, second).await;

		assert_eq!(store.snapshot().await[&7].native_balance, U256::ZERO);
	}
}
