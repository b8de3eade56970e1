//! Per-chain EVM clients.
//!
//! One [`ChainClient`] binds a chain id to an RPC endpoint and the solver's
//! wallet. It produces the block-event stream that drives the loop, reads the
//! per-chain snapshot, and submits the approve and relay transactions that
//! settle a trade.

pub mod blocks;
pub mod client;
pub mod contracts;
pub mod decode;

pub use blocks::{BlockEvent, BlockStream};
pub use client::EvmChainClient;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use solver_types::{ChainState, RelayRequest, RequestId, Result, SwapRequest};

/// Narrow interface the evaluator loop and executor consume.
///
/// Object-safe so tests can substitute stub chains for the EVM-backed
/// implementation.
#[async_trait]
pub trait ChainClient: Send + Sync {
	fn chain_id(&self) -> u64;

	/// The solver wallet address on this chain.
	fn solver_address(&self) -> Address;

	fn router_address(&self) -> Address;

	/// Token contracts the solver holds inventory in on this chain.
	fn tokens(&self) -> &[Address];

	/// Opens the block-event stream for this chain.
	///
	/// The stream is lazy, infinite and non-restartable: events are
	/// monotonic and gap-free from the block observed at subscription
	/// start, combining any native push subscription with a polling
	/// fallback.
	async fn subscribe_blocks(&self) -> Result<BlockStream>;

	/// Reads the full per-chain snapshot.
	///
	/// Partial results are acceptable (unreadable token balances are
	/// absent, transfers with failed parameter lookups are dropped); an
	/// unreadable native balance fails the snapshot so the tick is skipped.
	async fn fetch_state(&self) -> Result<ChainState>;

	/// Reads the parameter set this chain's router has stored for a
	/// request id. A zeroed result means the request is not verified here.
	async fn stored_parameters(&self, id: RequestId) -> Result<SwapRequest>;

	/// `ERC20.approve(spender, amount)`, one confirmation, status checked.
	async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<B256>;

	/// `Router.relayTokens(...)`, one confirmation, status checked.
	async fn relay(&self, relay: &RelayRequest) -> Result<B256>;

	/// Stops the transport. In-flight RPC calls finish or are cancelled.
	async fn close(&self);
}
