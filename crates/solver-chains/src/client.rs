//! Alloy-backed EVM chain client.
//!
//! Wraps one provider + wallet pair per configured network. Read calls are
//! plain `eth_call`s with hand-encoded calldata; writes estimate gas, apply
//! the configured buffers, then wait for one confirmation and a successful
//! receipt status.

use crate::blocks::{spawn_block_task, BlockStream};
use crate::contracts::{known_selector, IERC20, IRouter};
use crate::decode::decode_swap_parameters;
use crate::ChainClient;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use solver_config::NetworkConfig;
use solver_types::{
	ChainState, RelayRequest, RequestId, Result, SolverError, SwapRequest, Transfer,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

pub struct EvmChainClient {
	chain_id: u64,
	solver: Address,
	router: Address,
	tokens: Vec<Address>,
	gas_buffer_pct: u64,
	gas_price_buffer_pct: u64,
	provider: DynProvider,
}

impl EvmChainClient {
	/// Connects to the configured endpoint and verifies it serves the
	/// expected chain. WS endpoints get a native block subscription on top
	/// of the polling fallback.
	pub async fn connect(network: &NetworkConfig, signer: PrivateKeySigner) -> Result<Self> {
		let solver = signer.address();
		let wallet = EthereumWallet::from(signer);

		let provider = ProviderBuilder::new()
			.wallet(wallet)
			.connect(&network.rpc_url)
			.await
			.map_err(|e| {
				SolverError::Chain(format!(
					"failed to connect to chain {}: {e}",
					network.chain_id
				))
			})?
			.erased();

		let reported = provider
			.get_chain_id()
			.await
			.map_err(|e| SolverError::Chain(format!("failed to read chain id: {e}")))?;
		if reported != network.chain_id {
			return Err(SolverError::Chain(format!(
				"chain id mismatch: configured {}, endpoint reports {reported}",
				network.chain_id
			)));
		}

		info!(
			chain_id = network.chain_id,
			solver = %solver,
			router = %network.router_address,
			tokens = network.tokens.len(),
			"chain client connected"
		);

		Ok(Self {
			chain_id: network.chain_id,
			solver,
			router: network.router_address,
			tokens: network.tokens.clone(),
			gas_buffer_pct: network.tx_gas_buffer,
			gas_price_buffer_pct: network.tx_gas_price_buffer,
			provider,
		})
	}

	async fn call(&self, to: Address, calldata: Vec<u8>) -> Result<Bytes> {
		let tx = TransactionRequest::default()
			.with_from(self.solver)
			.with_to(to)
			.with_input(calldata);
		self.provider
			.call(tx)
			.await
			.map_err(|e| SolverError::Chain(format!("eth_call on chain {} failed: {e}", self.chain_id)))
	}

	async fn token_balance(&self, token: Address) -> Result<U256> {
		let calldata = IERC20::balanceOfCall { account: self.solver }.abi_encode();
		let data = self.call(token, calldata).await?;
		IERC20::balanceOfCall::abi_decode_returns(&data)
			.map_err(|e| SolverError::Decode(format!("balanceOf({token}): {e}")))
	}

	/// Estimates, buffers, submits and waits for one confirmation.
	async fn send_buffered(&self, to: Address, calldata: Vec<u8>) -> Result<TransactionReceipt> {
		let mut tx = TransactionRequest::default()
			.with_from(self.solver)
			.with_to(to)
			.with_input(calldata);

		let gas = self
			.provider
			.estimate_gas(tx.clone())
			.await
			.map_err(|e| self.execution_error("gas estimation", e))?;
		tx = tx.with_gas_limit(gas.saturating_mul(self.gas_buffer_pct) / 100);

		let gas_price = self
			.provider
			.get_gas_price()
			.await
			.map_err(|e| SolverError::Chain(format!("gas price read failed: {e}")))?;
		tx = tx.with_gas_price(gas_price.saturating_mul(self.gas_price_buffer_pct as u128) / 100);

		let pending = self
			.provider
			.send_transaction(tx)
			.await
			.map_err(|e| self.execution_error("submission", e))?;
		let tx_hash = *pending.tx_hash();
		debug!(chain_id = self.chain_id, tx_hash = %tx_hash, "transaction submitted");

		pending
			.with_required_confirmations(1)
			.get_receipt()
			.await
			.map_err(|e| self.execution_error("receipt wait", e))
	}

	/// Maps a submission-side error, naming known revert selectors.
	fn execution_error(&self, stage: &str, error: impl std::fmt::Display) -> SolverError {
		let message = error.to_string();
		match known_selector(&message) {
			Some(name) => SolverError::Execution(format!(
				"{stage} on chain {} reverted with {name}: {message}",
				self.chain_id
			)),
			None => SolverError::Execution(format!(
				"{stage} on chain {} failed: {message}",
				self.chain_id
			)),
		}
	}
}

#[async_trait]
impl ChainClient for EvmChainClient {
	fn chain_id(&self) -> u64 {
		self.chain_id
	}

	fn solver_address(&self) -> Address {
		self.solver
	}

	fn router_address(&self) -> Address {
		self.router
	}

	fn tokens(&self) -> &[Address] {
		&self.tokens
	}

	async fn subscribe_blocks(&self) -> Result<BlockStream> {
		Ok(spawn_block_task(self.chain_id, self.provider.clone()))
	}

	async fn fetch_state(&self) -> Result<ChainState> {
		// An unreadable native balance means nothing on this chain can be
		// trusted this tick; report upward so the tick is skipped.
		let native_balance = self
			.provider
			.get_balance(self.solver)
			.await
			.map_err(|e| SolverError::Chain(format!("native balance read failed: {e}")))?;

		let reads = self.tokens.iter().map(|token| async move {
			(*token, self.token_balance(*token).await)
		});
		let mut token_balances = HashMap::new();
		for (token, result) in futures::future::join_all(reads).await {
			match result {
				Ok(balance) => {
					token_balances.insert(token, balance);
				}
				Err(e) => {
					warn!(
						chain_id = self.chain_id,
						token = %token,
						error = %e,
						"token balance unreadable this tick"
					);
				}
			}
		}

		let data = self
			.call(self.router, IRouter::getFulfilledTransfersCall {}.abi_encode())
			.await?;
		let fulfilled = IRouter::getFulfilledTransfersCall::abi_decode_returns(&data)
			.map_err(|e| SolverError::Decode(format!("getFulfilledTransfers: {e}")))?;
		let already_fulfilled: HashSet<RequestId> =
			fulfilled.into_iter().map(RequestId::new).collect();

		let data = self
			.call(
				self.router,
				IRouter::getUnfulfilledSolverRefundsCall {}.abi_encode(),
			)
			.await?;
		let open_ids = IRouter::getUnfulfilledSolverRefundsCall::abi_decode_returns(&data)
			.map_err(|e| SolverError::Decode(format!("getUnfulfilledSolverRefunds: {e}")))?;

		let mut transfers = Vec::with_capacity(open_ids.len());
		for id in open_ids.into_iter().map(RequestId::new) {
			match self.stored_parameters(id).await {
				Ok(params) => transfers.push(Transfer::new(id, params)),
				Err(e) => {
					// One bad lookup must not sink the whole snapshot.
					warn!(
						chain_id = self.chain_id,
						request_id = %id.short(),
						error = %e,
						"dropping transfer; parameter lookup failed"
					);
				}
			}
		}

		Ok(ChainState {
			native_balance,
			token_balances,
			transfers,
			already_fulfilled,
		})
	}

	async fn stored_parameters(&self, id: RequestId) -> Result<SwapRequest> {
		let calldata = IRouter::getSwapRequestParametersCall {
			requestId: id.as_word(),
		}
		.abi_encode();
		let data = self.call(self.router, calldata).await?;
		decode_swap_parameters(&data, &id)
	}

	async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<B256> {
		let calldata = IERC20::approveCall { spender, amount }.abi_encode();
		let receipt = self.send_buffered(token, calldata).await?;
		if !receipt.status() {
			return Err(SolverError::Execution(format!(
				"approve of {amount} on token {token} reverted (tx {})",
				receipt.transaction_hash
			)));
		}
		Ok(receipt.transaction_hash)
	}

	async fn relay(&self, relay: &RelayRequest) -> Result<B256> {
		let calldata = IRouter::relayTokensCall {
			solver: self.solver,
			requestId: relay.request_id.as_word(),
			sender: relay.sender,
			recipient: relay.recipient,
			tokenIn: relay.token_in,
			tokenOut: relay.token_out,
			amountOut: relay.amount_out,
			srcChainId: relay.src_chain_id,
			nonce: relay.nonce,
		}
		.abi_encode();

		let receipt = self.send_buffered(self.router, calldata).await?;
		if !receipt.status() {
			return Err(SolverError::Execution(format!(
				"relayTokens for {} reverted (tx {})",
				relay.request_id,
				receipt.transaction_hash
			)));
		}
		Ok(receipt.transaction_hash)
	}

	async fn close(&self) {
		// Dropping the provider tears down the transport; outstanding
		// calls finish or are cancelled with it.
		debug!(chain_id = self.chain_id, "chain client closing");
	}
}
