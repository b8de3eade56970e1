//! Swap requests, transfers, trades and per-chain snapshots.

use crate::conditions::Condition;
use crate::ids::RequestId;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The parameter set the on-chain router stores per swap request.
///
/// Field order matches the router's `SwapRequestParameters` struct; the
/// decoding fallbacks for the alternative positional layout live in the
/// chains crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
	pub src_chain_id: U256,
	pub dst_chain_id: U256,
	pub sender: Address,
	pub recipient: Address,
	pub token_in: Address,
	pub token_out: Address,
	/// Amount the recipient must receive on the destination chain.
	pub amount_out: U256,
	pub verification_fee: U256,
	pub solver_fee: U256,
	pub nonce: U256,
	/// Set by the source chain once the solver has been refunded.
	pub executed: bool,
	pub requested_at: U256,
}

impl SwapRequest {
	/// A stored parameter set counts as verified when the destination router
	/// has a non-zero source chain and sender for the request id. Verified
	/// values override trade-carried ones at relay time.
	pub fn is_verified(&self) -> bool {
		self.src_chain_id != U256::ZERO && self.sender != Address::ZERO
	}
}

/// One unfulfilled request observed on a source chain.
#[derive(Debug, Clone)]
pub struct Transfer {
	pub request_id: RequestId,
	pub params: SwapRequest,
	/// Empty means "all conditions met".
	pub conditions: Vec<Condition>,
	pub priority: Option<u32>,
}

impl Transfer {
	pub fn new(request_id: RequestId, params: SwapRequest) -> Self {
		Self {
			request_id,
			params,
			conditions: Vec::new(),
			priority: None,
		}
	}
}

/// A decision record: the evaluator committed inventory to this request and
/// the executor should settle it on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
	pub request_id: RequestId,
	pub nonce: U256,
	pub token_in: Address,
	pub token_out: Address,
	/// Wire-form source chain id, echoed unchanged into the relay call.
	pub src_chain_id: U256,
	/// Destination chain id, already masked to 64 bits for routing.
	pub dest_chain_id: u64,
	pub sender: Address,
	pub recipient: Address,
	pub swap_amount: U256,
}

impl Trade {
	pub fn from_transfer(transfer: &Transfer, dest_chain_id: u64) -> Self {
		let p = &transfer.params;
		Self {
			request_id: transfer.request_id,
			nonce: p.nonce,
			token_in: p.token_in,
			token_out: p.token_out,
			src_chain_id: p.src_chain_id,
			dest_chain_id,
			sender: p.sender,
			recipient: p.recipient,
			swap_amount: p.amount_out,
		}
	}
}

/// Arguments for `Router.relayTokens` on the destination chain.
///
/// Built from a [`Trade`], or from the router's stored parameter set when the
/// request has already been verified there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
	pub request_id: RequestId,
	pub sender: Address,
	pub recipient: Address,
	pub token_in: Address,
	pub token_out: Address,
	pub amount_out: U256,
	pub src_chain_id: U256,
	pub nonce: U256,
}

impl RelayRequest {
	pub fn from_trade(trade: &Trade) -> Self {
		Self {
			request_id: trade.request_id,
			sender: trade.sender,
			recipient: trade.recipient,
			token_in: trade.token_in,
			token_out: trade.token_out,
			amount_out: trade.swap_amount,
			src_chain_id: trade.src_chain_id,
			nonce: trade.nonce,
		}
	}

	pub fn from_stored(request_id: RequestId, params: &SwapRequest) -> Self {
		Self {
			request_id,
			sender: params.sender,
			recipient: params.recipient,
			token_in: params.token_in,
			token_out: params.token_out,
			amount_out: params.amount_out,
			src_chain_id: params.src_chain_id,
			nonce: params.nonce,
		}
	}
}

/// Snapshot of one chain, refreshed on every block tick.
#[derive(Debug, Clone, Default)]
pub struct ChainState {
	pub native_balance: U256,
	/// Balance per configured token; a token absent from the map could not
	/// be read this tick.
	pub token_balances: HashMap<Address, U256>,
	pub transfers: Vec<Transfer>,
	pub already_fulfilled: HashSet<RequestId>,
}

impl ChainState {
	pub fn is_fulfilled(&self, id: &RequestId) -> bool {
		self.already_fulfilled.contains(id)
	}

	pub fn token_balance(&self, token: &Address) -> Option<U256> {
		self.token_balances.get(token).copied()
	}

	/// Debits `amount` from the token balance if it is fully covered.
	///
	/// This is the intra-tick inventory commit: it runs against the
	/// evaluator's cloned snapshot only, never against the canonical store.
	pub fn debit_token(&mut self, token: &Address, amount: U256) -> bool {
		match self.token_balances.get_mut(token) {
			Some(balance) if *balance >= amount => {
				*balance -= amount;
				true
			}
			_ => false,
		}
	}
}
