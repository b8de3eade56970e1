//! Decoding of stored swap-request parameters.
//!
//! Two encodings of the router's parameter tuple exist in the wild: the named
//! struct (`srcChainId` first) and an older positional layout with `sender`
//! at index zero. The named decode is canonical; the positional fallback is
//! only trusted when it yields plausible chain ids, and its use is logged
//! loudly. Either way, a decode whose chain ids exceed 64 bits is rejected
//! rather than guessed at.

use crate::contracts::{IRouter, SwapRequestParameters};
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use solver_types::{RequestId, Result, SolverError, SwapRequest};
use tracing::{debug, warn};

const WORD: usize = 32;
const PARAM_WORDS: usize = 12;

/// Decodes router return data into a [`SwapRequest`].
pub fn decode_swap_parameters(data: &[u8], request_id: &RequestId) -> Result<SwapRequest> {
	match IRouter::getSwapRequestParametersCall::abi_decode_returns(data) {
		Ok(raw) => {
			let params = from_named(raw);
			if chain_ids_plausible(&params) {
				return Ok(params);
			}
			debug!(
				request_id = %request_id.short(),
				"named decode yielded implausible chain ids; trying positional layout"
			);
		}
		Err(e) => {
			debug!(
				request_id = %request_id.short(),
				error = %e,
				"named parameter decode failed; trying positional layout"
			);
		}
	}

	let params = decode_positional(data)?;
	if !chain_ids_plausible(&params) {
		return Err(SolverError::Decode(format!(
			"no plausible parameter layout for request {request_id}: chain ids exceed 64 bits in both decodings"
		)));
	}

	warn!(
		request_id = %request_id.short(),
		"decoded stored parameters via positional fallback layout"
	);
	Ok(params)
}

fn from_named(raw: SwapRequestParameters) -> SwapRequest {
	SwapRequest {
		src_chain_id: raw.srcChainId,
		dst_chain_id: raw.dstChainId,
		sender: raw.sender,
		recipient: raw.recipient,
		token_in: raw.tokenIn,
		token_out: raw.tokenOut,
		amount_out: raw.amountOut,
		verification_fee: raw.verificationFee,
		solver_fee: raw.solverFee,
		nonce: raw.nonce,
		executed: raw.executed,
		requested_at: raw.requestedAt,
	}
}

/// Positional layout: sender leads, chain ids follow the out-amount.
fn decode_positional(data: &[u8]) -> Result<SwapRequest> {
	if data.len() < PARAM_WORDS * WORD {
		return Err(SolverError::Decode(format!(
			"parameter tuple too short: {} bytes, expected {}",
			data.len(),
			PARAM_WORDS * WORD
		)));
	}

	Ok(SwapRequest {
		sender: word_to_address(data, 0),
		recipient: word_to_address(data, 1),
		token_in: word_to_address(data, 2),
		token_out: word_to_address(data, 3),
		amount_out: word_to_u256(data, 4),
		src_chain_id: word_to_u256(data, 5),
		dst_chain_id: word_to_u256(data, 6),
		verification_fee: word_to_u256(data, 7),
		solver_fee: word_to_u256(data, 8),
		nonce: word_to_u256(data, 9),
		executed: word_to_u256(data, 10) != U256::ZERO,
		requested_at: word_to_u256(data, 11),
	})
}

fn chain_ids_plausible(params: &SwapRequest) -> bool {
	let max = U256::from(u64::MAX);
	params.src_chain_id <= max && params.dst_chain_id <= max
}

fn word_to_u256(data: &[u8], index: usize) -> U256 {
	U256::from_be_slice(&data[index * WORD..(index + 1) * WORD])
}

/// Addresses occasionally come back as full-width integers; the address is
/// the low 20 bytes of the word.
fn word_to_address(data: &[u8], index: usize) -> Address {
	Address::from_slice(&data[index * WORD + 12..(index + 1) * WORD])
}
