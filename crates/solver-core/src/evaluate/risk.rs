//! Risk assessment for the scored evaluator.
//!
//! Produces a score in `[0, 1]`, averaged over four axes. Candidates at or
//! above the configured threshold are dropped before profit is considered.

use super::u256_approx_f64;
use alloy::primitives::{Address, U256};
use solver_types::{ChainState, SwapRequest};

/// Destination native balance below this marks execution as tight.
const LOW_NATIVE_BALANCE: u128 = 100_000_000_000_000_000;

/// Inventory-to-requirement ratio below this marks liquidity as thin.
const THIN_LIQUIDITY_RATIO: f64 = 1.1;

/// Averaged risk across liquidity, fee, execution and counterparty axes.
///
/// Total over its inputs: an unknown destination or missing token is the
/// worst liquidity case, never a panic.
pub fn assess(params: &SwapRequest, dest: Option<&ChainState>, min_fee: U256) -> f64 {
	let liquidity = liquidity_axis(params, dest);
	let fee = if params.solver_fee < min_fee { 0.9 } else { 0.1 };
	let execution = execution_axis(dest);
	let counterparty = if params.sender == Address::ZERO || params.recipient == Address::ZERO {
		0.5
	} else {
		0.1
	};

	(liquidity + fee + execution + counterparty) / 4.0
}

fn liquidity_axis(params: &SwapRequest, dest: Option<&ChainState>) -> f64 {
	let Some(dest) = dest else {
		return 1.0;
	};
	let Some(balance) = dest.token_balance(&params.token_out) else {
		return 1.0;
	};
	if balance < params.amount_out {
		return 0.8;
	}
	if params.amount_out == U256::ZERO {
		return 0.1;
	}
	let ratio = u256_approx_f64(balance) / u256_approx_f64(params.amount_out);
	if ratio < THIN_LIQUIDITY_RATIO {
		0.5
	} else {
		0.1
	}
}

fn execution_axis(dest: Option<&ChainState>) -> f64 {
	match dest {
		None => 1.0,
		Some(dest) if dest.native_balance == U256::ZERO => 1.0,
		Some(dest) if dest.native_balance < U256::from(LOW_NATIVE_BALANCE) => 0.6,
		Some(_) => 0.2,
	}
}
