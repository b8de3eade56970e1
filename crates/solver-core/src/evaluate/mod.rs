//! Candidate evaluation.
//!
//! Both evaluator variants consume a per-tick clone of the state store and
//! emit the trades the executor should settle. The clone is where inventory
//! commits happen: a trade debits the destination token balance so later
//! candidates in the same tick cannot spend the same inventory.

mod conditions;
pub mod profit;
pub mod risk;
mod scored;
mod simple;

pub use conditions::{ConditionChecker, PriceOracle};
pub use scored::ScoredEvaluator;
pub use simple::SimpleEvaluator;

use crate::inflight::InFlightCache;
use alloy::primitives::U256;
use async_trait::async_trait;
use solver_config::{EvaluatorConfig, EvaluatorVariant};
use solver_types::{normalize_chain_id, ChainState, Trade, Transfer};
use std::collections::HashMap;
use std::sync::Arc;

/// One evaluator pass over a chain's freshly-fetched transfers.
#[async_trait]
pub trait Evaluate: Send + Sync {
	/// Produces the executable trades for `chain_id`, debiting committed
	/// inventory from `states` (the caller's per-tick clone) as it goes.
	async fn evaluate(
		&self,
		chain_id: u64,
		states: &mut HashMap<u64, ChainState>,
		in_flight: &InFlightCache,
	) -> Vec<Trade>;
}

/// Builds the configured evaluator variant. Selection is explicit: the
/// variant comes from configuration and is logged at startup, never chosen
/// silently.
pub fn build_evaluator(
	config: &EvaluatorConfig,
	oracle: Option<Arc<dyn PriceOracle>>,
) -> Box<dyn Evaluate> {
	match config.variant {
		EvaluatorVariant::Simple => Box::new(SimpleEvaluator::new()),
		EvaluatorVariant::Scored => Box::new(ScoredEvaluator::new(config, oracle)),
	}
}

/// Shared filter prologue; returns the destination chain id of a viable
/// candidate or the reason to skip it.
///
/// The check order is fixed: in-flight, executed, destination known,
/// native balance, token known, token sufficient, fee minimum.
pub(crate) fn screen(
	transfer: &Transfer,
	states: &HashMap<u64, ChainState>,
	in_flight: &InFlightCache,
	min_fee: U256,
) -> Result<u64, &'static str> {
	if in_flight.has(&transfer.request_id) {
		return Err("already in flight");
	}
	if transfer.params.executed {
		return Err("already executed on source chain");
	}

	let dest_chain = normalize_chain_id(transfer.params.dst_chain_id);
	let Some(dest) = states.get(&dest_chain) else {
		return Err("destination chain state unknown");
	};
	if dest.native_balance == U256::ZERO {
		return Err("no native balance on destination chain");
	}
	let Some(balance) = dest.token_balance(&transfer.params.token_out) else {
		return Err("destination token balance unknown");
	};
	if balance < transfer.params.amount_out {
		return Err("insufficient destination inventory");
	}
	if transfer.params.solver_fee < min_fee {
		return Err("solver fee below minimum");
	}

	Ok(dest_chain)
}

/// Whether the destination chain already settled this transfer.
///
/// An unknown destination keeps the transfer; the prologue drops it later
/// for the right reason.
pub(crate) fn fulfilled_on_destination(
	transfer: &Transfer,
	states: &HashMap<u64, ChainState>,
) -> bool {
	let dest_chain = normalize_chain_id(transfer.params.dst_chain_id);
	states
		.get(&dest_chain)
		.is_some_and(|state| state.is_fulfilled(&transfer.request_id))
}

/// Lossy widening for score arithmetic. Scores never feed back into
/// monetary amounts, so the precision loss is acceptable.
pub(crate) fn u256_approx_f64(value: U256) -> f64 {
	value
		.as_limbs()
		.iter()
		.enumerate()
		.fold(0.0, |acc, (i, limb)| {
			acc + (*limb as f64) * 2f64.powi(64 * i as i32)
		})
}
