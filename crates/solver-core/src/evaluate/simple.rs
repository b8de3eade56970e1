//! Direct balance-and-fee evaluation, in source-chain order.

use super::{fulfilled_on_destination, screen, Evaluate};
use crate::inflight::InFlightCache;
use alloy::primitives::U256;
use async_trait::async_trait;
use solver_types::{ChainState, Trade};
use std::collections::HashMap;
use tracing::{debug, info};

/// The v1 evaluator: no scoring, no conditions. A transfer either clears
/// every direct check or it is skipped, and candidates compete for inventory
/// in the order the source chain returned them.
#[derive(Default)]
pub struct SimpleEvaluator;

impl SimpleEvaluator {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Evaluate for SimpleEvaluator {
	async fn evaluate(
		&self,
		chain_id: u64,
		states: &mut HashMap<u64, ChainState>,
		in_flight: &InFlightCache,
	) -> Vec<Trade> {
		let transfers = match states.get(&chain_id) {
			Some(state) => state.transfers.clone(),
			None => {
				debug!(chain_id, "no state for source chain");
				return Vec::new();
			}
		};

		let mut trades = Vec::new();
		for transfer in &transfers {
			if fulfilled_on_destination(transfer, states) {
				info!(
					request_id = %transfer.request_id.short(),
					"skipping candidate: already fulfilled on destination"
				);
				continue;
			}

			let dest_chain = match screen(transfer, states, in_flight, U256::from(1u64)) {
				Ok(dest_chain) => dest_chain,
				Err(reason) => {
					info!(request_id = %transfer.request_id.short(), reason, "skipping candidate");
					continue;
				}
			};

			let Some(dest) = states.get_mut(&dest_chain) else {
				continue;
			};
			if !dest.debit_token(&transfer.params.token_out, transfer.params.amount_out) {
				info!(
					request_id = %transfer.request_id.short(),
					"skipping candidate: inventory already committed this tick"
				);
				continue;
			}

			info!(
				request_id = %transfer.request_id.short(),
				dest_chain,
				amount = %transfer.params.amount_out,
				"emitting trade"
			);
			trades.push(Trade::from_transfer(transfer, dest_chain));
		}

		trades
	}
}

#[cfg(test)]
mod tests {
	use super::super::testutil::*;
	use super::*;
	use solver_types::RequestId;

	async fn run(
		states: &mut HashMap<u64, ChainState>,
		in_flight: &InFlightCache,
	) -> Vec<Trade> {
		SimpleEvaluator::new().evaluate(SRC_CHAIN, states, in_flight).await
	}

	#[tokio::test]
	async fn happy_path_emits_one_trade() {
		let transfer = transfer(1, 1_000_000_000_000_000_000, 10_000_000_000_000_000);
		let mut states = two_chain_states(
			vec![transfer.clone()],
			1_000_000_000_000_000_000,
			5_000_000_000_000_000_000,
		);

		let trades = run(&mut states, &InFlightCache::with_defaults()).await;

		assert_eq!(trades.len(), 1);
		assert_eq!(trades[0], Trade::from_transfer(&transfer, DST_CHAIN));
		assert_eq!(trades[0].dest_chain_id, DST_CHAIN);
	}

	#[tokio::test]
	async fn fulfilled_on_destination_emits_nothing() {
		let transfer = transfer(1, 100, 10);
		let mut states = two_chain_states(vec![transfer.clone()], 1_000, 1_000);
		states
			.get_mut(&DST_CHAIN)
			.unwrap()
			.already_fulfilled
			.insert(transfer.request_id);

		let trades = run(&mut states, &InFlightCache::with_defaults()).await;
		assert!(trades.is_empty());
	}

	#[tokio::test]
	async fn fulfilled_comparison_ignores_observed_case() {
		let mut transfer = transfer(0, 100, 10);
		transfer.request_id =
			"0xAB00000000000000000000000000000000000000000000000000000000000001"
				.parse()
				.unwrap();
		let mut states = two_chain_states(vec![transfer.clone()], 1_000, 1_000);
		let lower: RequestId =
			"0xab00000000000000000000000000000000000000000000000000000000000001"
				.parse()
				.unwrap();
		states
			.get_mut(&DST_CHAIN)
			.unwrap()
			.already_fulfilled
			.insert(lower);

		let trades = run(&mut states, &InFlightCache::with_defaults()).await;
		assert!(trades.is_empty());
	}

	#[tokio::test]
	async fn in_flight_candidates_are_skipped() {
		let transfer = transfer(1, 100, 10);
		let mut states = two_chain_states(vec![transfer.clone()], 1_000, 1_000);
		let in_flight = InFlightCache::with_defaults();
		in_flight.insert(transfer.request_id);

		let trades = run(&mut states, &in_flight).await;
		assert!(trades.is_empty());
	}

	#[tokio::test]
	async fn zero_fee_gives_no_trade() {
		let transfer = transfer(1, 100, 0);
		let mut states = two_chain_states(vec![transfer], 1_000, 1_000);

		let trades = run(&mut states, &InFlightCache::with_defaults()).await;
		assert!(trades.is_empty());
	}

	#[tokio::test]
	async fn executed_transfer_gives_no_trade() {
		let mut transfer = transfer(1, 100, 10);
		transfer.params.executed = true;
		let mut states = two_chain_states(vec![transfer], 1_000, 1_000);

		let trades = run(&mut states, &InFlightCache::with_defaults()).await;
		assert!(trades.is_empty());
	}

	#[tokio::test]
	async fn two_candidates_compete_for_one_inventory_in_source_order() {
		let first = transfer(1, 4_000, 10);
		let second = transfer(2, 3_000, 10);
		let mut states = two_chain_states(vec![first.clone(), second], 1_000, 5_000);

		let trades = run(&mut states, &InFlightCache::with_defaults()).await;

		// The earlier transfer wins the inventory; 1_000 remains, which
		// does not cover the second.
		assert_eq!(trades.len(), 1);
		assert_eq!(trades[0].request_id, first.request_id);
		assert_eq!(
			states[&DST_CHAIN].token_balance(&token()),
			Some(U256::from(1_000u64))
		);
	}

	#[tokio::test]
	async fn exact_balance_is_spendable_once() {
		let first = transfer(1, 5_000, 10);
		let second = transfer(2, 1, 10);
		let mut states = two_chain_states(vec![first.clone(), second], 1_000, 5_000);

		let trades = run(&mut states, &InFlightCache::with_defaults()).await;

		assert_eq!(trades.len(), 1);
		assert_eq!(trades[0].request_id, first.request_id);
		assert_eq!(
			states[&DST_CHAIN].token_balance(&token()),
			Some(U256::ZERO)
		);
	}

	#[tokio::test]
	async fn sufficient_inventory_settles_both_candidates() {
		let first = transfer(1, 100, 10);
		let second = transfer(2, 100, 10);
		let mut states = two_chain_states(vec![first, second], 1_000, 200);

		let trades = run(&mut states, &InFlightCache::with_defaults()).await;
		assert_eq!(trades.len(), 2);
	}

	#[tokio::test]
	async fn unknown_destination_chain_gives_no_trade() {
		let transfer = transfer(1, 100, 10);
		let mut states = two_chain_states(vec![transfer], 1_000, 1_000);
		states.remove(&DST_CHAIN);

		let trades = run(&mut states, &InFlightCache::with_defaults()).await;
		assert!(trades.is_empty());
	}
}
