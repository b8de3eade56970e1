//! Scored evaluation: conditions, risk, profit, ranking.

use super::conditions::{ConditionChecker, PriceOracle};
use super::profit::ProfitModel;
use super::{fulfilled_on_destination, risk, screen, Evaluate};
use crate::inflight::InFlightCache;
use alloy::primitives::U256;
use async_trait::async_trait;
use solver_config::EvaluatorConfig;
use solver_types::{ChainState, Trade, Transfer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How strongly risk counts against profit in the overall score.
const RISK_WEIGHT: f64 = 10.0;

struct Candidate {
	transfer: Transfer,
	dest_chain: u64,
	score: f64,
}

/// The v2 evaluator.
///
/// Candidates pass the same prologue as the simple variant (with a higher,
/// configurable fee floor), then their conditions are evaluated, risk is
/// assessed and profit estimated. Survivors are ranked by
/// `profit - 10 * risk` and committed against the cloned inventory in rank
/// order, so the best candidates get the balance first.
pub struct ScoredEvaluator {
	min_fee: U256,
	risk_threshold: f64,
	conditions: ConditionChecker,
	profit: ProfitModel,
}

impl ScoredEvaluator {
	pub fn new(config: &EvaluatorConfig, oracle: Option<Arc<dyn PriceOracle>>) -> Self {
		Self {
			min_fee: U256::from(config.min_solver_fee_wei),
			risk_threshold: config.risk_threshold,
			conditions: ConditionChecker::new(
				oracle,
				Duration::from_secs(config.price_cache_ttl_secs),
			),
			profit: ProfitModel::new(config),
		}
	}
}

#[async_trait]
impl Evaluate for ScoredEvaluator {
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

		let mut candidates = Vec::new();
		for transfer in transfers {
			if fulfilled_on_destination(&transfer, states) {
				info!(
					request_id = %transfer.request_id.short(),
					"skipping candidate: already fulfilled on destination"
				);
				continue;
			}

			let dest_chain = match screen(&transfer, states, in_flight, self.min_fee) {
				Ok(dest_chain) => dest_chain,
				Err(reason) => {
					info!(request_id = %transfer.request_id.short(), reason, "skipping candidate");
					continue;
				}
			};

			if !self.conditions.all_met(&transfer, states).await {
				// The failed condition already logged itself.
				continue;
			}

			let risk = risk::assess(&transfer.params, states.get(&dest_chain), self.min_fee);
			if risk >= self.risk_threshold {
				info!(
					request_id = %transfer.request_id.short(),
					risk,
					threshold = self.risk_threshold,
					"skipping candidate: risk too high"
				);
				continue;
			}

			let profit = self.profit.score(
				transfer.params.solver_fee,
				transfer.params.amount_out,
				dest_chain,
			);
			let score = profit - RISK_WEIGHT * risk;
			debug!(
				request_id = %transfer.request_id.short(),
				risk,
				profit,
				score,
				"candidate scored"
			);

			candidates.push(Candidate { transfer, dest_chain, score });
		}

		// Rank by score, then explicit priority; the sort is stable, so
		// ties beyond that keep source-chain order.
		candidates.sort_by(|a, b| {
			b.score
				.total_cmp(&a.score)
				.then_with(|| {
					b.transfer
						.priority
						.unwrap_or(0)
						.cmp(&a.transfer.priority.unwrap_or(0))
				})
		});

		let mut trades = Vec::new();
		for candidate in candidates {
			let Some(dest) = states.get_mut(&candidate.dest_chain) else {
				continue;
			};
			if !dest.debit_token(
				&candidate.transfer.params.token_out,
				candidate.transfer.params.amount_out,
			) {
				info!(
					request_id = %candidate.transfer.request_id.short(),
					"skipping candidate: inventory committed to a higher-ranked trade"
				);
				continue;
			}

			info!(
				request_id = %candidate.transfer.request_id.short(),
				dest_chain = candidate.dest_chain,
				score = candidate.score,
				"emitting trade"
			);
			trades.push(Trade::from_transfer(&candidate.transfer, candidate.dest_chain));
		}

		trades
	}
}
