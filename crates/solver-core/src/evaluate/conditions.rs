//! Condition evaluation for the scored evaluator.

use alloy::primitives::Address;
use async_trait::async_trait;
use moka::sync::Cache;
use solver_types::{ChainState, Condition, Result, SolverError, TimeOp, Transfer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// External price source for `Condition::Price`.
///
/// Lookups fail closed: any error fails the condition, never the tick.
#[async_trait]
pub trait PriceOracle: Send + Sync {
	async fn price(&self, token: Address, chain_id: u64, source: &str) -> Result<f64>;
}

/// Evaluates a transfer's condition list, short-circuiting on the first
/// failure. Oracle results are cached per `(chain, token, source)`.
pub struct ConditionChecker {
	oracle: Option<Arc<dyn PriceOracle>>,
	price_cache: Cache<(u64, Address, String), f64>,
}

impl ConditionChecker {
	pub fn new(oracle: Option<Arc<dyn PriceOracle>>, price_ttl: Duration) -> Self {
		Self {
			oracle,
			price_cache: Cache::builder().time_to_live(price_ttl).build(),
		}
	}

	/// True when every condition holds. An empty list holds trivially.
	pub async fn all_met(
		&self,
		transfer: &Transfer,
		states: &HashMap<u64, ChainState>,
	) -> bool {
		for condition in &transfer.conditions {
			if !self.met(condition, transfer, states).await {
				info!(
					request_id = %transfer.request_id.short(),
					kind = condition.kind(),
					"condition not met"
				);
				return false;
			}
		}
		true
	}

	async fn met(
		&self,
		condition: &Condition,
		transfer: &Transfer,
		states: &HashMap<u64, ChainState>,
	) -> bool {
		match condition {
			Condition::Time { op, timestamp, end_timestamp } => {
				let now = unix_now();
				match op {
					TimeOp::After => now >= *timestamp,
					TimeOp::Before => now < *timestamp,
					TimeOp::Between => match end_timestamp {
						Some(end) => now >= *timestamp && now <= *end,
						None => false,
					},
				}
			}
			Condition::Price { token, chain_id, op, target, upper, source } => {
				match self.cached_price(*chain_id, *token, source).await {
					Ok(price) => op.holds(price, *target, *upper),
					Err(e) => {
						debug!(
							request_id = %transfer.request_id.short(),
							error = %e,
							"price lookup failed; condition fails closed"
						);
						false
					}
				}
			}
			Condition::Balance { chain_id, token, op, threshold, upper } => {
				let Some(state) = states.get(chain_id) else {
					return false;
				};
				let value = match token {
					Some(token) => match state.token_balance(token) {
						Some(balance) => balance,
						None => return false,
					},
					None => state.native_balance,
				};
				op.holds(value, *threshold, *upper)
			}
			Condition::Custom { eval } => eval(transfer, states),
		}
	}

	async fn cached_price(&self, chain_id: u64, token: Address, source: &str) -> Result<f64> {
		let key = (chain_id, token, source.to_string());
		if let Some(price) = self.price_cache.get(&key) {
			return Ok(price);
		}

		let oracle = self
			.oracle
			.as_ref()
			.ok_or_else(|| SolverError::Oracle("no price oracle configured".to_string()))?;
		let price = oracle.price(token, chain_id, source).await?;
		self.price_cache.insert(key, price);
		Ok(price)
	}
}

fn unix_now() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|elapsed| elapsed.as_secs())
		.unwrap_or(0)
}

#[cfg(test)]
mod tests {
	use super::super::testutil::*;
	use super::*;
	use alloy::primitives::U256;
	use solver_types::Comparison;
	use std::sync::atomic::{AtomicUsize, Ordering};

	struct FixedOracle {
		price: f64,
		calls: AtomicUsize,
	}

	#[async_trait]
	impl PriceOracle for FixedOracle {
		async fn price(&self, _token: Address, _chain_id: u64, _source: &str) -> Result<f64> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(self.price)
		}
	}

	struct FailingOracle;

	#[async_trait]
	impl PriceOracle for FailingOracle {
		async fn price(&self, _token: Address, _chain_id: u64, _source: &str) -> Result<f64> {
			Err(SolverError::Oracle("feed offline".to_string()))
		}
	}

	fn checker(oracle: Option<Arc<dyn PriceOracle>>) -> ConditionChecker {
		ConditionChecker::new(oracle, Duration::from_secs(60))
	}

	fn price_condition(target: f64, op: Comparison) -> Condition {
		Condition::Price {
			token: token(),
			chain_id: DST_CHAIN,
			op,
			target,
			upper: None,
			source: "coingecko".to_string(),
		}
	}

	#[tokio::test]
	async fn empty_condition_list_is_all_met() {
		let transfer = transfer(1, 100, 10);
		let states = two_chain_states(vec![], 1_000, 1_000);
		assert!(checker(None).all_met(&transfer, &states).await);
	}

	#[tokio::test]
	async fn time_window_conditions() {
		let mut transfer = transfer(1, 100, 10);
		let states = two_chain_states(vec![], 1_000, 1_000);
		let now = unix_now();

		transfer.conditions = vec![Condition::Time {
			op: TimeOp::After,
			timestamp: now.saturating_sub(100),
			end_timestamp: None,
		}];
		assert!(checker(None).all_met(&transfer, &states).await);

		transfer.conditions = vec![Condition::Time {
			op: TimeOp::Before,
			timestamp: now.saturating_sub(100),
			end_timestamp: None,
		}];
		assert!(!checker(None).all_met(&transfer, &states).await);

		transfer.conditions = vec![Condition::Time {
			op: TimeOp::Between,
			timestamp: now.saturating_sub(100),
			end_timestamp: Some(now + 100),
		}];
		assert!(checker(None).all_met(&transfer, &states).await);

		// A between-window without an end can never hold.
		transfer.conditions = vec![Condition::Time {
			op: TimeOp::Between,
			timestamp: now.saturating_sub(100),
			end_timestamp: None,
		}];
		assert!(!checker(None).all_met(&transfer, &states).await);
	}

	#[tokio::test]
	async fn balance_condition_reads_the_cloned_states() {
		let mut transfer = transfer(1, 100, 10);
		let states = two_chain_states(vec![], 1_000, 5_000);

		transfer.conditions = vec![Condition::Balance {
			chain_id: DST_CHAIN,
			token: Some(token()),
			op: Comparison::Gte,
			threshold: U256::from(5_000u64),
			upper: None,
		}];
		assert!(checker(None).all_met(&transfer, &states).await);

		transfer.conditions = vec![Condition::Balance {
			chain_id: DST_CHAIN,
			token: None,
			op: Comparison::Gt,
			threshold: U256::from(1_000u64),
			upper: None,
		}];
		assert!(!checker(None).all_met(&transfer, &states).await);

		// Unknown chain fails the condition.
		transfer.conditions = vec![Condition::Balance {
			chain_id: 99,
			token: None,
			op: Comparison::Gte,
			threshold: U256::ZERO,
			upper: None,
		}];
		assert!(!checker(None).all_met(&transfer, &states).await);
	}

	#[tokio::test]
	async fn price_condition_consults_and_caches_the_oracle() {
		let oracle = Arc::new(FixedOracle {
			price: 1900.0,
			calls: AtomicUsize::new(0),
		});
		let checker = checker(Some(oracle.clone()));
		let mut transfer = transfer(1, 100, 10);
		let states = two_chain_states(vec![], 1_000, 1_000);

		transfer.conditions = vec![price_condition(1800.0, Comparison::Gt)];
		assert!(checker.all_met(&transfer, &states).await);
		assert!(checker.all_met(&transfer, &states).await);

		// Second evaluation is served from the 60 s cache.
		assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn oracle_failure_fails_the_condition_not_the_tick() {
		let checker = checker(Some(Arc::new(FailingOracle)));
		let mut transfer = transfer(1, 100, 10);
		let states = two_chain_states(vec![], 1_000, 1_000);

		transfer.conditions = vec![price_condition(1800.0, Comparison::Gt)];
		assert!(!checker.all_met(&transfer, &states).await);
	}

	#[tokio::test]
	async fn missing_oracle_fails_price_conditions_closed() {
		let checker = checker(None);
		let mut transfer = transfer(1, 100, 10);
		let states = two_chain_states(vec![], 1_000, 1_000);

		transfer.conditions = vec![price_condition(1800.0, Comparison::Lt)];
		assert!(!checker.all_met(&transfer, &states).await);
	}

	#[tokio::test]
	async fn custom_conditions_see_transfer_and_states() {
		let mut transfer = transfer(1, 100, 10);
		let states = two_chain_states(vec![], 1_000, 1_000);

		transfer.conditions = vec![Condition::Custom {
			eval: Arc::new(|transfer, states| {
				states.contains_key(&DST_CHAIN)
					&& transfer.params.solver_fee == U256::from(10u64)
			}),
		}];
		assert!(checker(None).all_met(&transfer, &states).await);

		transfer.conditions = vec![Condition::Custom {
			eval: Arc::new(|_, _| false),
		}];
		assert!(!checker(None).all_met(&transfer, &states).await);
	}

	#[tokio::test]
	async fn first_failing_condition_short_circuits() {
		let checker = checker(None);
		let mut transfer = transfer(1, 100, 10);
		let states = two_chain_states(vec![], 1_000, 1_000);

		let reached = Arc::new(AtomicUsize::new(0));
		let tail = reached.clone();
		transfer.conditions = vec![
			Condition::Custom { eval: Arc::new(|_, _| false) },
			Condition::Custom {
				eval: Arc::new(move |_, _| {
					tail.fetch_add(1, Ordering::SeqCst);
					true
				}),
			},
		];
		assert!(!checker.all_met(&transfer, &states).await);
		assert_eq!(reached.load(Ordering::SeqCst), 0);
	}
}
