//! Profit scoring for the scored evaluator.

use super::u256_approx_f64;
use alloy::primitives::U256;
use moka::sync::Cache;
use solver_config::EvaluatorConfig;
use std::collections::HashMap;
use std::time::Duration;

/// Fallback gas prices in wei, keyed by chain id. These are treated as
/// upper bounds, not live quotes; deployments override them per chain.
fn default_gas_price(chain_id: u64) -> u128 {
	match chain_id {
		// Ethereum mainnet: 20 gwei
		1 => 20_000_000_000,
		// Polygon: 30 gwei
		137 => 30_000_000_000,
		// Arbitrum One: 0.1 gwei
		42161 => 100_000_000,
		// Optimism: 0.001 gwei
		10 => 1_000_000,
		_ => 20_000_000_000,
	}
}

/// Estimates net profit of a relay and scores it against the solver fee.
///
/// Gas cost assumes a fixed unit count per relay. Opportunity cost is
/// `amount_out * rate_num * hold_units / rate_den`; the constants are not
/// derived from a documented model and stay configurable.
pub struct ProfitModel {
	relay_gas_units: u64,
	rate_num: u64,
	hold_units: u64,
	rate_den: u64,
	overrides: HashMap<u64, u128>,
	gas_price_cache: Cache<u64, u128>,
}

impl ProfitModel {
	pub fn new(config: &EvaluatorConfig) -> Self {
		Self {
			relay_gas_units: config.relay_gas_units,
			rate_num: config.opportunity_rate_num,
			hold_units: config.opportunity_hold_units,
			rate_den: config.opportunity_rate_den,
			overrides: config.gas_price_overrides.clone(),
			gas_price_cache: Cache::builder()
				.time_to_live(Duration::from_secs(config.gas_price_cache_ttl_secs))
				.build(),
		}
	}

	/// Gas price in wei for a chain, served from the 30 s cache.
	pub fn gas_price(&self, chain_id: u64) -> u128 {
		if let Some(price) = self.gas_price_cache.get(&chain_id) {
			return price;
		}
		let price = self
			.overrides
			.get(&chain_id)
			.copied()
			.unwrap_or_else(|| default_gas_price(chain_id));
		self.gas_price_cache.insert(chain_id, price);
		price
	}

	/// Net profit divided by the solver fee, floored at zero.
	pub fn score(&self, solver_fee: U256, amount_out: U256, dest_chain_id: u64) -> f64 {
		if solver_fee == U256::ZERO {
			return 0.0;
		}

		let gas_cost =
			U256::from(self.relay_gas_units) * U256::from(self.gas_price(dest_chain_id));
		let opportunity_cost =
			amount_out * U256::from(self.rate_num) * U256::from(self.hold_units)
				/ U256::from(self.rate_den);
		let net = solver_fee.saturating_sub(gas_cost.saturating_add(opportunity_cost));

		u256_approx_f64(net) / u256_approx_f64(solver_fee)
	}
}
