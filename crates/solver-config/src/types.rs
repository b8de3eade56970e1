//! Configuration types for the solver.

use crate::serde_helpers::{deserialize_chain_id_map, deserialize_u128};
use alloy::primitives::Address;
use serde::Deserialize;
use std::collections::HashMap;

/// Complete solver configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	/// Process-level settings.
	pub agent: AgentConfig,
	/// One entry per chain the solver watches and settles on.
	#[serde(default)]
	pub networks: Vec<NetworkConfig>,
	/// Evaluator selection and tunables.
	#[serde(default)]
	pub evaluator: EvaluatorConfig,
}

/// Process-level settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
	#[serde(default = "default_healthcheck_listen_addr")]
	pub healthcheck_listen_addr: String,
	#[serde(default = "default_healthcheck_port")]
	pub healthcheck_port: u16,
	#[serde(default = "default_log_level")]
	pub log_level: String,
	#[serde(default)]
	pub log_json: bool,
}

impl Default for AgentConfig {
	fn default() -> Self {
		Self {
			healthcheck_listen_addr: default_healthcheck_listen_addr(),
			healthcheck_port: default_healthcheck_port(),
			log_level: default_log_level(),
			log_json: false,
		}
	}
}

/// Per-chain connection and transaction settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
	pub chain_id: u64,
	/// `ws://`/`wss://` endpoints get a native block subscription; plain
	/// HTTP endpoints run on the polling fallback alone.
	pub rpc_url: String,
	/// Token contracts the solver holds inventory in on this chain.
	pub tokens: Vec<Address>,
	pub router_address: Address,
	/// Gas-limit buffer applied to estimates, in percent.
	#[serde(default = "default_tx_gas_buffer")]
	pub tx_gas_buffer: u64,
	/// Gas-price buffer applied to node quotes, in percent.
	#[serde(default = "default_tx_gas_price_buffer")]
	pub tx_gas_price_buffer: u64,
}

/// Which evaluator variant runs the candidate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluatorVariant {
	/// Direct balance and fee checks, source-chain order.
	Simple,
	/// Condition evaluation, risk assessment and profit ranking.
	Scored,
}

/// Evaluator selection plus the tunables the scoring model exposes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluatorConfig {
	#[serde(default = "default_variant")]
	pub variant: EvaluatorVariant,
	/// Minimum solver fee, in wei, for the scored evaluator.
	#[serde(default = "default_min_solver_fee_wei", deserialize_with = "deserialize_u128")]
	pub min_solver_fee_wei: u128,
	/// Candidates at or above this averaged risk score are dropped.
	#[serde(default = "default_risk_threshold")]
	pub risk_threshold: f64,
	/// Gas units assumed for one relay when estimating cost.
	#[serde(default = "default_relay_gas_units")]
	pub relay_gas_units: u64,
	/// Opportunity cost is `amount_out * rate_num * hold_units / rate_den`.
	/// The constants are not derived from a documented model; they are
	/// exposed here so deployments can tune them.
	#[serde(default = "default_opportunity_rate_num")]
	pub opportunity_rate_num: u64,
	#[serde(default = "default_opportunity_hold_units")]
	pub opportunity_hold_units: u64,
	#[serde(default = "default_opportunity_rate_den")]
	pub opportunity_rate_den: u64,
	/// Per-chain gas price in wei, replacing the built-in defaults.
	#[serde(default, deserialize_with = "deserialize_chain_id_map")]
	pub gas_price_overrides: HashMap<u64, u128>,
	#[serde(default = "default_in_flight_ttl_secs")]
	pub in_flight_ttl_secs: u64,
	#[serde(default = "default_in_flight_capacity")]
	pub in_flight_capacity: u64,
	#[serde(default = "default_price_cache_ttl_secs")]
	pub price_cache_ttl_secs: u64,
	#[serde(default = "default_gas_price_cache_ttl_secs")]
	pub gas_price_cache_ttl_secs: u64,
}

impl Default for EvaluatorConfig {
	fn default() -> Self {
		Self {
			variant: default_variant(),
			min_solver_fee_wei: default_min_solver_fee_wei(),
			risk_threshold: default_risk_threshold(),
			relay_gas_units: default_relay_gas_units(),
			opportunity_rate_num: default_opportunity_rate_num(),
			opportunity_hold_units: default_opportunity_hold_units(),
			opportunity_rate_den: default_opportunity_rate_den(),
			gas_price_overrides: HashMap::new(),
			in_flight_ttl_secs: default_in_flight_ttl_secs(),
			in_flight_capacity: default_in_flight_capacity(),
			price_cache_ttl_secs: default_price_cache_ttl_secs(),
			gas_price_cache_ttl_secs: default_gas_price_cache_ttl_secs(),
		}
	}
}

fn default_healthcheck_listen_addr() -> String {
	"127.0.0.1".to_string()
}

fn default_healthcheck_port() -> u16 {
	8081
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_tx_gas_buffer() -> u64 {
	120
}

fn default_tx_gas_price_buffer() -> u64 {
	100
}

fn default_variant() -> EvaluatorVariant {
	EvaluatorVariant::Simple
}

fn default_min_solver_fee_wei() -> u128 {
	1_000_000_000_000_000
}

fn default_risk_threshold() -> f64 {
	0.3
}

fn default_relay_gas_units() -> u64 {
	150_000
}

fn default_opportunity_rate_num() -> u64 {
	1000
}

fn default_opportunity_hold_units() -> u64 {
	60
}

fn default_opportunity_rate_den() -> u64 {
	3_600_000
}

fn default_in_flight_ttl_secs() -> u64 {
	30
}

fn default_in_flight_capacity() -> u64 {
	1000
}

fn default_price_cache_ttl_secs() -> u64 {
	60
}

fn default_gas_price_cache_ttl_secs() -> u64 {
	30
}
