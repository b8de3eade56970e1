//! Configuration discovery, parsing and validation.

use crate::types::Config;
use solver_types::{Result, SolverError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming the config file, checked after the CLI flag.
pub const CONFIG_PATH_ENV: &str = "SOLVER_CONFIG_PATH";

/// Resolves the configuration path.
///
/// Probe order: the `--config` flag, the `SOLVER_CONFIG_PATH` environment
/// variable, `./config.toml`, then the per-user
/// `~/.config/onlyswaps/solver/config.toml`.
pub fn discover_path(flag: Option<&Path>) -> Result<PathBuf> {
	if let Some(path) = flag {
		return Ok(path.to_path_buf());
	}

	if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
		return Ok(PathBuf::from(path));
	}

	let local = PathBuf::from("config.toml");
	if local.exists() {
		return Ok(local);
	}

	if let Some(config_dir) = dirs::config_dir() {
		let user = config_dir.join("onlyswaps").join("solver").join("config.toml");
		if user.exists() {
			return Ok(user);
		}
	}

	Err(SolverError::Config(
		"no config file found; pass --config, set SOLVER_CONFIG_PATH, or create ./config.toml"
			.to_string(),
	))
}

/// Loads and validates a configuration file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
	let path = path.as_ref();
	info!(path = %path.display(), "loading configuration");

	let contents = std::fs::read_to_string(path)
		.map_err(|e| SolverError::Config(format!("failed to read {}: {e}", path.display())))?;
	load_from_str(&contents)
}

/// Parses and validates configuration from a TOML string.
pub fn load_from_str(contents: &str) -> Result<Config> {
	let config: Config = toml::from_str(contents)
		.map_err(|e| SolverError::Config(format!("failed to parse TOML: {e}")))?;
	validate(&config)?;
	Ok(config)
}

fn validate(config: &Config) -> Result<()> {
	if config.networks.is_empty() {
		return Err(SolverError::Config("no networks configured".to_string()));
	}

	let mut seen = HashSet::new();
	for network in &config.networks {
		if !seen.insert(network.chain_id) {
			return Err(SolverError::Config(format!(
				"duplicate network entry for chain {}",
				network.chain_id
			)));
		}
		if network.tokens.is_empty() {
			return Err(SolverError::Config(format!(
				"chain {} has no tokens configured",
				network.chain_id
			)));
		}
		let url = &network.rpc_url;
		let supported = ["ws://", "wss://", "http://", "https://"]
			.iter()
			.any(|scheme| url.starts_with(scheme));
		if !supported {
			return Err(SolverError::Config(format!(
				"chain {}: rpc_url must be a ws or http endpoint, got {url}",
				network.chain_id
			)));
		}
		if network.tx_gas_buffer < 100 {
			return Err(SolverError::Config(format!(
				"chain {}: tx_gas_buffer is a percentage and cannot be below 100",
				network.chain_id
			)));
		}
	}

	if config.evaluator.opportunity_rate_den == 0 {
		return Err(SolverError::Config(
			"evaluator.opportunity_rate_den cannot be zero".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::EvaluatorVariant;

	const MINIMAL: &str = r#"
		[agent]
		healthcheck_listen_addr = "127.0.0.1"
		healthcheck_port = 8081
		log_level = "debug"
		log_json = true

		[[networks]]
		chain_id = 31337
		rpc_url = "ws://localhost:8545"
		tokens = ["0xd8da6bf26964af9d7eed9e03e53415d37aa96045"]
		router_address = "0x5fbdb2315678afecb367f032d93f642f64180aa3"

		[[networks]]
		chain_id = 31338
		rpc_url = "http://localhost:8546"
		tokens = ["0xd8da6bf26964af9d7eed9e03e53415d37aa96045"]
		router_address = "0x5fbdb2315678afecb367f032d93f642f64180aa3"
	"#;

	#[test]
	fn parses_a_two_network_config() {
		let config = load_from_str(MINIMAL).unwrap();

		assert_eq!(config.agent.log_level, "debug");
		assert!(config.agent.log_json);
		assert_eq!(config.networks.len(), 2);
		assert_eq!(config.networks[0].chain_id, 31337);
		assert_eq!(config.networks[0].tx_gas_buffer, 120);
		assert_eq!(config.networks[0].tx_gas_price_buffer, 100);
		assert_eq!(config.evaluator.variant, EvaluatorVariant::Simple);
	}

	#[test]
	fn evaluator_table_overrides_defaults() {
		let with_evaluator = format!(
			"{MINIMAL}\n[evaluator]\nvariant = \"scored\"\nmin_solver_fee_wei = 5\n\n[evaluator.gas_price_overrides]\n\"31338\" = 1000000000\n"
		);
		let config = load_from_str(&with_evaluator).unwrap();

		assert_eq!(config.evaluator.variant, EvaluatorVariant::Scored);
		assert_eq!(config.evaluator.min_solver_fee_wei, 5);
		assert_eq!(config.evaluator.gas_price_overrides[&31338], 1_000_000_000);
	}

	#[test]
	fn no_networks_is_fatal() {
		let result = load_from_str("[agent]\nlog_level = \"info\"\n");
		assert!(matches!(result, Err(SolverError::Config(_))));
	}

	#[test]
	fn duplicate_chain_ids_are_rejected() {
		let duplicated = MINIMAL.replace("31338", "31337");
		let result = load_from_str(&duplicated);
		assert!(matches!(result, Err(SolverError::Config(_))));
	}

	#[test]
	fn unusable_rpc_scheme_is_rejected() {
		let bad = MINIMAL.replace("ws://localhost:8545", "ipc:///tmp/geth.ipc");
		let result = load_from_str(&bad);
		assert!(matches!(result, Err(SolverError::Config(_))));
	}

	#[test]
	fn flag_takes_precedence_in_discovery() {
		let path = discover_path(Some(Path::new("/tmp/custom.toml"))).unwrap();
		assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
	}
}
