use alloy::signers::local::PrivateKeySigner;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use solver_chains::{ChainClient, EvmChainClient};
use solver_config::{AgentConfig, Config};
use solver_core::{build_evaluator, InFlightCache, Solver};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod health;

#[derive(Parser)]
#[command(name = "onlyswaps-solver")]
#[command(about = "Cross-chain swap solver", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
	/// Path to the configuration file
	#[arg(short, long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Solver wallet private key, with or without the 0x prefix
	#[arg(long, env = "SOLVER_PRIVATE_KEY", hide_env_values = true)]
	private_key: Option<String>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
	/// Run the solver loop
	Start,
	/// Load and validate the configuration, then exit
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let path = solver_config::discover_path(cli.config.as_deref())?;
	let config = solver_config::load(&path).context("failed to load configuration")?;
	setup_tracing(&config.agent)?;
	info!(path = %path.display(), "configuration loaded");

	match cli.command {
		Some(Command::Start) | None => start(cli, config).await,
		Some(Command::Validate) => validate(config),
	}
}

async fn start(cli: Cli, config: Config) -> Result<()> {
	let key = cli
		.private_key
		.ok_or_else(|| anyhow!("--private-key or SOLVER_PRIVATE_KEY is required"))?;
	let signer = parse_private_key(&key)?;
	info!(solver = %signer.address(), "wallet loaded");

	let mut clients: HashMap<u64, Arc<dyn ChainClient>> = HashMap::new();
	for network in &config.networks {
		let client = EvmChainClient::connect(network, signer.clone())
			.await
			.with_context(|| format!("failed to initialize chain {}", network.chain_id))?;
		clients.insert(network.chain_id, Arc::new(client));
	}

	info!(variant = ?config.evaluator.variant, "evaluator selected");
	let evaluator = build_evaluator(&config.evaluator, None);
	let in_flight = InFlightCache::new(
		Duration::from_secs(config.evaluator.in_flight_ttl_secs),
		config.evaluator.in_flight_capacity,
	);

	let health_handle = tokio::spawn(health::serve(
		config.agent.healthcheck_listen_addr.clone(),
		config.agent.healthcheck_port,
	));

	let solver = Solver::new(clients, evaluator, in_flight);
	let outcome = solver.run().await;

	health_handle.abort();
	outcome.context("solver loop failed")?;
	info!("shutdown complete");
	Ok(())
}

fn validate(config: Config) -> Result<()> {
	info!("configuration is valid");
	info!(variant = ?config.evaluator.variant, "evaluator");
	for network in &config.networks {
		info!(
			chain_id = network.chain_id,
			rpc_url = %network.rpc_url,
			router = %network.router_address,
			tokens = network.tokens.len(),
			"network"
		);
	}
	Ok(())
}

fn setup_tracing(agent: &AgentConfig) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&agent.log_level));

	if agent.log_json {
		tracing_subscriber::registry()
			.with(env_filter)
			.with(tracing_subscriber::fmt::layer().json())
			.init();
	} else {
		tracing_subscriber::registry()
			.with(env_filter)
			.with(tracing_subscriber::fmt::layer())
			.init();
	}

	Ok(())
}

/// Accepts the key with or without the `0x` prefix.
fn parse_private_key(raw: &str) -> Result<PrivateKeySigner> {
	let trimmed = raw.trim();
	let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
	digits
		.parse::<PrivateKeySigner>()
		.map_err(|e| anyhow!("unusable private key: {e}"))
}
