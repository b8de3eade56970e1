//! The supervisor loop.
//!
//! Owns the chain clients, the canonical state store, the evaluator and the
//! executor. Every chain's block stream is fanned into a single work queue;
//! each event drives one tick: fetch the chain's state, replace its store
//! entry, evaluate against a per-tick clone, execute the emitted trades.

use crate::evaluate::Evaluate;
use crate::executor::Executor;
use crate::inflight::InFlightCache;
use crate::store::StateStore;
use solver_chains::{BlockEvent, ChainClient};
use solver_types::{Result, SolverError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct Solver {
	clients: HashMap<u64, Arc<dyn ChainClient>>,
	store: StateStore,
	evaluator: Box<dyn Evaluate>,
	executor: Executor,
	in_flight: InFlightCache,
}

impl Solver {
	pub fn new(
		clients: HashMap<u64, Arc<dyn ChainClient>>,
		evaluator: Box<dyn Evaluate>,
		in_flight: InFlightCache,
	) -> Self {
		let executor = Executor::new(clients.clone());
		Self {
			clients,
			store: StateStore::new(),
			evaluator,
			executor,
			in_flight,
		}
	}

	/// Runs until a shutdown signal arrives.
	///
	/// Startup failures (an unreachable chain during priming) and the
	/// simultaneous termination of every block stream are the only errors
	/// this returns; everything else degrades to a skipped tick or trade.
	pub async fn run(&self) -> Result<()> {
		for (chain_id, client) in &self.clients {
			let state = client.fetch_state().await?;
			self.store.replace(*chain_id, state).await;
		}
		info!(chains = self.clients.len(), "state primed; watching blocks");

		let (tx, mut events) = mpsc::channel::<BlockEvent>(256);
		for client in self.clients.values() {
			let mut stream = client.subscribe_blocks().await?;
			let tx = tx.clone();
			tokio::spawn(async move {
				while let Some(event) = stream.next().await {
					if tx.send(event).await.is_err() {
						break;
					}
				}
			});
		}
		drop(tx);

		let shutdown = shutdown_signal();
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				event = events.recv() => match event {
					Some(event) => self.tick(event).await,
					None => {
						return Err(SolverError::Chain(
							"every block stream terminated".to_string(),
						))
					}
				},
				_ = &mut shutdown => break,
			}
		}

		info!("shutdown signal received; closing chain clients");
		for client in self.clients.values() {
			client.close().await;
		}
		Ok(())
	}

	async fn tick(&self, event: BlockEvent) {
		let Some(client) = self.clients.get(&event.chain_id) else {
			warn!(chain_id = event.chain_id, "block event for an unconfigured chain");
			return;
		};

		let state = match client.fetch_state().await {
			Ok(state) => state,
			Err(e) => {
				warn!(
					chain_id = event.chain_id,
					block = event.block_number,
					error = %e,
					"state fetch failed; skipping tick"
				);
				return;
			}
		};
		self.store.replace(event.chain_id, state).await;

		// The evaluator works on a clone so its inventory commits stay
		// inside this tick.
		let mut snapshot = self.store.snapshot().await;
		let trades = self
			.evaluator
			.evaluate(event.chain_id, &mut snapshot, &self.in_flight)
			.await;

		if trades.is_empty() {
			debug!(
				chain_id = event.chain_id,
				block = event.block_number,
				"tick complete; nothing to execute"
			);
			return;
		}

		info!(
			chain_id = event.chain_id,
			block = event.block_number,
			trades = trades.len(),
			"executing trades"
		);
		self.executor.execute(trades, &self.in_flight).await;
	}
}

async fn shutdown_signal() {
	let ctrl_c = async {
		tokio::signal::ctrl_c()
			.await
			.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
			.expect("failed to install SIGTERM handler")
			.recv()
			.await;
	};

	#[cfg(unix)]
	let user_defined = async {
		tokio::signal::unix::signal(tokio::signal::unix::SignalKind::user_defined2())
			.expect("failed to install SIGUSR2 handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();
	#[cfg(not(unix))]
	let user_defined = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
		_ = user_defined => {},
	}
}
