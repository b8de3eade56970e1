//! Trade execution on destination chains.

use crate::inflight::InFlightCache;
use solver_chains::ChainClient;
use solver_types::{RelayRequest, Result, SolverError, Trade};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Wall-clock deadline for one trade's reconcile + approve + relay.
pub const TRADE_DEADLINE: Duration = Duration::from_secs(10);

/// Pause after the approval confirms, letting the allowance settle before
/// the relay spends it.
pub const APPROVAL_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Settles emitted trades one at a time, in list order.
///
/// Sequential execution keeps the approve-before-relay ordering on the
/// shared wallet nonce. The in-flight cache entry for a trade is written
/// before its first on-chain side effect and removed only on failure, so a
/// later tick can retry; successful entries expire on their own.
pub struct Executor {
	clients: HashMap<u64, Arc<dyn ChainClient>>,
	trade_deadline: Duration,
	approval_settle_delay: Duration,
}

impl Executor {
	pub fn new(clients: HashMap<u64, Arc<dyn ChainClient>>) -> Self {
		Self {
			clients,
			trade_deadline: TRADE_DEADLINE,
			approval_settle_delay: APPROVAL_SETTLE_DELAY,
		}
	}

	#[cfg(test)]
	fn with_deadline(mut self, deadline: Duration) -> Self {
		self.trade_deadline = deadline;
		self.approval_settle_delay = Duration::from_millis(1);
		self
	}

	pub async fn execute(&self, trades: Vec<Trade>, in_flight: &InFlightCache) {
		for trade in trades {
			let request_id = trade.request_id;
			if in_flight.has(&request_id) {
				info!(request_id = %request_id.short(), "skipping trade: already in flight");
				continue;
			}
			// Claim the id before any network traffic for it.
			in_flight.insert(request_id);

			let Some(client) = self.clients.get(&trade.dest_chain_id) else {
				error!(
					request_id = %request_id.short(),
					dest_chain = trade.dest_chain_id,
					"aborting trade: no client for destination chain"
				);
				continue;
			};
			if !client.tokens().contains(&trade.token_out) {
				error!(
					request_id = %request_id.short(),
					token = %trade.token_out,
					dest_chain = trade.dest_chain_id,
					"aborting trade: token not configured on destination chain"
				);
				continue;
			}

			match tokio::time::timeout(self.trade_deadline, self.settle(client.as_ref(), &trade))
				.await
			{
				Ok(Ok(())) => {
					info!(request_id = %request_id.short(), "trade settled");
					// Entry stays; its TTL expires naturally.
				}
				Ok(Err(e)) => {
					error!(request_id = %request_id.short(), error = %e, "trade failed");
					in_flight.remove(&request_id);
				}
				Err(_) => {
					error!(
						request_id = %request_id.short(),
						deadline_secs = self.trade_deadline.as_secs(),
						"trade deadline exceeded"
					);
					in_flight.remove(&request_id);
				}
			}
		}
	}

	async fn settle(&self, client: &dyn ChainClient, trade: &Trade) -> Result<()> {
		// Relay parameters must match what the destination router stored at
		// verification time; its record wins over the source-chain values.
		let relay = match client.stored_parameters(trade.request_id).await {
			Ok(stored) if stored.is_verified() => {
				debug!(
					request_id = %trade.request_id.short(),
					"using verified parameters from destination router"
				);
				RelayRequest::from_stored(trade.request_id, &stored)
			}
			Ok(_) => RelayRequest::from_trade(trade),
			Err(e) => {
				return Err(SolverError::Execution(format!(
					"parameter reconciliation failed: {e}"
				)))
			}
		};

		let approve_tx = client
			.approve(relay.token_out, client.router_address(), relay.amount_out)
			.await?;
		info!(
			request_id = %trade.request_id.short(),
			tx_hash = %approve_tx,
			"approval confirmed"
		);
		tokio::time::sleep(self.approval_settle_delay).await;

		let relay_tx = client.relay(&relay).await?;
		info!(
			request_id = %trade.request_id.short(),
			tx_hash = %relay_tx,
			"relay confirmed"
		);
		Ok(())
	}
}
