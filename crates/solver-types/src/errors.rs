//! Error types for the solver system.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SolverError>;

/// Failure taxonomy shared across the workspace.
///
/// Transient chain I/O and on-chain reverts skip a tick or a trade and are
/// retried on a later block; configuration errors are fatal at startup;
/// decode errors mark a candidate the loop drops without crashing.
#[derive(Debug, Error)]
pub enum SolverError {
	#[error("chain error: {0}")]
	Chain(String),

	#[error("decode error: {0}")]
	Decode(String),

	#[error("configuration error: {0}")]
	Config(String),

	#[error("execution error: {0}")]
	Execution(String),

	#[error("oracle error: {0}")]
	Oracle(String),

	#[error("invalid request id: {0}")]
	InvalidRequestId(String),
}
