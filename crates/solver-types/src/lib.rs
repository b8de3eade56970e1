//! Shared data model for the solver.
//!
//! Everything the other crates exchange lives here: canonical request
//! identifiers, the swap-request wire shape, per-chain state snapshots,
//! evaluation conditions and the error taxonomy.

pub mod conditions;
pub mod errors;
pub mod ids;
pub mod swap;

pub use conditions::{Comparison, Condition, CustomEvaluator, TimeOp};
pub use errors::{Result, SolverError};
pub use ids::{normalize_chain_id, RequestId};
pub use swap::{ChainState, RelayRequest, SwapRequest, Trade, Transfer};
