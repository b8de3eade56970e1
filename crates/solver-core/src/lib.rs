//! Core solver loop.
//!
//! This crate owns the process-wide state: the per-chain state store and the
//! in-flight cache. Around them it provides the two evaluator variants, the
//! executor that settles emitted trades on their destination chains, and the
//! supervisor that fans every chain's block stream into one work queue.

pub mod engine;
pub mod evaluate;
pub mod executor;
pub mod inflight;
pub mod store;

pub use engine::Solver;
pub use evaluate::{build_evaluator, Evaluate, PriceOracle, ScoredEvaluator, SimpleEvaluator};
pub use executor::Executor;
pub use inflight::InFlightCache;
pub use store::StateStore;
