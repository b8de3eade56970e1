//! Execution conditions attached to transfers.
//!
//! A transfer may carry zero or more conditions; the scored evaluator checks
//! them before committing inventory. Evaluation is a total match over the
//! variants — an unknown combination is a skip, never a panic.

use crate::swap::{ChainState, Transfer};
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Comparison operator for price and balance conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
	Gt,
	Lt,
	Eq,
	Gte,
	Lte,
	Between,
}

impl Comparison {
	/// Whether `value` satisfies the comparison against `target`.
	///
	/// `Between` is inclusive on both ends and requires `upper`; without an
	/// upper bound it cannot hold.
	pub fn holds<T: PartialOrd>(&self, value: T, target: T, upper: Option<T>) -> bool {
		match self {
			Comparison::Gt => value > target,
			Comparison::Lt => value < target,
			Comparison::Eq => value == target,
			Comparison::Gte => value >= target,
			Comparison::Lte => value <= target,
			Comparison::Between => match upper {
				Some(upper) => value >= target && value <= upper,
				None => false,
			},
		}
	}
}

/// Operator for time conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOp {
	After,
	Before,
	Between,
}

/// Caller-supplied predicate, evaluated against the transfer and the cloned
/// per-tick chain states.
pub type CustomEvaluator = Arc<dyn Fn(&Transfer, &HashMap<u64, ChainState>) -> bool + Send + Sync>;

/// One execution condition.
#[derive(Clone)]
pub enum Condition {
	/// Wall-clock window, unix seconds. `end_timestamp` only applies to
	/// `TimeOp::Between`.
	Time {
		op: TimeOp,
		timestamp: u64,
		end_timestamp: Option<u64>,
	},
	/// Oracle price for a token on a chain. Oracle failures fail the
	/// condition, never the tick.
	Price {
		token: Address,
		chain_id: u64,
		op: Comparison,
		target: f64,
		upper: Option<f64>,
		source: String,
	},
	/// Solver balance on a chain; native balance when `token` is unset.
	Balance {
		chain_id: u64,
		token: Option<Address>,
		op: Comparison,
		threshold: U256,
		upper: Option<U256>,
	},
	Custom {
		eval: CustomEvaluator,
	},
}

impl Condition {
	pub fn kind(&self) -> &'static str {
		match self {
			Condition::Time { .. } => "time",
			Condition::Price { .. } => "price",
			Condition::Balance { .. } => "balance",
			Condition::Custom { .. } => "custom",
		}
	}
}

impl fmt::Debug for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Condition::Time { op, timestamp, end_timestamp } => f
				.debug_struct("Time")
				.field("op", op)
				.field("timestamp", timestamp)
				.field("end_timestamp", end_timestamp)
				.finish(),
			Condition::Price { token, chain_id, op, target, upper, source } => f
				.debug_struct("Price")
				.field("token", token)
				.field("chain_id", chain_id)
				.field("op", op)
				.field("target", target)
				.field("upper", upper)
				.field("source", source)
				.finish(),
			Condition::Balance { chain_id, token, op, threshold, upper } => f
				.debug_struct("Balance")
				.field("chain_id", chain_id)
				.field("token", token)
				.field("op", op)
				.field("threshold", threshold)
				.field("upper", upper)
				.finish(),
			Condition::Custom { .. } => f.debug_struct("Custom").finish_non_exhaustive(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn comparisons_hold_as_named() {
		assert!(Comparison::Gt.holds(2, 1, None));
		assert!(!Comparison::Gt.holds(1, 1, None));
		assert!(Comparison::Lt.holds(0, 1, None));
		assert!(Comparison::Eq.holds(1, 1, None));
		assert!(Comparison::Gte.holds(1, 1, None));
		assert!(Comparison::Lte.holds(1, 1, None));
	}

	#[test]
	fn between_is_inclusive_and_needs_an_upper_bound() {
		assert!(Comparison::Between.holds(5, 5, Some(10)));
		assert!(Comparison::Between.holds(10, 5, Some(10)));
		assert!(!Comparison::Between.holds(11, 5, Some(10)));
		assert!(!Comparison::Between.holds(5, 5, None));
	}

	#[test]
	fn kind_names_every_variant() {
		let custom = Condition::Custom {
			eval: Arc::new(|_, _| true),
		};
		assert_eq!(custom.kind(), "custom");

		let time = Condition::Time {
			op: TimeOp::After,
			timestamp: 0,
			end_timestamp: None,
		};
		assert_eq!(time.kind(), "time");
	}
}
