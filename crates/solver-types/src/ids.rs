//! Canonical identifiers.
//!
//! Request ids arrive from routers in whatever hex casing the RPC layer
//! produced; chain ids arrive as 256-bit words whose useful part is the low
//! 64 bits. Both are normalized here, once, before anything compares them.

use crate::errors::SolverError;
use alloy::primitives::{B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 32-byte swap-request identifier as returned by the on-chain router.
///
/// Stored as raw bytes, so comparison and set membership are independent of
/// the hex casing a request id was first observed in. The display form is the
/// canonical one: lower-case, `0x`-prefixed, 66 characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(B256);

impl RequestId {
	pub const fn new(word: B256) -> Self {
		Self(word)
	}

	pub const fn from_bytes(bytes: [u8; 32]) -> Self {
		Self(B256::new(bytes))
	}

	/// The id as the `bytes32` word the router expects back.
	pub const fn as_word(&self) -> B256 {
		self.0
	}

	/// Short prefix for log lines, e.g. `0xab12cd34..`.
	pub fn short(&self) -> String {
		let full = self.to_string();
		format!("{}..", &full[..10])
	}
}

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		// B256 renders as 0x-prefixed lower-case hex.
		write!(f, "{}", self.0)
	}
}

impl FromStr for RequestId {
	type Err = SolverError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
		if digits.len() != 64 {
			return Err(SolverError::InvalidRequestId(format!(
				"expected 64 hex digits, got {}",
				digits.len()
			)));
		}
		let mut bytes = [0u8; 32];
		for (i, chunk) in digits.as_bytes().chunks(2).enumerate() {
			let pair = std::str::from_utf8(chunk)
				.map_err(|_| SolverError::InvalidRequestId(s.to_string()))?;
			bytes[i] = u8::from_str_radix(pair, 16)
				.map_err(|_| SolverError::InvalidRequestId(s.to_string()))?;
		}
		Ok(Self(B256::new(bytes)))
	}
}

impl From<B256> for RequestId {
	fn from(word: B256) -> Self {
		Self(word)
	}
}

/// Masks a 256-bit chain id down to the 64 bits that identify the chain.
///
/// Routers store chain ids as `uint256`; every internal map keys on the
/// masked form, never on the raw word.
pub fn normalize_chain_id(id: U256) -> u64 {
	id.as_limbs()[0]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_accepts_mixed_case_and_missing_prefix() {
		let lower: RequestId =
			"0xab00000000000000000000000000000000000000000000000000000000000001"
				.parse()
				.unwrap();
		let upper: RequestId =
			"0xAB00000000000000000000000000000000000000000000000000000000000001"
				.parse()
				.unwrap();
		let bare: RequestId =
			"ab00000000000000000000000000000000000000000000000000000000000001"
				.parse()
				.unwrap();

		assert_eq!(lower, upper);
		assert_eq!(lower, bare);
	}

	#[test]
	fn display_is_canonical_and_idempotent() {
		let id: RequestId =
			"0xAB00000000000000000000000000000000000000000000000000000000000001"
				.parse()
				.unwrap();
		let canonical = id.to_string();

		assert_eq!(canonical.len(), 66);
		assert!(canonical.starts_with("0x"));
		assert_eq!(canonical, canonical.to_lowercase());

		// Round-tripping the canonical form changes nothing.
		let reparsed: RequestId = canonical.parse().unwrap();
		assert_eq!(reparsed, id);
		assert_eq!(reparsed.to_string(), canonical);
	}

	#[test]
	fn parse_rejects_wrong_length() {
		assert!("0xab".parse::<RequestId>().is_err());
		assert!("".parse::<RequestId>().is_err());
	}

	#[test]
	fn short_form_keeps_prefix() {
		let id = RequestId::from_bytes([0xab; 32]);
		assert_eq!(id.short(), "0xabababab..");
	}

	#[test]
	fn chain_id_masks_to_low_64_bits() {
		assert_eq!(normalize_chain_id(U256::from(31337u64)), 31337);

		let oversized = (U256::from(7u64) << 64) | U256::from(42u64);
		assert_eq!(normalize_chain_id(oversized), 42);
	}

	#[test]
	fn chain_id_normalization_is_idempotent() {
		let oversized = (U256::from(1u64) << 200) | U256::from(31338u64);
		let once = normalize_chain_id(oversized);
		let twice = normalize_chain_id(U256::from(once));
		assert_eq!(once, twice);
	}
}
