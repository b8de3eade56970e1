//! Serde helpers for TOML's string-keyed tables.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Deserializes a `{ "31337" = ... }` table into a `u64`-keyed map.
///
/// TOML table keys are always strings, so numeric chain ids arrive quoted.
/// Values come off the wire as `i64` (TOML's only integer width) and are
/// widened to `V` from there, since `toml` cannot deserialize `u128`/`i128`
/// directly.
pub fn deserialize_chain_id_map<'de, D, V>(deserializer: D) -> Result<HashMap<u64, V>, D::Error>
where
	D: Deserializer<'de>,
	V: TryFrom<i64>,
{
	let raw = HashMap::<String, i64>::deserialize(deserializer)?;
	let mut map = HashMap::with_capacity(raw.len());
	for (key, value) in raw {
		let chain_id = key
			.parse::<u64>()
			.map_err(|_| serde::de::Error::custom(format!("invalid chain id key: {key}")))?;
		let value = V::try_from(value)
			.map_err(|_| serde::de::Error::custom(format!("value out of range for key {key}")))?;
		map.insert(chain_id, value);
	}
	Ok(map)
}

/// Deserializes a TOML integer into a `u128`.
///
/// `toml` only supports `i64` natively, so this widens from there; values
/// that fit in a TOML file always fit in an `i64`.
pub fn deserialize_u128<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = i64::deserialize(deserializer)?;
	u128::try_from(raw).map_err(|_| serde::de::Error::custom("value must not be negative"))
}
