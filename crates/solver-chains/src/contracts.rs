//! ABI surface of the contracts the solver consumes.

use alloy::sol;

// Solidity definitions matching the deployed router and token contracts.
sol! {
	/// Parameter set the router stores per swap request.
	struct SwapRequestParameters {
		uint256 srcChainId;
		uint256 dstChainId;
		address sender;
		address recipient;
		address tokenIn;
		address tokenOut;
		uint256 amountOut;
		uint256 verificationFee;
		uint256 solverFee;
		uint256 nonce;
		bool executed;
		uint256 requestedAt;
	}

	interface IRouter {
		function getFulfilledTransfers() external view returns (bytes32[] memory);
		function getUnfulfilledSolverRefunds() external view returns (bytes32[] memory);
		function getSwapRequestParameters(bytes32 requestId) external view returns (SwapRequestParameters memory);
		function relayTokens(
			address solver,
			bytes32 requestId,
			address sender,
			address recipient,
			address tokenIn,
			address tokenOut,
			uint256 amountOut,
			uint256 srcChainId,
			uint256 nonce
		) external returns (bool);

		error SwapRequestParametersMismatch();
	}

	interface IERC20 {
		function balanceOf(address account) external view returns (uint256);
		function approve(address spender, uint256 amount) external returns (bool);
	}
}

/// Revert selectors the executor knows how to name.
///
/// `SwapRequestParametersMismatch` means the destination router's stored
/// parameter set did not match what was sent — the usual cause is a request
/// that has not been verified on the destination chain yet.
const KNOWN_SELECTORS: &[(&str, &str)] = &[("0xc4fec7e0", "SwapRequestParametersMismatch")];

/// Names a known revert selector appearing anywhere in an RPC error message.
pub fn known_selector(message: &str) -> Option<&'static str> {
	let lowered = message.to_lowercase();
	KNOWN_SELECTORS
		.iter()
		.find(|(selector, _)| lowered.contains(selector))
		.map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn names_the_parameters_mismatch_selector() {
		let message = "server returned an error response: error code 3: execution reverted, data: \"0xc4fec7e0\"";
		assert_eq!(known_selector(message), Some("SwapRequestParametersMismatch"));
	}

	#[test]
	fn selector_match_is_case_insensitive() {
		assert_eq!(
			known_selector("revert data 0xC4FEC7E0"),
			Some("SwapRequestParametersMismatch")
		);
	}

	#[test]
	fn unknown_selectors_stay_anonymous() {
		assert_eq!(known_selector("execution reverted: 0xdeadbeef"), None);
	}
}
