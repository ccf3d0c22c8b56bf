//! Chain identifiers and chain-level helpers
//!
//! The engine models every chain with a single numeric id. Providers that
//! represent a chain differently get remapped inside their adapters.

/// Numeric chain identifier as used throughout the engine
pub type ChainId = u64;

pub const ETHEREUM: ChainId = 1;
pub const OPTIMISM: ChainId = 10;
pub const POLYGON: ChainId = 137;
pub const BASE: ChainId = 8453;
pub const ARBITRUM: ChainId = 42161;

/// Hyperliquid (HyperCore)
pub const HYPERLIQUID: ChainId = 1337;

/// Solana
pub const SOLANA: ChainId = 1_151_111_081_099_710;

/// Address used across the engine for a chain's native gas token
pub const NATIVE_TOKEN_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Chains that only some providers can route to or from.
///
/// A provider must explicitly declare one of these in its capabilities to be
/// selected for a route touching it.
pub const SPECIAL_CHAINS: [ChainId; 2] = [SOLANA, HYPERLIQUID];

/// Whether the chain needs explicit provider support
pub fn is_special_chain(chain_id: ChainId) -> bool {
	SPECIAL_CHAINS.contains(&chain_id)
}

/// Whether the address is the engine's native-token placeholder
pub fn is_native_token(address: &str) -> bool {
	address.eq_ignore_ascii_case(NATIVE_TOKEN_ADDRESS)
}

/// Human-readable chain name for logs
pub fn chain_name(chain_id: ChainId) -> &'static str {
	match chain_id {
		ETHEREUM => "ethereum",
		OPTIMISM => "optimism",
		POLYGON => "polygon",
		BASE => "base",
		ARBITRUM => "arbitrum",
		HYPERLIQUID => "hyperliquid",
		SOLANA => "solana",
		_ => "unknown",
	}
}
