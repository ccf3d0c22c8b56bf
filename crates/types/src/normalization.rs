//! Provider-specific chain id and token address rules

use serde::{Deserialize, Serialize};

use crate::chain::{ChainId, HYPERLIQUID, SOLANA};
use crate::provider::Provider;

/// Relay's id for Solana
pub const RELAY_SOLANA_CHAIN_ID: ChainId = 792_703_809;
/// Bungee's id for Solana
pub const BUNGEE_SOLANA_CHAIN_ID: ChainId = 89_999;
/// Placeholder Bungee uses for a chain's native gas token
pub const BUNGEE_NATIVE_TOKEN_ADDRESS: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";
/// Hyperliquid's native USDC as Relay expects it on the destination side
pub const RELAY_HYPERLIQUID_USDC: &str = "0x00000000000000000000000000000000";

/// Chain the provider represents with a different numeric id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainOverride {
	pub provider: Provider,
	pub chain_id: ChainId,
	pub provider_chain_id: ChainId,
}

/// Address substituted for the native token.
///
/// `chain_id: None` applies to every chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeTokenOverride {
	pub provider: Provider,
	#[serde(default)]
	pub chain_id: Option<ChainId>,
	pub address: String,
}

/// Destination token forced for a chain whose native gas token is also the
/// token the bridge must deliver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationTokenOverride {
	pub provider: Provider,
	pub chain_id: ChainId,
	pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationRules {
	pub chain_overrides: Vec<ChainOverride>,
	pub native_token_overrides: Vec<NativeTokenOverride>,
	pub destination_token_overrides: Vec<DestinationTokenOverride>,
}

impl Default for NormalizationRules {
	fn default() -> Self {
		Self {
			chain_overrides: vec![
				ChainOverride {
					provider: Provider::Relay,
					chain_id: SOLANA,
					provider_chain_id: RELAY_SOLANA_CHAIN_ID,
				},
				ChainOverride {
					provider: Provider::Bungee,
					chain_id: SOLANA,
					provider_chain_id: BUNGEE_SOLANA_CHAIN_ID,
				},
			],
			native_token_overrides: vec![NativeTokenOverride {
				provider: Provider::Bungee,
				chain_id: None,
				address: BUNGEE_NATIVE_TOKEN_ADDRESS.to_string(),
			}],
			destination_token_overrides: vec![DestinationTokenOverride {
				provider: Provider::Relay,
				chain_id: HYPERLIQUID,
				address: RELAY_HYPERLIQUID_USDC.to_string(),
			}],
		}
	}
}

impl NormalizationRules {
	/// No remapping at all
	pub fn none() -> Self {
		Self {
			chain_overrides: Vec::new(),
			native_token_overrides: Vec::new(),
			destination_token_overrides: Vec::new(),
		}
	}
}
