//! Bridge provider identity and static per-provider configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chain::ChainId;
use crate::constants::limits::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::models::SecretString;

/// The closed set of bridge backends the engine can delegate to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
	/// Relay, an SDK-style intent bridge
	Relay,
	/// Bungee (Socket), a REST bridge aggregator
	Bungee,
}

impl Provider {
	pub const ALL: [Provider; 2] = [Provider::Relay, Provider::Bungee];

	pub fn as_str(&self) -> &'static str {
		match self {
			Provider::Relay => "relay",
			Provider::Bungee => "bungee",
		}
	}
}

impl fmt::Display for Provider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Provider {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"relay" => Ok(Provider::Relay),
			"bungee" | "socket" => Ok(Provider::Bungee),
			other => Err(format!("unknown bridge provider '{}'", other)),
		}
	}
}

/// Chains a provider accepts as origin and destination
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedChains {
	pub origins: Vec<ChainId>,
	pub destinations: Vec<ChainId>,
}

impl SupportedChains {
	pub fn new(origins: Vec<ChainId>, destinations: Vec<ChainId>) -> Self {
		Self {
			origins,
			destinations,
		}
	}

	/// Same chain list on both sides
	pub fn symmetric(chains: Vec<ChainId>) -> Self {
		Self {
			origins: chains.clone(),
			destinations: chains,
		}
	}

	pub fn supports(&self, from_chain_id: ChainId, to_chain_id: ChainId) -> bool {
		self.origins.contains(&from_chain_id) && self.destinations.contains(&to_chain_id)
	}
}

/// Feature flags describing what a provider can do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderCapabilities {
	/// Indicative pricing without building transactions
	pub price_quotes: bool,
	/// Batched execution through ERC-4337 smart accounts
	pub smart_account_execution: bool,
	/// Completion tracking through a status endpoint
	pub status_tracking: bool,
	/// Chains needing special handling that this provider can route
	pub special_chains: Vec<ChainId>,
}

impl Default for ProviderCapabilities {
	fn default() -> Self {
		Self {
			price_quotes: true,
			smart_account_execution: true,
			status_tracking: true,
			special_chains: Vec::new(),
		}
	}
}

impl ProviderCapabilities {
	pub fn handles_special_chain(&self, chain_id: ChainId) -> bool {
		self.special_chains.contains(&chain_id)
	}
}

/// Per-provider request timeouts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderTimeouts {
	pub request_ms: u64,
}

impl Default for ProviderTimeouts {
	fn default() -> Self {
		Self {
			request_ms: DEFAULT_REQUEST_TIMEOUT_MS,
		}
	}
}

/// How the orchestrator may retry away from this provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
	/// Allow switching to the next provider on no-route or network errors
	pub fallback_on_failure: bool,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			fallback_on_failure: true,
		}
	}
}

/// Static configuration for a single provider, loaded once at startup.
///
/// Lower `priority` is preferred.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
	pub provider: Provider,
	pub enabled: bool,
	pub priority: u32,
	/// Base URL of the provider API
	pub endpoint: String,
	pub api_key: Option<SecretString>,
	pub supported_chains: SupportedChains,
	pub capabilities: ProviderCapabilities,
	pub timeouts: ProviderTimeouts,
	pub retry_policy: RetryPolicy,
}

impl ProviderConfig {
	pub fn new(provider: Provider, priority: u32, endpoint: impl Into<String>) -> Self {
		Self {
			provider,
			enabled: true,
			priority,
			endpoint: endpoint.into(),
			api_key: None,
			supported_chains: SupportedChains::default(),
			capabilities: ProviderCapabilities::default(),
			timeouts: ProviderTimeouts::default(),
			retry_policy: RetryPolicy::default(),
		}
	}

	pub fn with_chains(mut self, supported_chains: SupportedChains) -> Self {
		self.supported_chains = supported_chains;
		self
	}

	pub fn with_capabilities(mut self, capabilities: ProviderCapabilities) -> Self {
		self.capabilities = capabilities;
		self
	}

	pub fn with_api_key(mut self, api_key: SecretString) -> Self {
		self.api_key = Some(api_key);
		self
	}

	pub fn disabled(mut self) -> Self {
		self.enabled = false;
		self
	}

	/// Config-level route check: enabled, both chains listed, and any special
	/// chain explicitly handled.
	pub fn supports_route(&self, from_chain_id: ChainId, to_chain_id: ChainId) -> bool {
		self.enabled
			&& self.supported_chains.supports(from_chain_id, to_chain_id)
			&& [from_chain_id, to_chain_id].iter().all(|chain_id| {
				!crate::chain::is_special_chain(*chain_id)
					|| self.capabilities.handles_special_chain(*chain_id)
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::chain::{BASE, HYPERLIQUID, POLYGON};

	#[test]
	fn test_provider_parsing() {
		assert_eq!("Relay".parse::<Provider>().unwrap(), Provider::Relay);
		assert_eq!("socket".parse::<Provider>().unwrap(), Provider::Bungee);
		assert!("across".parse::<Provider>().is_err());
		assert_eq!(
			serde_json::to_string(&Provider::Bungee).unwrap(),
			"\"bungee\""
		);
	}

	#[test]
	fn test_supports_route_requires_both_sides() {
		let config = ProviderConfig::new(Provider::Relay, 1, "https://api.relay.link")
			.with_chains(SupportedChains::new(vec![BASE], vec![POLYGON]));

		assert!(config.supports_route(BASE, POLYGON));
		assert!(!config.supports_route(POLYGON, BASE));
		assert!(!config.clone().disabled().supports_route(BASE, POLYGON));
	}

	#[test]
	fn test_special_chain_needs_capability() {
		let chains = SupportedChains::symmetric(vec![BASE, HYPERLIQUID]);
		let without = ProviderConfig::new(Provider::Bungee, 2, "https://bungee.example")
			.with_chains(chains.clone());
		assert!(!without.supports_route(BASE, HYPERLIQUID));

		let with = ProviderConfig::new(Provider::Relay, 1, "https://api.relay.link")
			.with_chains(chains)
			.with_capabilities(ProviderCapabilities {
				special_chains: vec![HYPERLIQUID],
				..Default::default()
			});
		assert!(with.supports_route(BASE, HYPERLIQUID));
	}
}
