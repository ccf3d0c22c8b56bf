//! Provider selection
//!
//! Orders the configured providers for a route. Selection is a pure function
//! of the static provider table: nothing is cached between calls.

use std::sync::Arc;

use bridge_types::chain::{chain_name, is_special_chain};
use bridge_types::{ChainId, Provider, ProviderConfig, RouteSelection};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ProviderSelector {
	configs: Arc<[ProviderConfig]>,
}

impl ProviderSelector {
	pub fn new(configs: impl Into<Arc<[ProviderConfig]>>) -> Self {
		Self {
			configs: configs.into(),
		}
	}

	pub fn configs(&self) -> &[ProviderConfig] {
		&self.configs
	}

	pub fn config(&self, provider: Provider) -> Option<&ProviderConfig> {
		self.configs.iter().find(|config| config.provider == provider)
	}

	/// Providers able to serve `from -> to`, ordered by ascending priority
	pub fn select(&self, from_chain_id: ChainId, to_chain_id: ChainId) -> RouteSelection {
		let mut reasoning = Vec::new();
		let mut candidates: Vec<&ProviderConfig> = Vec::new();

		for config in self.configs.iter() {
			match Self::rejection(config, from_chain_id, to_chain_id) {
				Some(reason) => reasoning.push(format!("{}: {}", config.provider, reason)),
				None => candidates.push(config),
			}
		}
		candidates.sort_by_key(|config| config.priority);

		let mut ordered = candidates.into_iter();
		let primary = ordered.next().map(|config| {
			reasoning.push(format!(
				"{}: primary (priority {})",
				config.provider, config.priority
			));
			config.provider
		});
		let fallback: Vec<Provider> = ordered
			.map(|config| {
				reasoning.push(format!(
					"{}: fallback (priority {})",
					config.provider, config.priority
				));
				config.provider
			})
			.collect();

		debug!(
			from = chain_name(from_chain_id),
			to = chain_name(to_chain_id),
			primary = ?primary,
			fallback = ?fallback,
			"Selected providers for route"
		);

		RouteSelection {
			primary,
			fallback,
			reasoning,
		}
	}

	/// Ordered providers for the route, primary first
	pub fn available_providers(&self, from_chain_id: ChainId, to_chain_id: ChainId) -> Vec<Provider> {
		self.select(from_chain_id, to_chain_id).ordered()
	}

	fn rejection(
		config: &ProviderConfig,
		from_chain_id: ChainId,
		to_chain_id: ChainId,
	) -> Option<String> {
		if !config.enabled {
			return Some("disabled".to_string());
		}
		if !config.supported_chains.supports(from_chain_id, to_chain_id) {
			return Some(format!(
				"route {} -> {} not listed",
				from_chain_id, to_chain_id
			));
		}
		[from_chain_id, to_chain_id]
			.into_iter()
			.find(|chain_id| {
				is_special_chain(*chain_id) && !config.capabilities.handles_special_chain(*chain_id)
			})
			.map(|chain_id| format!("no special handling for {}", chain_name(chain_id)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bridge_types::chain::{ARBITRUM, BASE, HYPERLIQUID, POLYGON, SOLANA};
	use bridge_types::{ProviderCapabilities, SupportedChains};

	fn relay() -> ProviderConfig {
		ProviderConfig::new(Provider::Relay, 1, "https://api.relay.link")
			.with_chains(SupportedChains::symmetric(vec![
				BASE,
				POLYGON,
				ARBITRUM,
				HYPERLIQUID,
			]))
			.with_capabilities(ProviderCapabilities {
				special_chains: vec![HYPERLIQUID],
				..Default::default()
			})
	}

	fn bungee() -> ProviderConfig {
		ProviderConfig::new(Provider::Bungee, 2, "https://api.socket.tech/v2").with_chains(
			SupportedChains::symmetric(vec![BASE, POLYGON, ARBITRUM, HYPERLIQUID]),
		)
	}

	#[test]
	fn test_orders_by_priority() {
		// Listed out of order on purpose
		let selector = ProviderSelector::new(vec![bungee(), relay()]);
		let selection = selector.select(BASE, POLYGON);

		assert_eq!(selection.primary, Some(Provider::Relay));
		assert_eq!(selection.fallback, vec![Provider::Bungee]);
		assert_eq!(selection.reasoning.len(), 2);
	}

	#[test]
	fn test_special_chain_requires_capability() {
		let selector = ProviderSelector::new(vec![relay(), bungee()]);
		let selection = selector.select(ARBITRUM, HYPERLIQUID);

		assert_eq!(selection.ordered(), vec![Provider::Relay]);
		assert!(selection
			.reasoning
			.iter()
			.any(|r| r.starts_with("bungee: no special handling")));
	}

	#[test]
	fn test_unsupported_route_is_empty() {
		let selector = ProviderSelector::new(vec![relay(), bungee()]);
		let selection = selector.select(BASE, SOLANA);

		assert!(selection.is_empty());
		assert!(selector.available_providers(BASE, SOLANA).is_empty());
	}

	#[test]
	fn test_disabled_providers_are_skipped() {
		let selector = ProviderSelector::new(vec![relay().disabled(), bungee()]);
		assert_eq!(
			selector.available_providers(BASE, POLYGON),
			vec![Provider::Bungee]
		);
		assert_eq!(selector.config(Provider::Relay).map(|c| c.enabled), Some(false));
	}
}
