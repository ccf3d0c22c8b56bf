//! Bridge Adapters
//!
//! Provider adapters for the bridge execution engine, plus the machinery they
//! share: pooled HTTP clients, chain/token normalization, the quote request
//! cache and the bridge status poller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bridge_types::constants::limits::DEFAULT_USER_OPERATION_TIMEOUT_MS;
use bridge_types::{NormalizationRules, Provider, ProviderConfig};

pub mod bungee_adapter;
pub mod client_cache;
pub mod execution;
mod http;
pub mod normalizer;
pub mod quote_cache;
pub mod relay_adapter;
pub mod status_poller;

pub use bridge_types::{AdapterError, AdapterResult, BridgeAdapter};
pub use bungee_adapter::BungeeAdapter;
pub use client_cache::{global_client_cache, AuthConfig, ClientCache, ClientConfig};
pub use normalizer::{Normalizer, ProviderParams};
pub use quote_cache::{QuoteCache, QuoteCacheConfig, QuoteCacheKey};
pub use relay_adapter::RelayAdapter;
pub use status_poller::{PollError, PollOptions, StatusFetcher, StatusPoller};

/// Shared services handed to every adapter at construction
#[derive(Debug, Clone)]
pub struct AdapterContext {
	pub client_cache: ClientCache,
	pub quote_cache: QuoteCache,
	pub poller: StatusPoller,
	pub normalization: NormalizationRules,
	/// How long a smart account waits for its user operation receipt
	pub user_operation_timeout: Duration,
}

impl Default for AdapterContext {
	fn default() -> Self {
		Self {
			client_cache: global_client_cache(),
			quote_cache: QuoteCache::default(),
			poller: StatusPoller::default(),
			normalization: NormalizationRules::default(),
			user_operation_timeout: Duration::from_millis(DEFAULT_USER_OPERATION_TIMEOUT_MS),
		}
	}
}

/// Adapters keyed by provider
#[derive(Debug, Default, Clone)]
pub struct AdapterRegistry {
	adapters: HashMap<Provider, Arc<dyn BridgeAdapter>>,
}

impl AdapterRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build one adapter per config
	pub fn from_configs(
		configs: &[ProviderConfig],
		context: &AdapterContext,
	) -> AdapterResult<Self> {
		let mut registry = Self::new();
		for config in configs {
			registry.register(Self::create_adapter(config.clone(), context)?);
		}
		Ok(registry)
	}

	pub fn create_adapter(
		config: ProviderConfig,
		context: &AdapterContext,
	) -> AdapterResult<Arc<dyn BridgeAdapter>> {
		match config.provider {
			Provider::Relay => Ok(Arc::new(RelayAdapter::new(config, context)?)),
			Provider::Bungee => Ok(Arc::new(BungeeAdapter::new(config, context)?)),
		}
	}

	/// Add or replace the adapter for its provider
	pub fn register(&mut self, adapter: Arc<dyn BridgeAdapter>) {
		self.adapters.insert(adapter.provider(), adapter);
	}

	pub fn get(&self, provider: Provider) -> Option<Arc<dyn BridgeAdapter>> {
		self.adapters.get(&provider).cloned()
	}

	pub fn all(&self) -> impl Iterator<Item = &Arc<dyn BridgeAdapter>> {
		self.adapters.values()
	}

	/// Provider configs ordered by priority
	pub fn configs(&self) -> Vec<ProviderConfig> {
		let mut configs: Vec<_> = self
			.adapters
			.values()
			.map(|adapter| adapter.config().clone())
			.collect();
		configs.sort_by_key(|config| config.priority);
		configs
	}

	pub fn len(&self) -> usize {
		self.adapters.len()
	}

	pub fn is_empty(&self) -> bool {
		self.adapters.is_empty()
	}
}
