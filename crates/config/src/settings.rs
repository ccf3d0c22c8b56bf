//! Configuration settings structures

use std::collections::HashSet;

use bridge_types::chain::{
	ChainId, ARBITRUM, BASE, ETHEREUM, HYPERLIQUID, OPTIMISM, POLYGON, SOLANA,
};
use bridge_types::constants::limits::{
	DEFAULT_BASE_FEE_MULTIPLIER_PERCENT, DEFAULT_EXECUTION_TIMEOUT_MS,
	DEFAULT_MAX_PROVIDERS_TO_TRY, DEFAULT_POLL_BACKOFF_MULTIPLIER, DEFAULT_POLL_INTERVAL_MS,
	DEFAULT_POLL_MAX_ATTEMPTS, DEFAULT_POLL_MAX_INTERVAL_MS, DEFAULT_QUOTE_CACHE_MAX_SIZE,
	DEFAULT_QUOTE_CACHE_TTL_MS, DEFAULT_USER_OPERATION_TIMEOUT_MS, FALLBACK_MAX_FEE_WEI,
	FALLBACK_MAX_PRIORITY_FEE_WEI,
};
use bridge_types::{
	NormalizationRules, Provider, ProviderCapabilities, ProviderConfig, ProviderTimeouts,
	RetryPolicy, SupportedChains,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::configurable_value::ConfigurableValue;

/// Main engine settings. Every section falls back to its default.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
	pub providers: Vec<ProviderSettings>,
	pub orchestrator: OrchestratorSettings,
	pub polling: PollingSettings,
	pub gas: GasSettings,
	pub cache: CacheSettings,
	pub normalization: NormalizationRules,
	pub logging: LoggingSettings,
	pub diagnostics: DiagnosticsSettings,
}

/// One provider entry as written in the config file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderSettings {
	pub provider: Provider,
	#[serde(default = "default_enabled")]
	pub enabled: bool,
	pub priority: u32,
	pub endpoint: String,
	#[serde(default)]
	pub api_key: Option<ConfigurableValue>,
	pub supported_chains: SupportedChains,
	#[serde(default)]
	pub capabilities: ProviderCapabilities,
	#[serde(default)]
	pub timeouts: ProviderTimeouts,
	#[serde(default)]
	pub retry_policy: RetryPolicy,
}

fn default_enabled() -> bool {
	true
}

impl ProviderSettings {
	/// Resolve credentials into the runtime provider config.
	///
	/// A provider whose API key cannot be resolved is kept but disabled.
	pub fn to_provider_config(&self) -> ProviderConfig {
		let mut config = ProviderConfig::new(self.provider, self.priority, self.endpoint.clone())
			.with_chains(self.supported_chains.clone())
			.with_capabilities(self.capabilities.clone());
		config.enabled = self.enabled;
		config.timeouts = self.timeouts.clone();
		config.retry_policy = self.retry_policy.clone();

		if let Some(api_key) = &self.api_key {
			match api_key.resolve_secret() {
				Ok(secret) => config.api_key = Some(secret),
				Err(e) if self.enabled => {
					warn!(
						provider = %self.provider,
						source = %api_key.description(),
						"Disabling provider, API key unavailable: {}",
						e
					);
					config.enabled = false;
				},
				Err(_) => {},
			}
		}
		config
	}
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OrchestratorSettings {
	/// Upper bound on providers attempted per operation
	pub max_providers_to_try: usize,
	/// Wall-clock deadline for one `execute_quote`
	pub execution_timeout_ms: u64,
	/// How long to wait for a smart-account user operation receipt
	pub user_operation_timeout_ms: u64,
}

impl Default for OrchestratorSettings {
	fn default() -> Self {
		Self {
			max_providers_to_try: DEFAULT_MAX_PROVIDERS_TO_TRY,
			execution_timeout_ms: DEFAULT_EXECUTION_TIMEOUT_MS,
			user_operation_timeout_ms: DEFAULT_USER_OPERATION_TIMEOUT_MS,
		}
	}
}

/// Status polling backoff
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PollingSettings {
	pub max_attempts: u32,
	pub interval_ms: u64,
	pub backoff_multiplier: f64,
	pub max_interval_ms: u64,
}

impl Default for PollingSettings {
	fn default() -> Self {
		Self {
			max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
			interval_ms: DEFAULT_POLL_INTERVAL_MS,
			backoff_multiplier: DEFAULT_POLL_BACKOFF_MULTIPLIER,
			max_interval_ms: DEFAULT_POLL_MAX_INTERVAL_MS,
		}
	}
}

/// Gas escalation. Wei values are used when the gas oracle is unavailable.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GasSettings {
	pub fallback_max_priority_fee_wei: u64,
	pub fallback_max_fee_wei: u64,
	/// `max_fee = base_fee * percent / 100 + priority`
	pub base_fee_multiplier_percent: u64,
}

impl Default for GasSettings {
	fn default() -> Self {
		Self {
			fallback_max_priority_fee_wei: FALLBACK_MAX_PRIORITY_FEE_WEI as u64,
			fallback_max_fee_wei: FALLBACK_MAX_FEE_WEI as u64,
			base_fee_multiplier_percent: DEFAULT_BASE_FEE_MULTIPLIER_PERCENT as u64,
		}
	}
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CacheSettings {
	pub ttl_ms: u64,
	pub max_size: usize,
}

impl Default for CacheSettings {
	fn default() -> Self {
		Self {
			ttl_ms: DEFAULT_QUOTE_CACHE_TTL_MS,
			max_size: DEFAULT_QUOTE_CACHE_MAX_SIZE,
		}
	}
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
	pub structured: bool,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Pretty,
			structured: false,
		}
	}
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RouteSettings {
	pub from_chain_id: ChainId,
	pub to_chain_id: ChainId,
}

/// Routes the diagnostics binary reports provider ordering for
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DiagnosticsSettings {
	pub probe_routes: Vec<RouteSettings>,
	pub check_health: bool,
}

impl Default for DiagnosticsSettings {
	fn default() -> Self {
		let route = |from_chain_id, to_chain_id| RouteSettings {
			from_chain_id,
			to_chain_id,
		};
		Self {
			probe_routes: vec![
				route(BASE, POLYGON),
				route(ARBITRUM, HYPERLIQUID),
				route(ETHEREUM, SOLANA),
			],
			check_health: true,
		}
	}
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
	#[error("No bridge providers configured")]
	NoProviders,

	#[error("Provider {0} is configured more than once")]
	DuplicateProvider(Provider),

	#[error("Providers share priority {0}; priorities must be unique")]
	DuplicatePriority(u32),

	#[error("Provider {provider} has an invalid endpoint '{endpoint}'")]
	InvalidEndpoint { provider: Provider, endpoint: String },

	#[error("polling.max_attempts must be at least 1")]
	ZeroPollAttempts,

	#[error("polling.backoff_multiplier must be finite and >= 1.0, got {0}")]
	InvalidBackoffMultiplier(f64),

	#[error("polling.interval_ms must not exceed polling.max_interval_ms")]
	IntervalExceedsMax,

	#[error("cache.max_size must be at least 1")]
	ZeroCacheSize,

	#[error("orchestrator.max_providers_to_try must be at least 1")]
	ZeroProvidersToTry,
}

impl Default for Settings {
	fn default() -> Self {
		let evm = vec![ETHEREUM, OPTIMISM, POLYGON, BASE, ARBITRUM];

		let mut relay_chains = evm.clone();
		relay_chains.extend([HYPERLIQUID, SOLANA]);
		let mut bungee_chains = evm;
		bungee_chains.push(SOLANA);

		Self {
			providers: vec![
				ProviderSettings {
					provider: Provider::Relay,
					enabled: true,
					priority: 1,
					endpoint: "https://api.relay.link".to_string(),
					api_key: None,
					supported_chains: SupportedChains::symmetric(relay_chains),
					capabilities: ProviderCapabilities {
						special_chains: vec![HYPERLIQUID, SOLANA],
						..Default::default()
					},
					timeouts: ProviderTimeouts::default(),
					retry_policy: RetryPolicy::default(),
				},
				ProviderSettings {
					provider: Provider::Bungee,
					enabled: true,
					priority: 2,
					endpoint: "https://api.socket.tech/v2".to_string(),
					api_key: Some(ConfigurableValue::from_env("BUNGEE_API_KEY")),
					supported_chains: SupportedChains::symmetric(bungee_chains),
					capabilities: ProviderCapabilities {
						special_chains: vec![SOLANA],
						..Default::default()
					},
					timeouts: ProviderTimeouts::default(),
					retry_policy: RetryPolicy::default(),
				},
			],
			orchestrator: OrchestratorSettings::default(),
			polling: PollingSettings::default(),
			gas: GasSettings::default(),
			cache: CacheSettings::default(),
			normalization: NormalizationRules::default(),
			logging: LoggingSettings::default(),
			diagnostics: DiagnosticsSettings::default(),
		}
	}
}

impl Settings {
	pub fn validate(&self) -> Result<(), ConfigValidationError> {
		if self.providers.is_empty() {
			return Err(ConfigValidationError::NoProviders);
		}

		let mut seen_providers = HashSet::new();
		let mut seen_priorities = HashSet::new();
		for provider in &self.providers {
			if !seen_providers.insert(provider.provider) {
				return Err(ConfigValidationError::DuplicateProvider(provider.provider));
			}
			if !seen_priorities.insert(provider.priority) {
				return Err(ConfigValidationError::DuplicatePriority(provider.priority));
			}
			if !provider.endpoint.starts_with("http://") && !provider.endpoint.starts_with("https://")
			{
				return Err(ConfigValidationError::InvalidEndpoint {
					provider: provider.provider,
					endpoint: provider.endpoint.clone(),
				});
			}
		}

		if self.polling.max_attempts == 0 {
			return Err(ConfigValidationError::ZeroPollAttempts);
		}
		if !self.polling.backoff_multiplier.is_finite() || self.polling.backoff_multiplier < 1.0 {
			return Err(ConfigValidationError::InvalidBackoffMultiplier(
				self.polling.backoff_multiplier,
			));
		}
		if self.polling.interval_ms > self.polling.max_interval_ms {
			return Err(ConfigValidationError::IntervalExceedsMax);
		}
		if self.cache.max_size == 0 {
			return Err(ConfigValidationError::ZeroCacheSize);
		}
		if self.orchestrator.max_providers_to_try == 0 {
			return Err(ConfigValidationError::ZeroProvidersToTry);
		}
		Ok(())
	}

	/// Runtime provider configs, credentials resolved
	pub fn provider_configs(&self) -> Vec<ProviderConfig> {
		self.providers
			.iter()
			.map(ProviderSettings::to_provider_config)
			.collect()
	}

	pub fn enabled_providers(&self) -> Vec<Provider> {
		self.providers
			.iter()
			.filter(|p| p.enabled)
			.map(|p| p.provider)
			.collect()
	}
}
