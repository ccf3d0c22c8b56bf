//! Bridge Engine
//!
//! Multi-provider cross-chain bridge execution engine. Routes a transfer to
//! the highest-priority bridge provider that supports it, falls back to the
//! next provider on soft failures, and tracks execution to completion.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

// Core domain types
pub use bridge_types::{
	chrono,
	serde_json,
	AdapterError,
	AdapterResult,
	BridgeAdapter,
	BridgeParams,
	BridgeStatus,
	CancellationToken,
	ChainId,
	ErrorCategory,
	ErrorReport,
	ErrorReporter,
	ExecutionContext,
	ExecutionRequest,
	ExecutionResult,
	FallbackAttempt,
	GasOracle,
	GasPrice,
	OperationKind,
	ProgressEvent,
	ProgressReporter,
	Provider,
	ProviderConfig,
	RouteSelection,
	TransactionParams,
	UnifiedQuote,
	WalletClient,
	WalletKind,
};

// Service layer
pub use bridge_service::{
	AttemptTracker, BridgeError, BridgeService, EngineSnapshot, GasEscalator, GasPolicy,
	OrchestratorOptions, ProviderSelector, TracingErrorReporter,
};

// Adapters
pub use bridge_adapters::{
	AdapterContext, AdapterRegistry, BungeeAdapter, ClientCache, PollOptions, QuoteCache,
	QuoteCacheConfig, RelayAdapter, StatusPoller,
};

// Config
pub use bridge_config::{
	load_config, log_provider_summary, log_service_info, log_startup_complete, LogFormat,
	LoggingSettings, Settings,
};

pub mod types {
	pub use bridge_types::*;
}

pub mod config {
	pub use bridge_config::*;
}

pub mod adapters {
	pub use bridge_adapters::*;
}

pub mod service {
	pub use bridge_service::*;
}

pub use async_trait;

/// Builder wiring settings, adapters and collaborators into a [`BridgeService`]
#[derive(Default)]
pub struct BridgeEngineBuilder {
	settings: Option<Settings>,
	gas_oracle: Option<Arc<dyn GasOracle>>,
	reporter: Option<Arc<dyn ErrorReporter>>,
	client_cache: Option<ClientCache>,
	adapters: Vec<Arc<dyn BridgeAdapter>>,
}

impl BridgeEngineBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = Some(settings);
		self
	}

	pub fn settings(&self) -> Option<&Settings> {
		self.settings.as_ref()
	}

	/// Chain RPC used to derive minimum gas prices. Without one, the
	/// configured fallback values are used.
	pub fn with_gas_oracle(mut self, oracle: Arc<dyn GasOracle>) -> Self {
		self.gas_oracle = Some(oracle);
		self
	}

	pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
		self.reporter = Some(reporter);
		self
	}

	/// Use a private HTTP client pool instead of the process-wide one
	pub fn with_client_cache(mut self, client_cache: ClientCache) -> Self {
		self.client_cache = Some(client_cache);
		self
	}

	/// Register a custom adapter, replacing the configured one for its provider
	pub fn with_adapter(mut self, adapter: Arc<dyn BridgeAdapter>) -> Self {
		self.adapters.push(adapter);
		self
	}

	/// Shared adapter services derived from settings
	pub fn adapter_context(&self, settings: &Settings) -> AdapterContext {
		let polling = &settings.polling;
		let mut context = AdapterContext {
			quote_cache: QuoteCache::new(QuoteCacheConfig {
				ttl: Duration::from_millis(settings.cache.ttl_ms),
				max_size: settings.cache.max_size,
			}),
			poller: StatusPoller::new(PollOptions {
				max_attempts: polling.max_attempts,
				interval: Duration::from_millis(polling.interval_ms),
				backoff_multiplier: polling.backoff_multiplier,
				max_interval: Duration::from_millis(polling.max_interval_ms),
			}),
			normalization: settings.normalization.clone(),
			user_operation_timeout: Duration::from_millis(
				settings.orchestrator.user_operation_timeout_ms,
			),
			..AdapterContext::default()
		};
		if let Some(client_cache) = &self.client_cache {
			context.client_cache = client_cache.clone();
		}
		context
	}

	/// Validate settings and build the orchestrator
	pub fn build(self) -> Result<BridgeService, BridgeError> {
		let settings = self.settings.clone().unwrap_or_default();
		settings
			.validate()
			.map_err(|e| BridgeError::Configuration(e.to_string()))?;

		let context = self.adapter_context(&settings);
		let mut registry = AdapterRegistry::from_configs(&settings.provider_configs(), &context)
			.map_err(|e| BridgeError::Configuration(e.to_string()))?;
		for adapter in self.adapters {
			registry.register(adapter);
		}
		if registry.is_empty() {
			return Err(BridgeError::Configuration(
				"no provider adapters registered".to_string(),
			));
		}
		info!("Registered {} provider adapter(s)", registry.len());

		let policy = GasPolicy::from(&settings.gas);
		let gas = match self.gas_oracle {
			Some(oracle) => GasEscalator::new(oracle, policy),
			None => GasEscalator::without_oracle(policy),
		};

		let mut service = BridgeService::new(
			Arc::new(registry),
			OrchestratorOptions::from(&settings.orchestrator),
		)
		.with_gas_escalator(gas);
		if let Some(reporter) = self.reporter {
			service = service.with_reporter(reporter);
		}
		Ok(service)
	}

	/// Load `.env` and configuration, initialize logging, build the engine and
	/// report provider ordering and health for the configured probe routes.
	pub async fn run_diagnostics(
		mut self,
	) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
		dotenvy::dotenv().ok();

		let using_provided_settings = self.settings.is_some();
		let settings = match self.settings.take() {
			Some(settings) => settings,
			None => load_config()?,
		};

		init_tracing(&settings.logging)?;
		log_service_info();
		info!(
			"Using configuration: loaded from {}",
			if using_provided_settings {
				"provided settings"
			} else {
				"config file or defaults"
			}
		);
		log_provider_summary(&settings);

		let diagnostics = settings.diagnostics.clone();
		let service = self.with_settings(settings).build()?;

		for route in &diagnostics.probe_routes {
			let selection = service
				.selector()
				.select(route.from_chain_id, route.to_chain_id);
			match selection.primary {
				Some(primary) => info!(
					"🧭 Route {} -> {}: {} then {:?}",
					route.from_chain_id, route.to_chain_id, primary, selection.fallback
				),
				None => info!(
					"🧭 Route {} -> {}: unsupported",
					route.from_chain_id, route.to_chain_id
				),
			}
			for line in &selection.reasoning {
				info!("     {}", line);
			}
		}

		if diagnostics.check_health {
			let mut health: Vec<_> = service.health_check_all().await.into_iter().collect();
			health.sort_by_key(|(provider, _)| provider.as_str());
			for (provider, healthy) in health {
				info!(
					"{} {} is {}",
					if healthy { "💚" } else { "💔" },
					provider,
					if healthy { "reachable" } else { "unreachable" }
				);
			}
		}

		log_startup_complete(service.selector().configs().len());
		Ok(())
	}
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(
	logging: &LoggingSettings,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

	match logging.format {
		LogFormat::Json => {
			let subscriber = tracing_subscriber::fmt().json().with_env_filter(env_filter);
			if logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()?;
			} else {
				subscriber.try_init()?;
			}
		},
		LogFormat::Pretty => {
			let subscriber = tracing_subscriber::fmt()
				.pretty()
				.with_env_filter(env_filter);
			if logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()?;
			} else {
				subscriber.try_init()?;
			}
		},
		LogFormat::Compact => {
			let subscriber = tracing_subscriber::fmt()
				.compact()
				.with_env_filter(env_filter);
			if logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()?;
			} else {
				subscriber.try_init()?;
			}
		},
	}

	info!(
		"Logging configuration applied: level={}, format={:?}, structured={}",
		logging.level, logging.format, logging.structured
	);
	Ok(())
}
