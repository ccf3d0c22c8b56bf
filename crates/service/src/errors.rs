//! Errors surfaced by the orchestrator

use bridge_types::{AdapterError, ChainId, ErrorCategory, Provider};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
	#[error("No provider supports route {from_chain_id} -> {to_chain_id}")]
	UnsupportedRoute {
		from_chain_id: ChainId,
		to_chain_id: ChainId,
	},

	#[error("All providers failed for route {from_chain_id} -> {to_chain_id}")]
	AllProvidersFailed {
		from_chain_id: ChainId,
		to_chain_id: ChainId,
	},

	#[error("Operation cancelled")]
	Cancelled,

	#[error("{provider} failed ({category}): {source}")]
	Adapter {
		provider: Provider,
		category: ErrorCategory,
		#[source]
		source: AdapterError,
	},

	#[error("No adapter registered for {0}")]
	NoAdapter(Provider),

	#[error("Configuration error: {0}")]
	Configuration(String),

	#[error("Invalid bridge parameters: {0}")]
	InvalidParams(String),
}

impl BridgeError {
	/// Wrap an adapter failure, classifying it once
	pub fn adapter(provider: Provider, source: AdapterError) -> Self {
		if source.is_cancelled() {
			return BridgeError::Cancelled;
		}
		Self::Adapter {
			provider,
			category: source.category(),
			source,
		}
	}

	pub fn category(&self) -> ErrorCategory {
		match self {
			BridgeError::UnsupportedRoute { .. } | BridgeError::AllProvidersFailed { .. } => {
				ErrorCategory::NoRoutes
			},
			BridgeError::Adapter { category, .. } => *category,
			BridgeError::Cancelled
			| BridgeError::NoAdapter(_)
			| BridgeError::Configuration(_)
			| BridgeError::InvalidParams(_) => ErrorCategory::Unknown,
		}
	}

	pub fn provider(&self) -> Option<Provider> {
		match self {
			BridgeError::Adapter { provider, .. } => Some(*provider),
			BridgeError::NoAdapter(provider) => Some(*provider),
			_ => None,
		}
	}
}
