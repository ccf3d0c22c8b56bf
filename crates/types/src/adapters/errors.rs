//! Adapter errors and the category taxonomy that drives fallback

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::chain::ChainId;
use crate::provider::Provider;
use crate::wallet::WalletError;

/// Errors raised by a provider adapter
#[derive(Error, Debug)]
pub enum AdapterError {
	#[error("HTTP request failed: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("HTTP {status_code}: {reason}")]
	HttpStatusError { status_code: u16, reason: String },

	#[error("Timeout occurred after {timeout_ms}ms")]
	Timeout { timeout_ms: u64 },

	#[error("Invalid response format: {reason}")]
	InvalidResponse { reason: String },

	#[error("No routes available: {reason}")]
	NoRoutes { reason: String },

	#[error("Chain {chain_id} is not supported by {provider}")]
	ChainNotSupported { chain_id: ChainId, provider: Provider },

	#[error("Provider {provider} is disabled")]
	Disabled { provider: Provider },

	#[error("Quote from {quote_provider} cannot be executed by {provider}")]
	ProviderMismatch {
		provider: Provider,
		quote_provider: Provider,
	},

	#[error("Wallet error: {0}")]
	Wallet(#[from] WalletError),

	#[error("Execution failed: {reason}")]
	ExecutionFailed { reason: String },

	#[error("Bridge status not final after {attempts} polls for {request_id}")]
	StatusTimeout { request_id: String, attempts: u32 },

	#[error("Operation cancelled")]
	Cancelled,

	#[error("Configuration error: {reason}")]
	ConfigError { reason: String },

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Failure of a request coalesced with other callers
	#[error(transparent)]
	Shared(Arc<AdapterError>),
}

impl AdapterError {
	/// Extract HTTP status code from the error if available
	pub fn status_code(&self) -> Option<u16> {
		match self {
			AdapterError::HttpStatusError { status_code, .. } => Some(*status_code),
			AdapterError::HttpError(reqwest_error) => {
				reqwest_error.status().map(|status| status.as_u16())
			},
			AdapterError::Shared(inner) => inner.status_code(),
			_ => None,
		}
	}

	pub fn from_http_failure(status_code: u16, body: impl Into<String>) -> Self {
		Self::HttpStatusError {
			status_code,
			reason: body.into(),
		}
	}

	pub fn is_cancelled(&self) -> bool {
		match self {
			AdapterError::Cancelled => true,
			AdapterError::Shared(inner) => inner.is_cancelled(),
			_ => false,
		}
	}

	/// Take back sole ownership of a shared failure when possible
	pub fn from_shared(error: Arc<AdapterError>) -> Self {
		Arc::try_unwrap(error).unwrap_or_else(AdapterError::Shared)
	}

	pub fn category(&self) -> ErrorCategory {
		ErrorCategory::classify(self)
	}
}

/// Failure taxonomy used for the fallback decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
	NoRoutes,
	NetworkError,
	Timeout,
	/// User rejection, insufficient funds, on-chain revert
	ExecutionError,
	Unknown,
}

impl ErrorCategory {
	/// Classify a caught adapter error
	pub fn classify(error: &AdapterError) -> Self {
		match error {
			AdapterError::NoRoutes { .. } | AdapterError::ChainNotSupported { .. } => {
				ErrorCategory::NoRoutes
			},
			AdapterError::HttpError(e) if e.is_timeout() => ErrorCategory::Timeout,
			AdapterError::HttpError(e) => match e.status() {
				Some(status) => Self::from_status(status.as_u16()),
				None => ErrorCategory::NetworkError,
			},
			AdapterError::HttpStatusError {
				status_code,
				reason,
			} => match Self::from_message(reason) {
				ErrorCategory::NoRoutes => ErrorCategory::NoRoutes,
				_ => Self::from_status(*status_code),
			},
			AdapterError::Timeout { .. } | AdapterError::StatusTimeout { .. } => {
				ErrorCategory::Timeout
			},
			AdapterError::Wallet(_) | AdapterError::ExecutionFailed { .. } => {
				ErrorCategory::ExecutionError
			},
			AdapterError::InvalidResponse { reason } => Self::from_message(reason),
			AdapterError::Shared(inner) => Self::classify(inner),
			AdapterError::Disabled { .. }
			| AdapterError::ProviderMismatch { .. }
			| AdapterError::Cancelled
			| AdapterError::ConfigError { .. }
			| AdapterError::Serialization(_) => ErrorCategory::Unknown,
		}
	}

	fn from_status(status_code: u16) -> Self {
		match status_code {
			408 | 504 => ErrorCategory::Timeout,
			429 | 500..=599 => ErrorCategory::NetworkError,
			_ => ErrorCategory::Unknown,
		}
	}

	/// Best-effort classification of a free-form provider message
	pub fn from_message(message: &str) -> Self {
		let lower = message.to_ascii_lowercase();
		if lower.contains("no route") || lower.contains("no_routes") || lower.contains("no quotes")
		{
			ErrorCategory::NoRoutes
		} else if lower.contains("timeout") || lower.contains("timed out") {
			ErrorCategory::Timeout
		} else if lower.contains("network") || lower.contains("fetch failed") {
			ErrorCategory::NetworkError
		} else if lower.contains("rejected") || lower.contains("insufficient") {
			ErrorCategory::ExecutionError
		} else {
			ErrorCategory::Unknown
		}
	}

	/// Categories that move straight to the next provider
	pub fn is_immediate_failover(&self) -> bool {
		matches!(self, ErrorCategory::NoRoutes | ErrorCategory::NetworkError)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorCategory::NoRoutes => "NO_ROUTES",
			ErrorCategory::NetworkError => "NETWORK_ERROR",
			ErrorCategory::Timeout => "TIMEOUT",
			ErrorCategory::ExecutionError => "EXECUTION_ERROR",
			ErrorCategory::Unknown => "UNKNOWN",
		}
	}
}

impl std::fmt::Display for ErrorCategory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_classification_of_adapter_errors() {
		let no_routes = AdapterError::NoRoutes {
			reason: "amount too low".to_string(),
		};
		assert_eq!(no_routes.category(), ErrorCategory::NoRoutes);

		let unsupported = AdapterError::ChainNotSupported {
			chain_id: 1337,
			provider: Provider::Bungee,
		};
		assert_eq!(unsupported.category(), ErrorCategory::NoRoutes);

		let rejected = AdapterError::Wallet(WalletError::Rejected);
		assert_eq!(rejected.category(), ErrorCategory::ExecutionError);

		let timeout = AdapterError::Timeout { timeout_ms: 100 };
		assert_eq!(timeout.category(), ErrorCategory::Timeout);

		assert_eq!(AdapterError::Cancelled.category(), ErrorCategory::Unknown);

		let shared = AdapterError::Shared(Arc::new(AdapterError::from_http_failure(502, "")));
		assert_eq!(shared.category(), ErrorCategory::NetworkError);
		assert_eq!(shared.status_code(), Some(502));
	}

	#[test]
	fn test_http_status_classification() {
		assert_eq!(
			AdapterError::from_http_failure(503, "Service Unavailable").category(),
			ErrorCategory::NetworkError
		);
		assert_eq!(
			AdapterError::from_http_failure(429, "slow down").category(),
			ErrorCategory::NetworkError
		);
		assert_eq!(
			AdapterError::from_http_failure(504, "").category(),
			ErrorCategory::Timeout
		);
		assert_eq!(
			AdapterError::from_http_failure(400, "{\"errorCode\":\"NO_ROUTES\"}").category(),
			ErrorCategory::NoRoutes
		);
		assert_eq!(
			AdapterError::from_http_failure(401, "Unauthorized").category(),
			ErrorCategory::Unknown
		);
		assert_eq!(
			AdapterError::from_http_failure(404, "").status_code(),
			Some(404)
		);
	}

	#[test]
	fn test_immediate_failover_set() {
		assert!(ErrorCategory::NoRoutes.is_immediate_failover());
		assert!(ErrorCategory::NetworkError.is_immediate_failover());
		assert!(!ErrorCategory::Timeout.is_immediate_failover());
		assert!(!ErrorCategory::ExecutionError.is_immediate_failover());
		assert!(!ErrorCategory::Unknown.is_immediate_failover());
	}

	#[test]
	fn test_message_classification() {
		assert_eq!(
			ErrorCategory::from_message("No routes found for this pair"),
			ErrorCategory::NoRoutes
		);
		assert_eq!(
			ErrorCategory::from_message("request timed out"),
			ErrorCategory::Timeout
		);
		assert_eq!(
			ErrorCategory::from_message("Network request failed"),
			ErrorCategory::NetworkError
		);
		assert_eq!(
			ErrorCategory::from_message("something odd"),
			ErrorCategory::Unknown
		);
	}
}
