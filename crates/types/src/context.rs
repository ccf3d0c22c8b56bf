//! Per-action diagnostics: route selection and provider-switch history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chain::ChainId;
use crate::provider::Provider;

/// Which logical operation the orchestrator is driving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
	Price,
	Quote,
	Execute,
}

impl OperationKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			OperationKind::Price => "price",
			OperationKind::Quote => "quote",
			OperationKind::Execute => "execute",
		}
	}
}

impl std::fmt::Display for OperationKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Ordered providers for a route. Built fresh per call, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSelection {
	pub primary: Option<Provider>,
	pub fallback: Vec<Provider>,
	pub reasoning: Vec<String>,
}

impl RouteSelection {
	pub fn is_empty(&self) -> bool {
		self.primary.is_none()
	}

	/// `[primary, ...fallback]`
	pub fn ordered(&self) -> Vec<Provider> {
		self.primary
			.iter()
			.copied()
			.chain(self.fallback.iter().copied())
			.collect()
	}
}

/// One provider switch (or skip) and why it happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackAttempt {
	pub provider: Provider,
	pub reason: String,
	pub timestamp: DateTime<Utc>,
}

impl FallbackAttempt {
	pub fn new(provider: Provider, reason: impl Into<String>) -> Self {
		Self {
			provider,
			reason: reason.into(),
			timestamp: Utc::now(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainData {
	pub from_chain_id: ChainId,
	pub to_chain_id: ChainId,
}

/// History accumulated over one top-level user action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
	pub session_id: String,
	pub timestamp: DateTime<Utc>,
	/// Provider that most recently serviced (or is servicing) the action
	pub provider: Option<Provider>,
	pub fallback_attempts: Vec<FallbackAttempt>,
	pub chain_data: ChainData,
}

impl ExecutionContext {
	pub fn new(from_chain_id: ChainId, to_chain_id: ChainId) -> Self {
		Self {
			session_id: Uuid::new_v4().to_string(),
			timestamp: Utc::now(),
			provider: None,
			fallback_attempts: Vec::new(),
			chain_data: ChainData {
				from_chain_id,
				to_chain_id,
			},
		}
	}

	pub fn record_fallback(&mut self, provider: Provider, reason: impl Into<String>) {
		self.fallback_attempts
			.push(FallbackAttempt::new(provider, reason));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_route_selection_ordering() {
		let selection = RouteSelection {
			primary: Some(Provider::Relay),
			fallback: vec![Provider::Bungee],
			reasoning: vec![],
		};
		assert_eq!(selection.ordered(), vec![Provider::Relay, Provider::Bungee]);
		assert!(!selection.is_empty());
		assert!(RouteSelection::default().ordered().is_empty());
	}

	#[test]
	fn test_context_records_fallbacks() {
		let mut context = ExecutionContext::new(8453, 137);
		context.record_fallback(Provider::Relay, "no routes available");
		assert_eq!(context.fallback_attempts.len(), 1);
		assert_eq!(context.fallback_attempts[0].provider, Provider::Relay);
		assert!(!context.session_id.is_empty());
	}
}
