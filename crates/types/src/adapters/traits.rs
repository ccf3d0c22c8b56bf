//! The unified interface every bridge backend is wrapped behind

use async_trait::async_trait;

use super::{AdapterResult, ExecutionRequest};
use crate::chain::ChainId;
use crate::execution::ExecutionResult;
use crate::provider::{Provider, ProviderCapabilities, ProviderConfig};
use crate::quote::{BridgeParams, UnifiedQuote};

/// Bridge provider adapter.
///
/// `Ok(None)` from the quote methods means the provider has no route for the
/// request. It is a soft failure and always eligible for fallback.
#[async_trait]
pub trait BridgeAdapter: Send + Sync + std::fmt::Debug {
	fn provider(&self) -> Provider;

	fn config(&self) -> &ProviderConfig;

	/// Indicative pricing, no transaction payloads
	async fn get_price(&self, params: &BridgeParams) -> AdapterResult<Option<UnifiedQuote>>;

	/// Executable quote carrying transaction payloads
	async fn get_quote(&self, params: &BridgeParams) -> AdapterResult<Option<UnifiedQuote>>;

	/// Submit the quote's transactions and track the bridge to a terminal status
	async fn execute(
		&self,
		quote: &UnifiedQuote,
		request: ExecutionRequest,
	) -> AdapterResult<ExecutionResult>;

	/// Config and capability check on the caller's (internal) chain ids.
	/// Never touches the network.
	fn is_supported(&self, from_chain_id: ChainId, to_chain_id: ChainId) -> bool {
		self.config().supports_route(from_chain_id, to_chain_id)
	}

	fn capabilities(&self) -> &ProviderCapabilities {
		&self.config().capabilities
	}

	/// Cheap liveness signal
	async fn is_healthy(&self) -> bool {
		self.config().enabled
	}
}
