//! Best-effort failure reporting to an external error logger

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adapters::ErrorCategory;
use crate::chain::ChainId;
use crate::context::OperationKind;
use crate::provider::Provider;

/// One failure, with the route context needed to triage it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
	pub category: ErrorCategory,
	pub provider: Option<Provider>,
	pub operation: OperationKind,
	/// Zero-based index of the provider attempt that failed
	pub retry_count: u32,
	pub from_chain_id: ChainId,
	pub to_chain_id: ChainId,
	pub message: String,
	pub session_id: String,
}

/// Sink for failure reports. Implementations must not assume they are awaited.
#[async_trait]
pub trait ErrorReporter: Send + Sync {
	async fn report(&self, report: ErrorReport);
}
