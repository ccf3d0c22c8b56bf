//! Provider adapter contract

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::execution::ProgressReporter;
use crate::wallet::WalletClient;

pub mod errors;
pub mod traits;

pub use errors::{AdapterError, ErrorCategory};
pub use traits::BridgeAdapter;

/// Result type for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Collaborators handed to `BridgeAdapter::execute`
#[derive(Clone)]
pub struct ExecutionRequest {
	pub wallet: Arc<dyn WalletClient>,
	pub progress: ProgressReporter,
	/// Cancelled on caller abort or when the absolute deadline passes
	pub cancel: CancellationToken,
}

impl ExecutionRequest {
	pub fn new(wallet: Arc<dyn WalletClient>, progress: ProgressReporter) -> Self {
		Self {
			wallet,
			progress,
			cancel: CancellationToken::new(),
		}
	}

	pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
		self.cancel = cancel;
		self
	}
}

impl fmt::Debug for ExecutionRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ExecutionRequest")
			.field("wallet", &self.wallet.address())
			.field("wallet_kind", &self.wallet.kind())
			.field("cancelled", &self.cancel.is_cancelled())
			.finish()
	}
}
