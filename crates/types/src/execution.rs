//! Execution results, bridge status and progress events

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::provider::Provider;

/// Bridge state as reported by a provider's status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeStatus {
	Success,
	Failure,
	Refund,
	Pending,
	Waiting,
	Delayed,
	#[serde(other)]
	Unknown,
}

impl BridgeStatus {
	/// `success`, `failure` and `refund` end polling; everything else keeps going
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			BridgeStatus::Success | BridgeStatus::Failure | BridgeStatus::Refund
		)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			BridgeStatus::Success => "success",
			BridgeStatus::Failure => "failure",
			BridgeStatus::Refund => "refund",
			BridgeStatus::Pending => "pending",
			BridgeStatus::Waiting => "waiting",
			BridgeStatus::Delayed => "delayed",
			BridgeStatus::Unknown => "unknown",
		}
	}
}

impl std::fmt::Display for BridgeStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Status snapshot returned by a status fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
	pub status: BridgeStatus,
	#[serde(default)]
	pub in_tx_hashes: Vec<String>,
	#[serde(default)]
	pub tx_hashes: Vec<String>,
	pub origin_chain_id: Option<u64>,
	pub destination_chain_id: Option<u64>,
}

impl StatusReport {
	pub fn new(status: BridgeStatus) -> Self {
		Self {
			status,
			in_tx_hashes: Vec::new(),
			tx_hashes: Vec::new(),
			origin_chain_id: None,
			destination_chain_id: None,
		}
	}
}

/// How the wallet submitted the transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPath {
	/// Sent one by one from an externally owned account
	Transactions,
	/// Batched into a single ERC-4337 user operation
	UserOperation,
}

/// Final outcome of executing a quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
	pub provider: Provider,
	pub request_id: Option<String>,
	pub submission: SubmissionPath,
	pub source_tx_hashes: Vec<String>,
	pub destination_tx_hashes: Vec<String>,
	pub user_operation_hash: Option<String>,
	pub status: BridgeStatus,
}

impl ExecutionResult {
	pub fn is_success(&self) -> bool {
		self.status == BridgeStatus::Success
	}
}

/// Incremental progress pushed while a quote executes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
	/// A provider attempt started
	ProviderSelected { provider: Provider },
	/// A source-chain transaction or user operation was accepted
	TransactionSubmitted { provider: Provider, hash: String },
	/// A non-terminal status was observed while polling
	StatusUpdate {
		provider: Provider,
		status: BridgeStatus,
		destination_tx_hashes: Vec<String>,
	},
	/// The bridge reached `success`
	Completed { provider: Provider, result: ExecutionResult },
	/// The bridge reached `failure`/`refund`, or submission failed
	Failed { provider: Provider, reason: String },
}

/// Sender side of a progress channel.
///
/// Emitting never fails: a dropped receiver just means nobody is listening.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
	sender: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
	/// Create a reporter and the receiver the caller subscribes with
	pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
		let (sender, receiver) = mpsc::unbounded_channel();
		(
			Self {
				sender: Some(sender),
			},
			receiver,
		)
	}

	/// Reporter that drops every event
	pub fn disabled() -> Self {
		Self { sender: None }
	}

	pub fn emit(&self, event: ProgressEvent) {
		if let Some(sender) = &self.sender {
			let _ = sender.send(event);
		}
	}
}
