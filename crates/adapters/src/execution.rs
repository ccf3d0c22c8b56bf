//! Wallet submission and completion tracking shared by every adapter

use std::time::Duration;

use bridge_types::{
	AdapterError, AdapterResult, BridgeStatus, ExecutionRequest, ExecutionResult,
	ProgressEvent, Provider, SubmissionPath, UnifiedQuote, UserOperationCall, WalletError,
	WalletKind,
};
use tracing::{debug, info};

use crate::status_poller::{PollError, StatusFetcher, StatusPoller};

/// What the wallet accepted for a quote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
	pub path: SubmissionPath,
	/// Origin chain hashes in submission order
	pub source_tx_hashes: Vec<String>,
	pub user_operation_hash: Option<String>,
}

impl Submission {
	/// Hash of the final (bridging) transaction
	pub fn last_hash(&self) -> Option<&str> {
		self.source_tx_hashes.last().map(String::as_str)
	}
}

/// Send every transaction of `quote` through the request's wallet.
///
/// EOAs send one transaction per step item, in order. Smart accounts batch
/// all of them into one user operation and wait for its receipt.
pub async fn submit_quote(
	provider: Provider,
	quote: &UnifiedQuote,
	request: &ExecutionRequest,
	user_operation_timeout: Duration,
) -> AdapterResult<Submission> {
	let transactions: Vec<_> = quote.transactions().cloned().collect();
	let Some(first) = transactions.first() else {
		return Err(AdapterError::ExecutionFailed {
			reason: "quote carries no transactions".to_string(),
		});
	};
	let chain_id = first.chain_id;
	let wallet = &request.wallet;

	match wallet.kind() {
		WalletKind::Eoa => {
			let mut hashes = Vec::with_capacity(transactions.len());
			for mut tx in transactions {
				if request.cancel.is_cancelled() {
					return Err(AdapterError::Cancelled);
				}
				if tx.from.is_none() {
					tx.from = Some(wallet.address().to_string());
				}
				let hash = tokio::select! {
					biased;
					_ = request.cancel.cancelled() => return Err(AdapterError::Cancelled),
					sent = wallet.send_transaction(&tx) => sent?,
				};
				debug!(%provider, hash = %hash, chain_id = tx.chain_id, "Transaction submitted");
				request.progress.emit(ProgressEvent::TransactionSubmitted {
					provider,
					hash: hash.clone(),
				});
				hashes.push(hash);
			}
			Ok(Submission {
				path: SubmissionPath::Transactions,
				source_tx_hashes: hashes,
				user_operation_hash: None,
			})
		},
		WalletKind::SmartAccount => {
			let calls: Vec<UserOperationCall> =
				transactions.iter().map(UserOperationCall::from).collect();
			let user_op_hash = tokio::select! {
				biased;
				_ = request.cancel.cancelled() => return Err(AdapterError::Cancelled),
				sent = wallet.send_user_operation(chain_id, &calls) => sent?,
			};
			debug!(%provider, hash = %user_op_hash, calls = calls.len(), "User operation submitted");
			request.progress.emit(ProgressEvent::TransactionSubmitted {
				provider,
				hash: user_op_hash.clone(),
			});

			let receipt = tokio::select! {
				biased;
				_ = request.cancel.cancelled() => return Err(AdapterError::Cancelled),
				receipt = wallet.wait_for_user_operation_receipt(&user_op_hash, user_operation_timeout) => receipt?,
			};
			if !receipt.success {
				return Err(AdapterError::Wallet(WalletError::Reverted(format!(
					"user operation {} failed",
					user_op_hash
				))));
			}

			Ok(Submission {
				path: SubmissionPath::UserOperation,
				source_tx_hashes: receipt.transaction_hash.into_iter().collect(),
				user_operation_hash: Some(user_op_hash),
			})
		},
	}
}

/// Poll `tracking_id` to a terminal status and build the execution result.
///
/// `failure` and `refund` are results, not errors: funds already left the wallet.
pub async fn track_to_completion(
	poller: &StatusPoller,
	fetcher: &dyn StatusFetcher,
	tracking_id: &str,
	provider: Provider,
	request_id: Option<String>,
	submission: Submission,
	request: &ExecutionRequest,
) -> AdapterResult<ExecutionResult> {
	let progress = request.progress.clone();
	let report = poller
		.poll(fetcher, tracking_id, &request.cancel, |report| {
			progress.emit(ProgressEvent::StatusUpdate {
				provider,
				status: report.status,
				destination_tx_hashes: report.tx_hashes.clone(),
			});
		})
		.await
		.map_err(|e| match e {
			PollError::Cancelled => AdapterError::Cancelled,
			PollError::Timeout { attempts } => AdapterError::StatusTimeout {
				request_id: tracking_id.to_string(),
				attempts,
			},
		})?;

	let result = ExecutionResult {
		provider,
		request_id,
		submission: submission.path,
		source_tx_hashes: submission.source_tx_hashes,
		destination_tx_hashes: report.tx_hashes,
		user_operation_hash: submission.user_operation_hash,
		status: report.status,
	};

	if result.status == BridgeStatus::Success {
		info!(%provider, tracking_id = %tracking_id, "Bridge completed");
		request.progress.emit(ProgressEvent::Completed {
			provider,
			result: result.clone(),
		});
	} else {
		info!(%provider, tracking_id = %tracking_id, status = %result.status, "Bridge did not complete");
		request.progress.emit(ProgressEvent::Failed {
			provider,
			reason: format!("bridge ended with status {}", result.status),
		});
	}
	Ok(result)
}
