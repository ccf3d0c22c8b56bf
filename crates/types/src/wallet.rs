//! Wallet collaborator: signs and submits transactions on the origin chain

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::U256;
use crate::quote::TransactionParams;

/// Execution path the connected wallet supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
	/// Externally owned account, signs ordinary transactions
	Eoa,
	/// ERC-4337 smart account, submits batched user operations
	SmartAccount,
}

/// A single call inside a user operation batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOperationCall {
	pub to: String,
	pub data: String,
	pub value: U256,
}

impl From<&TransactionParams> for UserOperationCall {
	fn from(tx: &TransactionParams) -> Self {
		Self {
			to: tx.to.clone(),
			data: tx.data.clone(),
			value: tx.value.clone(),
		}
	}
}

/// Receipt of an included user operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOperationReceipt {
	pub success: bool,
	/// Hash of the bundle transaction that included the operation
	pub transaction_hash: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
	#[error("user rejected the request")]
	Rejected,

	#[error("insufficient funds: {0}")]
	InsufficientFunds(String),

	#[error("transaction reverted: {0}")]
	Reverted(String),

	#[error("timed out waiting for user operation {hash}")]
	ReceiptTimeout { hash: String },

	#[error("wallet transport error: {0}")]
	Transport(String),
}

impl WalletError {
	/// Map a raw wallet/provider message onto the closest variant
	pub fn from_message(message: impl Into<String>) -> Self {
		let message = message.into();
		let lower = message.to_ascii_lowercase();
		if lower.contains("user rejected") || lower.contains("user denied") {
			WalletError::Rejected
		} else if lower.contains("insufficient funds") {
			WalletError::InsufficientFunds(message)
		} else if lower.contains("revert") {
			WalletError::Reverted(message)
		} else {
			WalletError::Transport(message)
		}
	}
}

/// Signer used to submit quote transactions.
///
/// Smart-account wallets implement the user operation methods; EOA wallets
/// implement `send_transaction`.
#[async_trait]
pub trait WalletClient: Send + Sync {
	fn kind(&self) -> WalletKind;

	/// Address transactions are sent from
	fn address(&self) -> &str;

	/// Sign and broadcast one transaction, returning its hash
	async fn send_transaction(&self, tx: &TransactionParams) -> Result<String, WalletError>;

	/// Submit a batch of calls as a single user operation, returning its hash
	async fn send_user_operation(
		&self,
		chain_id: u64,
		calls: &[UserOperationCall],
	) -> Result<String, WalletError>;

	/// Wait until the bundler includes the user operation
	async fn wait_for_user_operation_receipt(
		&self,
		hash: &str,
		timeout: Duration,
	) -> Result<UserOperationReceipt, WalletError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_wallet_error_from_message() {
		assert_eq!(
			WalletError::from_message("MetaMask: User rejected the request."),
			WalletError::Rejected
		);
		assert!(matches!(
			WalletError::from_message("insufficient funds for gas * price + value"),
			WalletError::InsufficientFunds(_)
		));
		assert!(matches!(
			WalletError::from_message("execution reverted: STF"),
			WalletError::Reverted(_)
		));
		assert!(matches!(
			WalletError::from_message("socket hang up"),
			WalletError::Transport(_)
		));
	}
}
