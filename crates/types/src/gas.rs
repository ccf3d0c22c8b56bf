//! Gas oracle collaborator and EIP-1559 fee pair

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::ChainId;

/// Fee fields of the latest block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFees {
	pub base_fee_per_gas: Option<u128>,
}

/// Minimum EIP-1559 fees a transaction should carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPrice {
	pub max_priority_fee_per_gas: u128,
	pub max_fee_per_gas: u128,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GasOracleError {
	#[error("no RPC configured for chain {0}")]
	UnsupportedChain(ChainId),

	#[error("failed to read latest block: {0}")]
	Rpc(String),
}

/// Source of current network fee conditions
#[async_trait]
pub trait GasOracle: Send + Sync {
	async fn latest_block(&self, chain_id: ChainId) -> Result<BlockFees, GasOracleError>;
}
