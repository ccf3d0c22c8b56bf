//! Gas price escalation
//!
//! Quotes are priced by a backend some seconds before they are signed. Before
//! submission every transaction's EIP-1559 fields are raised to at least the
//! current minimum, so a stale quote does not stall in the mempool.

use std::collections::HashMap;
use std::sync::Arc;

use bridge_config::GasSettings;
use bridge_types::constants::limits::{
	DEFAULT_BASE_FEE_MULTIPLIER_PERCENT, FALLBACK_MAX_FEE_WEI, FALLBACK_MAX_PRIORITY_FEE_WEI,
};
use bridge_types::{
	BlockFees, ChainId, GasOracle, GasPrice, TransactionParams, UnifiedQuote, U256,
};
use tracing::{debug, warn};

/// Fee floor used when the oracle cannot be read, and the base-fee headroom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPolicy {
	pub fallback_max_priority_fee_per_gas: u128,
	pub fallback_max_fee_per_gas: u128,
	/// Max fee is `base_fee * percent / 100 + priority fee`
	pub base_fee_multiplier_percent: u128,
}

impl Default for GasPolicy {
	fn default() -> Self {
		Self {
			fallback_max_priority_fee_per_gas: FALLBACK_MAX_PRIORITY_FEE_WEI,
			fallback_max_fee_per_gas: FALLBACK_MAX_FEE_WEI,
			base_fee_multiplier_percent: DEFAULT_BASE_FEE_MULTIPLIER_PERCENT,
		}
	}
}

impl From<&GasSettings> for GasPolicy {
	fn from(settings: &GasSettings) -> Self {
		Self {
			fallback_max_priority_fee_per_gas: settings.fallback_max_priority_fee_wei.into(),
			fallback_max_fee_per_gas: settings.fallback_max_fee_wei.into(),
			base_fee_multiplier_percent: settings.base_fee_multiplier_percent.into(),
		}
	}
}

impl GasPolicy {
	pub fn fallback(&self) -> GasPrice {
		GasPrice {
			max_priority_fee_per_gas: self.fallback_max_priority_fee_per_gas,
			max_fee_per_gas: self.fallback_max_fee_per_gas,
		}
	}

	/// Minimum fees implied by the latest block
	pub fn from_block(&self, fees: &BlockFees) -> Option<GasPrice> {
		let base_fee = fees.base_fee_per_gas?;
		let priority = self.fallback_max_priority_fee_per_gas;
		let max_fee = base_fee
			.saturating_mul(self.base_fee_multiplier_percent)
			/ 100;
		Some(GasPrice {
			max_priority_fee_per_gas: priority,
			max_fee_per_gas: max_fee.saturating_add(priority),
		})
	}
}

#[derive(Clone)]
pub struct GasEscalator {
	oracle: Option<Arc<dyn GasOracle>>,
	policy: GasPolicy,
}

impl std::fmt::Debug for GasEscalator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GasEscalator")
			.field("has_oracle", &self.oracle.is_some())
			.field("policy", &self.policy)
			.finish()
	}
}

impl Default for GasEscalator {
	fn default() -> Self {
		Self::without_oracle(GasPolicy::default())
	}
}

impl GasEscalator {
	pub fn new(oracle: Arc<dyn GasOracle>, policy: GasPolicy) -> Self {
		Self {
			oracle: Some(oracle),
			policy,
		}
	}

	/// Always uses the policy's fallback fees
	pub fn without_oracle(policy: GasPolicy) -> Self {
		Self {
			oracle: None,
			policy,
		}
	}

	pub fn policy(&self) -> &GasPolicy {
		&self.policy
	}

	/// Minimum acceptable fees on `chain_id`; never fails
	pub async fn min_gas_price(&self, chain_id: ChainId) -> GasPrice {
		let Some(oracle) = &self.oracle else {
			return self.policy.fallback();
		};
		match oracle.latest_block(chain_id).await {
			Ok(fees) => match self.policy.from_block(&fees) {
				Some(price) => price,
				None => {
					warn!(chain_id, "Latest block has no base fee, using fallback gas price");
					self.policy.fallback()
				},
			},
			Err(e) => {
				warn!(chain_id, error = %e, "Gas oracle unavailable, using fallback gas price");
				self.policy.fallback()
			},
		}
	}

	/// Raise the transaction's fee fields to `minimum`. Returns whether anything changed.
	///
	/// Only fields the quote already carries are touched; absent fields are
	/// left for the wallet to estimate.
	pub fn escalate(&self, tx: &mut TransactionParams, minimum: &GasPrice) -> bool {
		let priority = bump(
			&mut tx.max_priority_fee_per_gas,
			minimum.max_priority_fee_per_gas,
		);
		let max_fee = bump(&mut tx.max_fee_per_gas, minimum.max_fee_per_gas);
		priority || max_fee
	}

	/// Escalate every transaction in the quote, querying each chain once.
	/// Returns how many transactions were rewritten.
	pub async fn escalate_quote(&self, quote: &mut UnifiedQuote) -> usize {
		let mut minimums: HashMap<ChainId, GasPrice> = HashMap::new();
		for chain_id in quote.transactions().map(|tx| tx.chain_id) {
			if !minimums.contains_key(&chain_id) {
				let price = self.min_gas_price(chain_id).await;
				minimums.insert(chain_id, price);
			}
		}

		let mut bumped = 0;
		for tx in quote.transactions_mut() {
			if let Some(minimum) = minimums.get(&tx.chain_id) {
				if self.escalate(tx, minimum) {
					bumped += 1;
				}
			}
		}
		if bumped > 0 {
			debug!(provider = %quote.provider, bumped, "Raised stale gas prices on quote");
		}
		bumped
	}
}

fn bump(field: &mut Option<U256>, minimum: u128) -> bool {
	let Some(current) = field.as_ref() else {
		return false;
	};
	match current.as_u128() {
		Ok(value) if value >= minimum => false,
		Ok(_) => {
			*field = Some(U256::from(minimum));
			true
		},
		// Valid digits that overflow u128 are above any minimum
		Err(_) if current.validate().is_ok() => false,
		Err(_) => {
			warn!(value = %current, "Unreadable gas field, replacing with minimum");
			*field = Some(U256::from(minimum));
			true
		},
	}
}
