//! Bridge request parameters and the provider-independent quote shape

use serde::{Deserialize, Serialize};

use crate::chain::ChainId;
use crate::models::U256;
use crate::provider::Provider;

/// Parameters of one bridge transfer, in the engine's own chain/token ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeParams {
	pub from_chain_id: ChainId,
	pub to_chain_id: ChainId,
	/// Token address on the origin chain
	pub from_token: String,
	/// Token address on the destination chain
	pub to_token: String,
	/// Input amount in the origin token's smallest unit
	pub amount: U256,
	/// Wallet paying on the origin chain
	pub sender: String,
	/// Address receiving funds on the destination chain
	pub recipient: String,
}

impl BridgeParams {
	pub fn route(&self) -> (ChainId, ChainId) {
		(self.from_chain_id, self.to_chain_id)
	}

	/// Basic shape checks done before any provider is contacted
	pub fn validate(&self) -> Result<(), String> {
		self.amount.validate()?;
		if self.amount.is_zero() {
			return Err("amount must be greater than zero".to_string());
		}
		if self.from_token.is_empty() || self.to_token.is_empty() {
			return Err("token addresses are required".to_string());
		}
		if self.sender.is_empty() || self.recipient.is_empty() {
			return Err("sender and recipient are required".to_string());
		}
		Ok(())
	}
}

/// Amount of a currency with enough metadata to display it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyAmount {
	pub chain_id: ChainId,
	pub address: String,
	pub symbol: Option<String>,
	pub decimals: Option<u8>,
	pub amount: U256,
	pub amount_usd: Option<String>,
}

/// Human-facing summary of a quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDetails {
	pub currency_in: CurrencyAmount,
	pub currency_out: CurrencyAmount,
	pub recipient: String,
	/// Estimated seconds until funds arrive
	pub time_estimate: Option<u64>,
}

/// A single fee component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeAmount {
	pub amount: U256,
	pub currency: Option<String>,
	pub amount_usd: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteFees {
	pub gas: Option<FeeAmount>,
	pub relayer: Option<FeeAmount>,
}

/// Everything needed to send one transaction, whatever backend produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParams {
	pub chain_id: ChainId,
	pub from: Option<String>,
	pub to: String,
	#[serde(default)]
	pub data: String,
	#[serde(default)]
	pub value: U256,
	pub gas: Option<U256>,
	pub max_fee_per_gas: Option<U256>,
	pub max_priority_fee_per_gas: Option<U256>,
}

impl TransactionParams {
	pub fn new(chain_id: ChainId, to: impl Into<String>, data: impl Into<String>) -> Self {
		Self {
			chain_id,
			from: None,
			to: to.into(),
			data: data.into(),
			value: U256::zero(),
			gas: None,
			max_fee_per_gas: None,
			max_priority_fee_per_gas: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepItem {
	pub data: TransactionParams,
}

/// One logical step (e.g. approve, deposit), possibly several transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStep {
	pub id: String,
	pub description: Option<String>,
	/// Provider id used to poll completion of this step
	pub request_id: Option<String>,
	pub items: Vec<StepItem>,
}

/// Normalized quote returned by every adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedQuote {
	pub provider: Provider,
	pub details: QuoteDetails,
	pub fees: QuoteFees,
	/// Empty for indicative prices
	pub steps: Vec<QuoteStep>,
	/// Raw provider payload kept for diagnostics
	pub metadata: Option<serde_json::Value>,
}

impl UnifiedQuote {
	/// Whether the quote carries transactions that can be executed
	pub fn is_executable(&self) -> bool {
		self.steps.iter().any(|step| !step.items.is_empty())
	}

	/// All transactions in submission order
	pub fn transactions(&self) -> impl Iterator<Item = &TransactionParams> {
		self.steps
			.iter()
			.flat_map(|step| step.items.iter().map(|item| &item.data))
	}

	pub fn transactions_mut(&mut self) -> impl Iterator<Item = &mut TransactionParams> {
		self.steps
			.iter_mut()
			.flat_map(|step| step.items.iter_mut().map(|item| &mut item.data))
	}

	/// The provider's tracking id, taken from the last step that has one
	pub fn request_id(&self) -> Option<&str> {
		self.steps
			.iter()
			.rev()
			.find_map(|step| step.request_id.as_deref())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::chain::{BASE, POLYGON};

	fn quote_with_steps(steps: Vec<QuoteStep>) -> UnifiedQuote {
		let currency = |chain_id| CurrencyAmount {
			chain_id,
			address: "0xtoken".to_string(),
			symbol: Some("USDC".to_string()),
			decimals: Some(6),
			amount: U256::from(1_000_000u64),
			amount_usd: None,
		};
		UnifiedQuote {
			provider: Provider::Relay,
			details: QuoteDetails {
				currency_in: currency(BASE),
				currency_out: currency(POLYGON),
				recipient: "0xrecipient".to_string(),
				time_estimate: Some(30),
			},
			fees: QuoteFees::default(),
			steps,
			metadata: None,
		}
	}

	#[test]
	fn test_transactions_flatten_in_order() {
		let step = |id: &str, to: &[&str], request_id: Option<&str>| QuoteStep {
			id: id.to_string(),
			description: None,
			request_id: request_id.map(str::to_string),
			items: to
				.iter()
				.map(|to| StepItem {
					data: TransactionParams::new(BASE, *to, "0x"),
				})
				.collect(),
		};
		let quote = quote_with_steps(vec![
			step("approve", &["0xa"], None),
			step("deposit", &["0xb", "0xc"], Some("0xrequest")),
		]);

		let targets: Vec<_> = quote.transactions().map(|tx| tx.to.as_str()).collect();
		assert_eq!(targets, vec!["0xa", "0xb", "0xc"]);
		assert_eq!(quote.request_id(), Some("0xrequest"));
		assert!(quote.is_executable());
		assert!(!quote_with_steps(vec![]).is_executable());
	}

	#[test]
	fn test_params_validation() {
		let mut params = BridgeParams {
			from_chain_id: BASE,
			to_chain_id: POLYGON,
			from_token: "0xa".to_string(),
			to_token: "0xb".to_string(),
			amount: U256::from(10u64),
			sender: "0xsender".to_string(),
			recipient: "0xrecipient".to_string(),
		};
		assert!(params.validate().is_ok());

		params.amount = U256::zero();
		assert!(params.validate().is_err());
	}
}
