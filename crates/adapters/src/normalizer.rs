//! Chain id and token address translation between the engine and a provider

use bridge_types::chain::{is_native_token, ChainId};
use bridge_types::normalization::{
	ChainOverride, DestinationTokenOverride, NativeTokenOverride, NormalizationRules,
};
use bridge_types::{BridgeParams, CurrencyAmount, Provider, UnifiedQuote, U256};

/// Request parameters expressed in the provider's ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderParams {
	pub from_chain_id: ChainId,
	pub to_chain_id: ChainId,
	pub from_token: String,
	pub to_token: String,
	pub amount: U256,
	pub sender: String,
	pub recipient: String,
}

/// Rules of a single provider
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
	chains: Vec<ChainOverride>,
	native_tokens: Vec<NativeTokenOverride>,
	destination_tokens: Vec<DestinationTokenOverride>,
}

impl Normalizer {
	pub fn new(provider: Provider, rules: &NormalizationRules) -> Self {
		Self {
			chains: rules
				.chain_overrides
				.iter()
				.filter(|rule| rule.provider == provider)
				.cloned()
				.collect(),
			native_tokens: rules
				.native_token_overrides
				.iter()
				.filter(|rule| rule.provider == provider)
				.cloned()
				.collect(),
			destination_tokens: rules
				.destination_token_overrides
				.iter()
				.filter(|rule| rule.provider == provider)
				.cloned()
				.collect(),
		}
	}

	pub fn to_provider_chain(&self, chain_id: ChainId) -> ChainId {
		self.chains
			.iter()
			.find(|rule| rule.chain_id == chain_id)
			.map_or(chain_id, |rule| rule.provider_chain_id)
	}

	pub fn from_provider_chain(&self, chain_id: ChainId) -> ChainId {
		self.chains
			.iter()
			.find(|rule| rule.provider_chain_id == chain_id)
			.map_or(chain_id, |rule| rule.chain_id)
	}

	/// Native token placeholder substitution, on the internal chain id
	pub fn to_provider_token(&self, chain_id: ChainId, address: &str) -> String {
		if !is_native_token(address) {
			return address.to_string();
		}
		self.native_tokens
			.iter()
			.find(|rule| rule.chain_id.map_or(true, |c| c == chain_id))
			.map_or_else(|| address.to_string(), |rule| rule.address.clone())
	}

	fn destination_token(&self, chain_id: ChainId, address: &str) -> String {
		match self
			.destination_tokens
			.iter()
			.find(|rule| rule.chain_id == chain_id)
		{
			Some(rule) => rule.address.clone(),
			None => self.to_provider_token(chain_id, address),
		}
	}

	pub fn normalize(&self, params: &BridgeParams) -> ProviderParams {
		ProviderParams {
			from_chain_id: self.to_provider_chain(params.from_chain_id),
			to_chain_id: self.to_provider_chain(params.to_chain_id),
			from_token: self.to_provider_token(params.from_chain_id, &params.from_token),
			to_token: self.destination_token(params.to_chain_id, &params.to_token),
			amount: params.amount.clone(),
			sender: params.sender.clone(),
			recipient: params.recipient.clone(),
		}
	}

	/// Map a provider quote back onto the caller's ids and addresses
	pub fn restore_quote(&self, quote: &mut UnifiedQuote, params: &BridgeParams) {
		let normalized = self.normalize(params);
		self.restore_currency(
			&mut quote.details.currency_in,
			&normalized.from_token,
			&params.from_token,
		);
		self.restore_currency(
			&mut quote.details.currency_out,
			&normalized.to_token,
			&params.to_token,
		);
		for tx in quote.transactions_mut() {
			tx.chain_id = self.from_provider_chain(tx.chain_id);
		}
	}

	fn restore_currency(&self, currency: &mut CurrencyAmount, provider_token: &str, token: &str) {
		currency.chain_id = self.from_provider_chain(currency.chain_id);
		if currency.address.eq_ignore_ascii_case(provider_token) {
			currency.address = token.to_string();
		}
	}
}
