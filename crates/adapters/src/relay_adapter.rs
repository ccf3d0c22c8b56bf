//! Relay adapter
//!
//! Talks to Relay's REST API: `POST /price` for indicative pricing,
//! `POST /quote` for executable steps and `GET /intents/status/v2` for
//! completion tracking.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_types::{
	AdapterError, AdapterResult, BridgeAdapter, BridgeParams, ChainId, CurrencyAmount,
	ExecutionRequest, ExecutionResult, FeeAmount, OperationKind, Provider, ProviderConfig,
	QuoteDetails, QuoteFees, QuoteStep, StatusReport, StepItem, TransactionParams, UnifiedQuote,
	U256,
};
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client_cache::{AuthConfig, ClientCache};
use crate::execution::{submit_quote, track_to_completion};
use crate::http::{build_url, parse_json, read_body};
use crate::normalizer::{Normalizer, ProviderParams};
use crate::quote_cache::{QuoteCache, QuoteCacheKey};
use crate::status_poller::{StatusFetcher, StatusPoller};
use crate::AdapterContext;

/// Relay error codes that mean "no route" rather than a failure
const NO_ROUTE_ERROR_CODES: &[&str] = &[
	"NO_SWAP_ROUTES_FOUND",
	"NO_INTERNAL_SWAP_ROUTES_FOUND",
	"NO_QUOTES",
	"UNSUPPORTED_ROUTE",
	"UNSUPPORTED_CURRENCY",
	"AMOUNT_TOO_LOW",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayQuoteRequest<'a> {
	user: &'a str,
	recipient: &'a str,
	origin_chain_id: ChainId,
	destination_chain_id: ChainId,
	origin_currency: &'a str,
	destination_currency: &'a str,
	amount: &'a U256,
	trade_type: &'static str,
}

impl<'a> From<&'a ProviderParams> for RelayQuoteRequest<'a> {
	fn from(params: &'a ProviderParams) -> Self {
		Self {
			user: &params.sender,
			recipient: &params.recipient,
			origin_chain_id: params.from_chain_id,
			destination_chain_id: params.to_chain_id,
			origin_currency: &params.from_token,
			destination_currency: &params.to_token,
			amount: &params.amount,
			trade_type: "EXACT_INPUT",
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayErrorBody {
	message: Option<String>,
	error_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayQuoteResponse {
	#[serde(default)]
	steps: Vec<RelayStep>,
	#[serde(default)]
	fees: RelayFees,
	details: Option<RelayDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayStep {
	id: String,
	description: Option<String>,
	request_id: Option<String>,
	#[serde(default)]
	items: Vec<RelayStepItem>,
}

#[derive(Debug, Deserialize)]
struct RelayStepItem {
	data: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RelayFees {
	gas: Option<RelayFee>,
	relayer: Option<RelayFee>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayFee {
	currency: Option<RelayCurrency>,
	amount: Option<U256>,
	amount_usd: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayCurrency {
	chain_id: ChainId,
	address: String,
	symbol: Option<String>,
	decimals: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayCurrencyAmount {
	currency: RelayCurrency,
	amount: U256,
	amount_usd: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayDetails {
	currency_in: RelayCurrencyAmount,
	currency_out: RelayCurrencyAmount,
	recipient: Option<String>,
	time_estimate: Option<u64>,
}

impl From<RelayCurrencyAmount> for CurrencyAmount {
	fn from(value: RelayCurrencyAmount) -> Self {
		Self {
			chain_id: value.currency.chain_id,
			address: value.currency.address,
			symbol: value.currency.symbol,
			decimals: value.currency.decimals,
			amount: value.amount,
			amount_usd: value.amount_usd,
		}
	}
}

impl From<RelayFee> for FeeAmount {
	fn from(fee: RelayFee) -> Self {
		Self {
			amount: fee.amount.unwrap_or_default(),
			currency: fee.currency.and_then(|c| c.symbol),
			amount_usd: fee.amount_usd,
		}
	}
}

/// True when a Relay error response means there is simply no route
fn is_no_route_error(status_code: u16, body: &str) -> bool {
	if !(400..500).contains(&status_code) {
		return false;
	}
	match serde_json::from_str::<RelayErrorBody>(body) {
		Ok(error) => {
			error
				.error_code
				.as_deref()
				.is_some_and(|code| NO_ROUTE_ERROR_CODES.contains(&code))
				|| error
					.message
					.as_deref()
					.is_some_and(|m| m.to_ascii_lowercase().contains("no routes"))
		},
		Err(_) => false,
	}
}

fn into_unified_quote(
	raw: serde_json::Value,
	include_steps: bool,
) -> AdapterResult<Option<UnifiedQuote>> {
	let response: RelayQuoteResponse =
		serde_json::from_value(raw.clone()).map_err(|e| AdapterError::InvalidResponse {
			reason: format!("failed to parse Relay quote: {}", e),
		})?;

	let Some(details) = response.details else {
		return Ok(None);
	};

	let steps = if include_steps {
		response
			.steps
			.into_iter()
			.map(|step| {
				let items = step
					.items
					.into_iter()
					.filter_map(|item| item.data)
					.map(|data| {
						serde_json::from_value::<TransactionParams>(data)
							.map(|data| StepItem { data })
							.map_err(|e| AdapterError::InvalidResponse {
								reason: format!("unsupported Relay transaction payload: {}", e),
							})
					})
					.collect::<AdapterResult<Vec<_>>>()?;
				Ok(QuoteStep {
					id: step.id,
					description: step.description,
					request_id: step.request_id,
					items,
				})
			})
			.collect::<AdapterResult<Vec<_>>>()?
	} else {
		Vec::new()
	};

	let recipient = details.recipient.unwrap_or_default();
	Ok(Some(UnifiedQuote {
		provider: Provider::Relay,
		details: QuoteDetails {
			currency_in: details.currency_in.into(),
			currency_out: details.currency_out.into(),
			recipient,
			time_estimate: details.time_estimate,
		},
		fees: QuoteFees {
			gas: response.fees.gas.map(Into::into),
			relayer: response.fees.relayer.map(Into::into),
		},
		steps,
		metadata: Some(raw),
	}))
}

/// HTTP side of the adapter; owned by the adapter and cloned into cached fetches
#[derive(Debug)]
struct RelayApi {
	config: ProviderConfig,
	client_cache: ClientCache,
	normalizer: Normalizer,
}

impl RelayApi {
	fn client(&self) -> AdapterResult<Arc<Client>> {
		self.client_cache
			.get_client_with_auth(&self.config, &AuthConfig::from_provider(&self.config))
	}

	async fn request_quote(
		&self,
		path: &str,
		params: &BridgeParams,
		include_steps: bool,
	) -> AdapterResult<Option<UnifiedQuote>> {
		let provider_params = self.normalizer.normalize(params);
		let url = build_url(&self.config.endpoint, path)?;
		debug!(
			provider = "relay",
			path,
			origin = provider_params.from_chain_id,
			destination = provider_params.to_chain_id,
			"Requesting Relay {}",
			path
		);

		let response = self
			.client()?
			.post(url)
			.json(&RelayQuoteRequest::from(&provider_params))
			.send()
			.await?;

		let body = match read_body(response).await {
			Ok(body) => body,
			Err(AdapterError::HttpStatusError {
				status_code,
				reason,
			}) if is_no_route_error(status_code, &reason) => {
				debug!(provider = "relay", status_code, "Relay has no route: {}", reason);
				return Ok(None);
			},
			Err(e) => return Err(e),
		};

		let raw: serde_json::Value = parse_json(&body, "Relay quote")?;
		let mut quote = into_unified_quote(raw, include_steps)?;
		if let Some(quote) = quote.as_mut() {
			self.normalizer.restore_quote(quote, params);
		}
		Ok(quote)
	}
}

#[async_trait]
impl StatusFetcher for RelayApi {
	async fn fetch_status(&self, request_id: &str) -> AdapterResult<StatusReport> {
		let url = build_url(&self.config.endpoint, "intents/status/v2")?;
		let response = self
			.client()?
			.get(url)
			.query(&[("requestId", request_id)])
			.send()
			.await?;
		let body = read_body(response).await?;
		parse_json(&body, "Relay status")
	}
}

/// Adapter for the Relay bridge
#[derive(Debug)]
pub struct RelayAdapter {
	api: Arc<RelayApi>,
	quote_cache: QuoteCache,
	poller: StatusPoller,
	user_operation_timeout: Duration,
}

impl RelayAdapter {
	pub fn new(config: ProviderConfig, context: &AdapterContext) -> AdapterResult<Self> {
		if config.provider != Provider::Relay {
			return Err(AdapterError::ConfigError {
				reason: format!("Relay adapter cannot serve {} config", config.provider),
			});
		}
		Ok(Self {
			api: Arc::new(RelayApi {
				normalizer: Normalizer::new(Provider::Relay, &context.normalization),
				client_cache: context.client_cache.clone(),
				config,
			}),
			quote_cache: context.quote_cache.clone(),
			poller: context.poller.clone(),
			user_operation_timeout: context.user_operation_timeout,
		})
	}

	async fn cached_request(
		&self,
		operation: OperationKind,
		params: &BridgeParams,
	) -> AdapterResult<Option<UnifiedQuote>> {
		let key = QuoteCacheKey::new(Provider::Relay, operation, params);
		let api = self.api.clone();
		let params = params.clone();
		self.quote_cache
			.get_or_fetch(key, move || {
				async move {
					match operation {
						OperationKind::Price => api.request_quote("price", &params, false).await,
						_ => api.request_quote("quote", &params, true).await,
					}
				}
				.boxed()
			})
			.await
	}
}

#[async_trait]
impl BridgeAdapter for RelayAdapter {
	fn provider(&self) -> Provider {
		Provider::Relay
	}

	fn config(&self) -> &ProviderConfig {
		&self.api.config
	}

	async fn get_price(&self, params: &BridgeParams) -> AdapterResult<Option<UnifiedQuote>> {
		self.cached_request(OperationKind::Price, params).await
	}

	async fn get_quote(&self, params: &BridgeParams) -> AdapterResult<Option<UnifiedQuote>> {
		self.cached_request(OperationKind::Quote, params).await
	}

	async fn execute(
		&self,
		quote: &UnifiedQuote,
		request: ExecutionRequest,
	) -> AdapterResult<ExecutionResult> {
		if quote.provider != Provider::Relay {
			return Err(AdapterError::ProviderMismatch {
				provider: Provider::Relay,
				quote_provider: quote.provider,
			});
		}
		let request_id = quote
			.request_id()
			.map(str::to_string)
			.ok_or_else(|| AdapterError::ExecutionFailed {
				reason: "Relay quote carries no request id".to_string(),
			})?;

		let submission =
			submit_quote(Provider::Relay, quote, &request, self.user_operation_timeout).await?;

		track_to_completion(
			&self.poller,
			self.api.as_ref(),
			&request_id,
			Provider::Relay,
			Some(request_id.clone()),
			submission,
			&request,
		)
		.await
	}

	async fn is_healthy(&self) -> bool {
		if !self.api.config.enabled {
			return false;
		}
		let probe = async {
			let url = build_url(&self.api.config.endpoint, "chains")?;
			let response = self.api.client()?.get(url).send().await?;
			Ok::<bool, AdapterError>(response.status().is_success())
		};
		match probe.await {
			Ok(healthy) => healthy,
			Err(e) => {
				warn!(provider = "relay", error = %e, "Relay health probe failed");
				false
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::quote_cache::QuoteCacheConfig;
	use crate::status_poller::PollOptions;
	use bridge_types::chain::{BASE, HYPERLIQUID, POLYGON, SOLANA};
	use bridge_types::normalization::{RELAY_HYPERLIQUID_USDC, RELAY_SOLANA_CHAIN_ID};
	use bridge_types::test_utils::{BridgeParamsBuilder, RecordingWallet, TEST_USDC_BASE};
	use bridge_types::{
		BridgeStatus, ErrorCategory, ProgressEvent, ProgressReporter, ProviderCapabilities,
		SupportedChains, WalletClient,
	};
	use httpmock::prelude::*;
	use serde_json::json;

	fn context() -> AdapterContext {
		AdapterContext {
			client_cache: ClientCache::new(),
			quote_cache: QuoteCache::new(QuoteCacheConfig::default()),
			poller: StatusPoller::new(PollOptions {
				max_attempts: 5,
				interval: Duration::from_millis(10),
				backoff_multiplier: 1.0,
				max_interval: Duration::from_millis(10),
			}),
			..AdapterContext::default()
		}
	}

	fn adapter(server: &MockServer) -> RelayAdapter {
		let config = ProviderConfig::new(Provider::Relay, 1, server.base_url())
			.with_chains(SupportedChains::symmetric(vec![BASE, POLYGON, HYPERLIQUID, SOLANA]))
			.with_capabilities(ProviderCapabilities {
				special_chains: vec![HYPERLIQUID, SOLANA],
				..Default::default()
			});
		RelayAdapter::new(config, &context()).unwrap()
	}

	fn quote_body(origin: ChainId, destination: ChainId, with_tx: bool) -> serde_json::Value {
		let items = if with_tx {
			json!([{
				"status": "incomplete",
				"data": {
					"from": "0x742d35Cc6634C0532925a3b8D38BA2297C33A9D7",
					"to": "0xa5F565650890fBA1824Ee0F21EbBbF660a179934",
					"data": "0xdeadbeef",
					"value": "0",
					"chainId": origin,
					"maxFeePerGas": "1000000000",
					"maxPriorityFeePerGas": "100000000"
				}
			}])
		} else {
			json!([])
		};
		json!({
			"steps": [{
				"id": "deposit",
				"action": "Confirm transaction in your wallet",
				"description": "Depositing funds to the relayer",
				"kind": "transaction",
				"requestId": "0xrelayrequest",
				"items": items
			}],
			"fees": {
				"gas": { "currency": { "chainId": origin, "address": "0x0000000000000000000000000000000000000000", "symbol": "ETH", "decimals": 18 }, "amount": "21000000000000", "amountUsd": "0.05" },
				"relayer": { "currency": { "chainId": origin, "address": TEST_USDC_BASE, "symbol": "USDC", "decimals": 6 }, "amount": "10000", "amountUsd": "0.01" }
			},
			"details": {
				"currencyIn": { "currency": { "chainId": origin, "address": TEST_USDC_BASE, "symbol": "USDC", "decimals": 6 }, "amount": "1000000", "amountUsd": "1.00" },
				"currencyOut": { "currency": { "chainId": destination, "address": "0xout", "symbol": "USDC", "decimals": 6 }, "amount": "990000", "amountUsd": "0.99" },
				"recipient": "0x742d35Cc6634C0532925a3b8D38BA2297C33A9D7",
				"timeEstimate": 12
			}
		})
	}

	#[tokio::test]
	async fn test_get_price_normalizes_and_parses() {
		let server = MockServer::start_async().await;
		let price_mock = server.mock(|when, then| {
			when.method(POST).path("/price").json_body_partial(
				json!({
					"originChainId": BASE,
					"destinationChainId": POLYGON,
					"amount": "1000000",
					"tradeType": "EXACT_INPUT"
				})
				.to_string(),
			);
			then.status(200).json_body(quote_body(BASE, POLYGON, false));
		});

		let params = BridgeParamsBuilder::new().build();
		let quote = adapter(&server).get_price(&params).await.unwrap().unwrap();

		price_mock.assert();
		assert_eq!(quote.provider, Provider::Relay);
		assert_eq!(quote.details.currency_out.amount, U256::from(990_000u64));
		assert_eq!(quote.details.time_estimate, Some(12));
		assert_eq!(
			quote.fees.relayer.as_ref().and_then(|f| f.currency.clone()),
			Some("USDC".to_string())
		);
		assert!(quote.steps.is_empty());
	}

	#[tokio::test]
	async fn test_identical_price_requests_hit_backend_once() {
		let server = MockServer::start_async().await;
		let price_mock = server.mock(|when, then| {
			when.method(POST).path("/price");
			then.status(200).json_body(quote_body(BASE, POLYGON, false));
		});

		let adapter = adapter(&server);
		let params = BridgeParamsBuilder::new().build();
		let (a, b) = tokio::join!(adapter.get_price(&params), adapter.get_price(&params));
		assert_eq!(a.unwrap(), b.unwrap());
		adapter.get_price(&params).await.unwrap();

		price_mock.assert_hits(1);
	}

	#[tokio::test]
	async fn test_no_route_error_code_is_soft_failure() {
		let server = MockServer::start_async().await;
		server.mock(|when, then| {
			when.method(POST).path("/quote");
			then.status(400).json_body(json!({
				"message": "No routes found",
				"errorCode": "NO_SWAP_ROUTES_FOUND"
			}));
		});

		let params = BridgeParamsBuilder::new().build();
		assert!(adapter(&server).get_quote(&params).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_server_error_is_network_category() {
		let server = MockServer::start_async().await;
		server.mock(|when, then| {
			when.method(POST).path("/quote");
			then.status(503).body("Service Unavailable");
		});

		let params = BridgeParamsBuilder::new().build();
		let err = adapter(&server).get_quote(&params).await.unwrap_err();
		assert_eq!(err.category(), ErrorCategory::NetworkError);
	}

	#[tokio::test]
	async fn test_special_chains_are_remapped_both_ways() {
		let server = MockServer::start_async().await;
		let quote_mock = server.mock(|when, then| {
			when.method(POST).path("/quote").json_body_partial(
				json!({
					"destinationChainId": RELAY_SOLANA_CHAIN_ID,
				})
				.to_string(),
			);
			then.status(200)
				.json_body(quote_body(BASE, RELAY_SOLANA_CHAIN_ID, true));
		});
		let hyperliquid_mock = server.mock(|when, then| {
			when.method(POST).path("/quote").json_body_partial(
				json!({
					"destinationChainId": HYPERLIQUID,
					"destinationCurrency": RELAY_HYPERLIQUID_USDC,
				})
				.to_string(),
			);
			then.status(200).json_body(quote_body(BASE, HYPERLIQUID, true));
		});

		let adapter = adapter(&server);
		let to_solana = BridgeParamsBuilder::new().route(BASE, SOLANA).build();
		let quote = adapter.get_quote(&to_solana).await.unwrap().unwrap();
		assert_eq!(quote.details.currency_out.chain_id, SOLANA);
		assert_eq!(quote.request_id(), Some("0xrelayrequest"));
		assert_eq!(quote.transactions().count(), 1);

		let to_hyperliquid = BridgeParamsBuilder::new().route(BASE, HYPERLIQUID).build();
		adapter.get_quote(&to_hyperliquid).await.unwrap().unwrap();

		quote_mock.assert();
		hyperliquid_mock.assert();
	}

	#[tokio::test]
	async fn test_execute_submits_and_polls_to_success() {
		let server = MockServer::start_async().await;
		server.mock(|when, then| {
			when.method(POST).path("/quote");
			then.status(200).json_body(quote_body(BASE, POLYGON, true));
		});
		let status_mock = server.mock(|when, then| {
			when.method(GET)
				.path("/intents/status/v2")
				.query_param("requestId", "0xrelayrequest");
			then.status(200).json_body(json!({
				"status": "success",
				"inTxHashes": ["0xin"],
				"txHashes": ["0xdestination"],
				"originChainId": BASE,
				"destinationChainId": POLYGON
			}));
		});

		let adapter = adapter(&server);
		let params = BridgeParamsBuilder::new().build();
		let quote = adapter.get_quote(&params).await.unwrap().unwrap();

		let wallet = Arc::new(RecordingWallet::eoa());
		let (progress, mut events) = ProgressReporter::channel();
		let result = adapter
			.execute(&quote, ExecutionRequest::new(wallet.clone(), progress))
			.await
			.unwrap();

		status_mock.assert();
		assert_eq!(result.status, BridgeStatus::Success);
		assert_eq!(result.request_id.as_deref(), Some("0xrelayrequest"));
		assert_eq!(result.destination_tx_hashes, vec!["0xdestination".to_string()]);
		assert_eq!(wallet.sent_transactions().len(), 1);
		assert_eq!(
			wallet.sent_transactions()[0].from.as_deref(),
			Some("0x742d35Cc6634C0532925a3b8D38BA2297C33A9D7")
		);
		assert_eq!(wallet.address(), "0x742d35Cc6634C0532925a3b8D38BA2297C33A9D7");

		assert!(matches!(
			events.recv().await,
			Some(ProgressEvent::TransactionSubmitted { .. })
		));
		assert!(matches!(
			events.recv().await,
			Some(ProgressEvent::Completed { .. })
		));
	}

	#[tokio::test]
	async fn test_execute_rejects_foreign_quote() {
		let server = MockServer::start_async().await;
		let params = BridgeParamsBuilder::new().build();
		let quote = bridge_types::test_utils::QuoteBuilder::new(Provider::Bungee, &params).build();

		let err = adapter(&server)
			.execute(
				&quote,
				ExecutionRequest::new(Arc::new(RecordingWallet::eoa()), ProgressReporter::disabled()),
			)
			.await
			.unwrap_err();
		assert!(matches!(err, AdapterError::ProviderMismatch { .. }));
	}

	#[tokio::test]
	async fn test_health_check_reaches_endpoint() {
		let server = MockServer::start_async().await;
		server.mock(|when, then| {
			when.method(GET).path("/chains");
			then.status(200).json_body(json!({ "chains": [] }));
		});
		assert!(adapter(&server).is_healthy().await);

		let disabled = RelayAdapter::new(
			ProviderConfig::new(Provider::Relay, 1, server.base_url()).disabled(),
			&context(),
		)
		.unwrap();
		assert!(!disabled.is_healthy().await);
	}

	#[test]
	fn test_no_route_detection() {
		assert!(is_no_route_error(
			400,
			r#"{"message":"x","errorCode":"AMOUNT_TOO_LOW"}"#
		));
		assert!(is_no_route_error(400, r#"{"message":"No routes available"}"#));
		assert!(!is_no_route_error(400, r#"{"message":"Invalid address"}"#));
		assert!(!is_no_route_error(500, r#"{"errorCode":"NO_QUOTES"}"#));
	}
}
