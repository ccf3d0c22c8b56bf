//! Bungee (Socket) adapter
//!
//! Uses the Socket v2 REST API. `GET /quote` ranks routes, `POST /build-tx`
//! turns the chosen route into calldata, and `GET /bridge-status` tracks
//! the bridge by its origin transaction hash.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_types::{
	AdapterError, AdapterResult, BridgeAdapter, BridgeParams, BridgeStatus, ChainId,
	CurrencyAmount, ExecutionRequest, ExecutionResult, FeeAmount, OperationKind, Provider,
	ProviderConfig, QuoteDetails, QuoteFees, QuoteStep, StatusReport, StepItem,
	TransactionParams, UnifiedQuote, U256,
};
use futures::FutureExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client_cache::{AuthConfig, ClientCache};
use crate::execution::{submit_quote, track_to_completion};
use crate::http::{build_url, parse_json, read_body};
use crate::normalizer::Normalizer;
use crate::quote_cache::{QuoteCache, QuoteCacheKey};
use crate::status_poller::{StatusFetcher, StatusPoller};
use crate::AdapterContext;

/// `approve(address,uint256)` selector
const ERC20_APPROVE_SELECTOR: &str = "0x095ea7b3";

/// Socket wraps every payload in the same envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
	success: bool,
	result: Option<T>,
	message: Option<String>,
}

impl<T: DeserializeOwned> Envelope<T> {
	fn parse(body: &str, context: &str) -> AdapterResult<T> {
		let envelope: Envelope<T> = parse_json(body, context)?;
		match envelope {
			Envelope {
				success: true,
				result: Some(result),
				..
			} => Ok(result),
			Envelope { message, .. } => Err(AdapterError::InvalidResponse {
				reason: message.unwrap_or_else(|| format!("unsuccessful {} response", context)),
			}),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BungeeAsset {
	chain_id: ChainId,
	address: String,
	symbol: Option<String>,
	decimals: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResult {
	#[serde(default)]
	routes: Vec<serde_json::Value>,
	from_asset: Option<BungeeAsset>,
	to_asset: Option<BungeeAsset>,
}

/// Fields of a route the engine reads; the full route is kept as metadata
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteSummary {
	route_id: Option<String>,
	from_amount: U256,
	to_amount: U256,
	service_time: Option<u64>,
	input_value_in_usd: Option<f64>,
	output_value_in_usd: Option<f64>,
	total_gas_fees_in_usd: Option<f64>,
}

#[derive(Debug, Serialize)]
struct BuildTxRequest<'a> {
	route: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildTxResult {
	chain_id: ChainId,
	tx_target: String,
	tx_data: String,
	#[serde(default)]
	value: U256,
	approval_data: Option<ApprovalData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalData {
	minimum_approval_amount: U256,
	approval_token_address: String,
	allowance_target: String,
	owner: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BridgeStatusResult {
	source_tx_status: Option<String>,
	destination_tx_status: Option<String>,
	source_transaction_hash: Option<String>,
	destination_transaction_hash: Option<String>,
	from_chain_id: Option<ChainId>,
	to_chain_id: Option<ChainId>,
}

impl BridgeStatusResult {
	fn status(&self) -> BridgeStatus {
		if self
			.source_tx_status
			.as_deref()
			.is_some_and(|s| s.eq_ignore_ascii_case("FAILED"))
		{
			return BridgeStatus::Failure;
		}
		match self
			.destination_tx_status
			.as_deref()
			.map(str::to_ascii_uppercase)
			.as_deref()
		{
			Some("COMPLETED") => BridgeStatus::Success,
			Some("FAILED") => BridgeStatus::Failure,
			Some("REFUNDED") => BridgeStatus::Refund,
			Some("PENDING") => BridgeStatus::Pending,
			_ => BridgeStatus::Unknown,
		}
	}
}

impl From<BridgeStatusResult> for StatusReport {
	fn from(result: BridgeStatusResult) -> Self {
		Self {
			status: result.status(),
			in_tx_hashes: result.source_transaction_hash.into_iter().collect(),
			tx_hashes: result.destination_transaction_hash.into_iter().collect(),
			origin_chain_id: result.from_chain_id,
			destination_chain_id: result.to_chain_id,
		}
	}
}

fn usd(value: Option<f64>) -> Option<String> {
	value.map(|v| format!("{:.2}", v))
}

/// ERC-20 `approve(spender, amount)` calldata
fn approve_calldata(spender: &str, amount: &U256) -> AdapterResult<String> {
	let spender = spender.trim_start_matches("0x").to_ascii_lowercase();
	if spender.len() != 40 || !spender.chars().all(|c| c.is_ascii_hexdigit()) {
		return Err(AdapterError::InvalidResponse {
			reason: format!("invalid allowance target '{}'", spender),
		});
	}
	let amount = amount.as_u128().map_err(|e| AdapterError::InvalidResponse {
		reason: format!("invalid approval amount '{}': {}", amount, e),
	})?;
	Ok(format!(
		"{}{:0>64}{:064x}",
		ERC20_APPROVE_SELECTOR, spender, amount
	))
}

#[derive(Debug)]
struct BungeeApi {
	config: ProviderConfig,
	client_cache: ClientCache,
	normalizer: Normalizer,
}

impl BungeeApi {
	fn client(&self) -> AdapterResult<Arc<Client>> {
		self.client_cache
			.get_client_with_auth(&self.config, &AuthConfig::from_provider(&self.config))
	}

	/// Best route for `params`, or `None` when Socket has nothing
	async fn request_price(&self, params: &BridgeParams) -> AdapterResult<Option<UnifiedQuote>> {
		let provider_params = self.normalizer.normalize(params);
		let url = build_url(&self.config.endpoint, "quote")?;
		debug!(
			provider = "bungee",
			origin = provider_params.from_chain_id,
			destination = provider_params.to_chain_id,
			"Requesting Bungee quote"
		);

		let response = self
			.client()?
			.get(url)
			.query(&[
				("fromChainId", provider_params.from_chain_id.to_string()),
				("fromTokenAddress", provider_params.from_token.clone()),
				("toChainId", provider_params.to_chain_id.to_string()),
				("toTokenAddress", provider_params.to_token.clone()),
				("fromAmount", provider_params.amount.to_string()),
				("userAddress", provider_params.sender.clone()),
				("recipient", provider_params.recipient.clone()),
				("uniqueRoutesPerBridge", "true".to_string()),
				("sort", "output".to_string()),
				("singleTxOnly", "true".to_string()),
			])
			.send()
			.await?;
		let body = read_body(response).await?;
		let result: QuoteResult = Envelope::parse(&body, "Bungee quote")?;

		let Some(route) = result.routes.into_iter().next() else {
			debug!(provider = "bungee", "Bungee returned no routes");
			return Ok(None);
		};
		let summary: RouteSummary =
			serde_json::from_value(route.clone()).map_err(|e| AdapterError::InvalidResponse {
				reason: format!("failed to parse Bungee route: {}", e),
			})?;

		let currency = |asset: Option<BungeeAsset>,
		                chain_id: ChainId,
		                address: &str,
		                amount: U256,
		                amount_usd: Option<f64>| match asset {
			Some(asset) => CurrencyAmount {
				chain_id: asset.chain_id,
				address: asset.address,
				symbol: asset.symbol,
				decimals: asset.decimals,
				amount,
				amount_usd: usd(amount_usd),
			},
			None => CurrencyAmount {
				chain_id,
				address: address.to_string(),
				symbol: None,
				decimals: None,
				amount,
				amount_usd: usd(amount_usd),
			},
		};

		let mut quote = UnifiedQuote {
			provider: Provider::Bungee,
			details: QuoteDetails {
				currency_in: currency(
					result.from_asset,
					provider_params.from_chain_id,
					&provider_params.from_token,
					summary.from_amount,
					summary.input_value_in_usd,
				),
				currency_out: currency(
					result.to_asset,
					provider_params.to_chain_id,
					&provider_params.to_token,
					summary.to_amount,
					summary.output_value_in_usd,
				),
				recipient: params.recipient.clone(),
				time_estimate: summary.service_time,
			},
			fees: QuoteFees {
				gas: summary.total_gas_fees_in_usd.map(|fee| FeeAmount {
					amount: U256::zero(),
					currency: Some("USD".to_string()),
					amount_usd: usd(Some(fee)),
				}),
				relayer: None,
			},
			steps: Vec::new(),
			metadata: Some(route),
		};
		self.normalizer.restore_quote(&mut quote, params);
		debug!(provider = "bungee", route_id = ?summary.route_id, "Selected Bungee route");
		Ok(Some(quote))
	}

	/// Attach the transactions for a priced route
	async fn build_transactions(
		&self,
		mut quote: UnifiedQuote,
		params: &BridgeParams,
	) -> AdapterResult<UnifiedQuote> {
		let route = quote
			.metadata
			.as_ref()
			.ok_or_else(|| AdapterError::InvalidResponse {
				reason: "Bungee price carries no route".to_string(),
			})?;
		let url = build_url(&self.config.endpoint, "build-tx")?;
		let response = self
			.client()?
			.post(url)
			.json(&BuildTxRequest { route })
			.send()
			.await?;
		let body = read_body(response).await?;
		let built: BuildTxResult = Envelope::parse(&body, "Bungee build-tx")?;

		let mut steps = Vec::with_capacity(2);
		if let Some(approval) = built.approval_data {
			let mut approve = TransactionParams::new(
				built.chain_id,
				approval.approval_token_address,
				approve_calldata(&approval.allowance_target, &approval.minimum_approval_amount)?,
			);
			approve.from = approval.owner;
			steps.push(QuoteStep {
				id: "approve".to_string(),
				description: Some("Approve token spending".to_string()),
				request_id: None,
				items: vec![StepItem { data: approve }],
			});
		}

		let mut deposit = TransactionParams::new(built.chain_id, built.tx_target, built.tx_data);
		deposit.value = built.value;
		deposit.from = Some(params.sender.clone());
		steps.push(QuoteStep {
			id: "deposit".to_string(),
			description: Some("Bridge through Bungee".to_string()),
			request_id: None,
			items: vec![StepItem { data: deposit }],
		});

		quote.steps = steps;
		for tx in quote.transactions_mut() {
			tx.chain_id = self.normalizer.from_provider_chain(tx.chain_id);
		}
		Ok(quote)
	}

	async fn fetch_bridge_status(
		&self,
		transaction_hash: &str,
		from_chain_id: ChainId,
		to_chain_id: ChainId,
	) -> AdapterResult<StatusReport> {
		let url = build_url(&self.config.endpoint, "bridge-status")?;
		let response = self
			.client()?
			.get(url)
			.query(&[
				("transactionHash", transaction_hash.to_string()),
				("fromChainId", from_chain_id.to_string()),
				("toChainId", to_chain_id.to_string()),
			])
			.send()
			.await?;
		let body = read_body(response).await?;
		let result: BridgeStatusResult = Envelope::parse(&body, "Bungee bridge-status")?;
		Ok(result.into())
	}
}

/// Status lookups for one route; Socket needs both chain ids next to the hash
struct BungeeStatus<'a> {
	api: &'a BungeeApi,
	from_chain_id: ChainId,
	to_chain_id: ChainId,
}

#[async_trait]
impl StatusFetcher for BungeeStatus<'_> {
	async fn fetch_status(&self, request_id: &str) -> AdapterResult<StatusReport> {
		self.api
			.fetch_bridge_status(request_id, self.from_chain_id, self.to_chain_id)
			.await
	}
}

/// Adapter for the Bungee (Socket) aggregator
#[derive(Debug)]
pub struct BungeeAdapter {
	api: Arc<BungeeApi>,
	quote_cache: QuoteCache,
	poller: StatusPoller,
	user_operation_timeout: Duration,
}

impl BungeeAdapter {
	pub fn new(config: ProviderConfig, context: &AdapterContext) -> AdapterResult<Self> {
		if config.provider != Provider::Bungee {
			return Err(AdapterError::ConfigError {
				reason: format!("Bungee adapter cannot serve {} config", config.provider),
			});
		}
		if config.api_key.is_none() {
			warn!(provider = "bungee", "Bungee adapter has no API key configured");
		}
		Ok(Self {
			api: Arc::new(BungeeApi {
				normalizer: Normalizer::new(Provider::Bungee, &context.normalization),
				client_cache: context.client_cache.clone(),
				config,
			}),
			quote_cache: context.quote_cache.clone(),
			poller: context.poller.clone(),
			user_operation_timeout: context.user_operation_timeout,
		})
	}
}

#[async_trait]
impl BridgeAdapter for BungeeAdapter {
	fn provider(&self) -> Provider {
		Provider::Bungee
	}

	fn config(&self) -> &ProviderConfig {
		&self.api.config
	}

	async fn get_price(&self, params: &BridgeParams) -> AdapterResult<Option<UnifiedQuote>> {
		let key = QuoteCacheKey::new(Provider::Bungee, OperationKind::Price, params);
		let api = self.api.clone();
		let params = params.clone();
		self.quote_cache
			.get_or_fetch(key, move || {
				async move { api.request_price(&params).await }.boxed()
			})
			.await
	}

	async fn get_quote(&self, params: &BridgeParams) -> AdapterResult<Option<UnifiedQuote>> {
		let key = QuoteCacheKey::new(Provider::Bungee, OperationKind::Quote, params);
		let api = self.api.clone();
		let cache = self.quote_cache.clone();
		let params = params.clone();
		self.quote_cache
			.get_or_fetch(key, move || {
				async move {
					// Reuses an in-flight or cached price for the same request
					let price_key =
						QuoteCacheKey::new(Provider::Bungee, OperationKind::Price, &params);
					let price_api = api.clone();
					let price_params = params.clone();
					let price = cache
						.get_or_fetch(price_key, move || {
							async move { price_api.request_price(&price_params).await }.boxed()
						})
						.await?;
					match price {
						Some(price) => api.build_transactions(price, &params).await.map(Some),
						None => Ok(None),
					}
				}
				.boxed()
			})
			.await
	}

	async fn execute(
		&self,
		quote: &UnifiedQuote,
		request: ExecutionRequest,
	) -> AdapterResult<ExecutionResult> {
		if quote.provider != Provider::Bungee {
			return Err(AdapterError::ProviderMismatch {
				provider: Provider::Bungee,
				quote_provider: quote.provider,
			});
		}

		let submission =
			submit_quote(Provider::Bungee, quote, &request, self.user_operation_timeout).await?;
		let tracking_hash = submission
			.last_hash()
			.map(str::to_string)
			.ok_or_else(|| AdapterError::ExecutionFailed {
				reason: "no origin transaction hash to track".to_string(),
			})?;

		let normalizer = &self.api.normalizer;
		let fetcher = BungeeStatus {
			api: self.api.as_ref(),
			from_chain_id: normalizer.to_provider_chain(quote.details.currency_in.chain_id),
			to_chain_id: normalizer.to_provider_chain(quote.details.currency_out.chain_id),
		};

		track_to_completion(
			&self.poller,
			&fetcher,
			&tracking_hash,
			Provider::Bungee,
			Some(tracking_hash.clone()),
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
			let url = build_url(&self.api.config.endpoint, "supported/chains")?;
			let response = self.api.client()?.get(url).send().await?;
			Ok::<bool, AdapterError>(response.status().is_success())
		};
		match probe.await {
			Ok(healthy) => healthy,
			Err(e) => {
				warn!(provider = "bungee", error = %e, "Bungee health probe failed");
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
	use bridge_types::chain::{BASE, NATIVE_TOKEN_ADDRESS, POLYGON, SOLANA};
	use bridge_types::normalization::{BUNGEE_NATIVE_TOKEN_ADDRESS, BUNGEE_SOLANA_CHAIN_ID};
	use bridge_types::test_utils::{
		BridgeParamsBuilder, RecordingWallet, TEST_SENDER, TEST_USDC_BASE, TEST_USDC_POLYGON,
	};
	use bridge_types::{
		ErrorCategory, ProgressReporter, ProviderCapabilities, SecretString, SupportedChains,
	};
	use httpmock::prelude::*;
	use serde_json::json;

	const ALLOWANCE_TARGET: &str = "0x3a23F943181408EAC424116Af7b7790c94Cb97a5";

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

	fn adapter(server: &MockServer) -> BungeeAdapter {
		let config = ProviderConfig::new(Provider::Bungee, 2, server.base_url())
			.with_chains(SupportedChains::symmetric(vec![BASE, POLYGON, SOLANA]))
			.with_capabilities(ProviderCapabilities {
				special_chains: vec![SOLANA],
				..Default::default()
			})
			.with_api_key(SecretString::from("test-api-key"));
		BungeeAdapter::new(config, &context()).unwrap()
	}

	fn quote_body(from_chain: ChainId, to_chain: ChainId) -> serde_json::Value {
		json!({
			"success": true,
			"result": {
				"routes": [{
					"routeId": "route-1",
					"fromAmount": "1000000",
					"toAmount": "995000",
					"usedBridgeNames": ["cctp"],
					"serviceTime": 60,
					"inputValueInUsd": 1.0,
					"outputValueInUsd": 0.995,
					"totalGasFeesInUsd": 0.021,
					"userTxs": []
				}, {
					"routeId": "route-2",
					"fromAmount": "1000000",
					"toAmount": "990000"
				}],
				"fromAsset": { "chainId": from_chain, "address": TEST_USDC_BASE, "symbol": "USDC", "decimals": 6 },
				"toAsset": { "chainId": to_chain, "address": TEST_USDC_POLYGON, "symbol": "USDC", "decimals": 6 }
			}
		})
	}

	fn build_tx_body(with_approval: bool) -> serde_json::Value {
		let approval = if with_approval {
			json!({
				"minimumApprovalAmount": "1000000",
				"approvalTokenAddress": TEST_USDC_BASE,
				"allowanceTarget": ALLOWANCE_TARGET,
				"owner": TEST_SENDER
			})
		} else {
			serde_json::Value::Null
		};
		json!({
			"success": true,
			"result": {
				"userTxType": "fund-movr",
				"txType": "eth_sendTransaction",
				"txTarget": "0x3a23F943181408EAC424116Af7b7790c94Cb97a5",
				"txData": "0xcafe",
				"chainId": BASE,
				"value": "0x00",
				"approvalData": approval
			}
		})
	}

	#[tokio::test]
	async fn test_price_uses_best_route_and_api_key() {
		let server = MockServer::start_async().await;
		let quote_mock = server.mock(|when, then| {
			when.method(GET)
				.path("/quote")
				.header("x-api-key", "test-api-key")
				.query_param("fromChainId", "8453")
				.query_param("toChainId", "137")
				.query_param("fromAmount", "1000000")
				.query_param("sort", "output");
			then.status(200).json_body(quote_body(BASE, POLYGON));
		});

		let params = BridgeParamsBuilder::new().build();
		let quote = adapter(&server).get_price(&params).await.unwrap().unwrap();

		quote_mock.assert();
		assert_eq!(quote.provider, Provider::Bungee);
		assert_eq!(quote.details.currency_out.amount, U256::from(995_000u64));
		assert_eq!(quote.details.time_estimate, Some(60));
		assert_eq!(
			quote.fees.gas.as_ref().and_then(|f| f.amount_usd.clone()),
			Some("0.02".to_string())
		);
		assert_eq!(
			quote.metadata.as_ref().and_then(|m| m["routeId"].as_str()),
			Some("route-1")
		);
		assert!(quote.steps.is_empty());
	}

	#[tokio::test]
	async fn test_native_token_and_solana_are_normalized() {
		let server = MockServer::start_async().await;
		let quote_mock = server.mock(|when, then| {
			when.method(GET)
				.path("/quote")
				.query_param("fromTokenAddress", BUNGEE_NATIVE_TOKEN_ADDRESS)
				.query_param("toChainId", BUNGEE_SOLANA_CHAIN_ID.to_string());
			then.status(200)
				.json_body(quote_body(BASE, BUNGEE_SOLANA_CHAIN_ID));
		});

		let params = BridgeParamsBuilder::new()
			.route(BASE, SOLANA)
			.tokens(NATIVE_TOKEN_ADDRESS, "So11111111111111111111111111111111111111112")
			.build();
		let quote = adapter(&server).get_price(&params).await.unwrap().unwrap();

		quote_mock.assert();
		assert_eq!(quote.details.currency_out.chain_id, SOLANA);
	}

	#[tokio::test]
	async fn test_empty_routes_is_no_route() {
		let server = MockServer::start_async().await;
		server.mock(|when, then| {
			when.method(GET).path("/quote");
			then.status(200)
				.json_body(json!({ "success": true, "result": { "routes": [] } }));
		});

		let params = BridgeParamsBuilder::new().build();
		assert!(adapter(&server).get_price(&params).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_unsuccessful_envelope_is_an_error() {
		let server = MockServer::start_async().await;
		server.mock(|when, then| {
			when.method(GET).path("/quote");
			then.status(200)
				.json_body(json!({ "success": false, "message": "network congestion" }));
		});

		let params = BridgeParamsBuilder::new().build();
		let err = adapter(&server).get_price(&params).await.unwrap_err();
		assert_eq!(err.category(), ErrorCategory::NetworkError);
	}

	#[tokio::test]
	async fn test_quote_builds_approval_and_deposit() {
		let server = MockServer::start_async().await;
		let quote_mock = server.mock(|when, then| {
			when.method(GET).path("/quote");
			then.status(200).json_body(quote_body(BASE, POLYGON));
		});
		let build_mock = server.mock(|when, then| {
			when.method(POST)
				.path("/build-tx")
				.json_body_partial(json!({ "route": { "routeId": "route-1" } }).to_string());
			then.status(200).json_body(build_tx_body(true));
		});

		let adapter = adapter(&server);
		let params = BridgeParamsBuilder::new().build();
		adapter.get_price(&params).await.unwrap();
		let quote = adapter.get_quote(&params).await.unwrap().unwrap();

		quote_mock.assert_hits(1);
		build_mock.assert();
		let txs: Vec<_> = quote.transactions().collect();
		assert_eq!(txs.len(), 2);
		assert_eq!(txs[0].to, TEST_USDC_BASE);
		assert_eq!(
			txs[0].data,
			format!(
				"0x095ea7b3{:0>64}{:064x}",
				ALLOWANCE_TARGET.trim_start_matches("0x").to_ascii_lowercase(),
				1_000_000u128
			)
		);
		assert_eq!(txs[1].data, "0xcafe");
		assert_eq!(txs[1].value, U256::zero());
		assert_eq!(txs[1].from.as_deref(), Some(TEST_SENDER));
	}

	#[tokio::test]
	async fn test_execute_tracks_last_source_hash() {
		let server = MockServer::start_async().await;
		server.mock(|when, then| {
			when.method(GET).path("/quote");
			then.status(200).json_body(quote_body(BASE, POLYGON));
		});
		server.mock(|when, then| {
			when.method(POST).path("/build-tx");
			then.status(200).json_body(build_tx_body(true));
		});
		let deposit_hash = format!("0x{:064x}", 2);
		let status_mock = server.mock(|when, then| {
			when.method(GET)
				.path("/bridge-status")
				.query_param("transactionHash", deposit_hash.as_str())
				.query_param("fromChainId", "8453")
				.query_param("toChainId", "137");
			then.status(200).json_body(json!({
				"success": true,
				"result": {
					"sourceTxStatus": "COMPLETED",
					"destinationTxStatus": "REFUNDED",
					"sourceTransactionHash": deposit_hash,
					"fromChainId": 8453,
					"toChainId": 137
				}
			}));
		});

		let adapter = adapter(&server);
		let params = BridgeParamsBuilder::new().build();
		let quote = adapter.get_quote(&params).await.unwrap().unwrap();
		let wallet = Arc::new(RecordingWallet::eoa());
		let result = adapter
			.execute(
				&quote,
				ExecutionRequest::new(wallet.clone(), ProgressReporter::disabled()),
			)
			.await
			.unwrap();

		status_mock.assert();
		assert_eq!(wallet.sent_transactions().len(), 2);
		assert_eq!(result.status, BridgeStatus::Refund);
		assert_eq!(result.source_tx_hashes.len(), 2);
		assert_eq!(result.request_id, Some(format!("0x{:064x}", 2)));
	}

	#[tokio::test]
	async fn test_health_check_reaches_endpoint() {
		let server = MockServer::start_async().await;
		let health = server.mock(|when, then| {
			when.method(GET).path("/supported/chains");
			then.status(500);
		});
		assert!(!adapter(&server).is_healthy().await);
		health.assert();
	}

	#[test]
	fn test_status_mapping() {
		let status = |source: Option<&str>, destination: Option<&str>| {
			BridgeStatusResult {
				source_tx_status: source.map(str::to_string),
				destination_tx_status: destination.map(str::to_string),
				source_transaction_hash: None,
				destination_transaction_hash: None,
				from_chain_id: None,
				to_chain_id: None,
			}
			.status()
		};
		assert_eq!(status(Some("COMPLETED"), Some("COMPLETED")), BridgeStatus::Success);
		assert_eq!(status(Some("PENDING"), Some("PENDING")), BridgeStatus::Pending);
		assert_eq!(status(Some("FAILED"), None), BridgeStatus::Failure);
		assert_eq!(status(Some("COMPLETED"), Some("refunded")), BridgeStatus::Refund);
		assert_eq!(status(None, None), BridgeStatus::Unknown);
	}

	#[test]
	fn test_approve_calldata_rejects_bad_spender() {
		assert!(approve_calldata("0x1234", &U256::from(1u64)).is_err());
		let data = approve_calldata(ALLOWANCE_TARGET, &U256::from(255u64)).unwrap();
		assert!(data.starts_with(ERC20_APPROVE_SELECTOR));
		assert!(data.ends_with("ff"));
		assert_eq!(data.len(), 10 + 128);
	}
}
