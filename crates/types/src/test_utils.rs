//! Test utilities for creating common test objects
//!
//! Builders for bridge requests and quotes, a wallet that records what it is
//! asked to submit, and a scripted adapter shared by the crates' tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::adapters::{AdapterError, AdapterResult, BridgeAdapter, ExecutionRequest};
use crate::chain::{ChainId, ARBITRUM, BASE, ETHEREUM, OPTIMISM, POLYGON};
use crate::execution::{
	BridgeStatus, ExecutionResult, ProgressEvent, SubmissionPath,
};
use crate::models::U256;
use crate::provider::{Provider, ProviderConfig, SupportedChains};
use crate::quote::{
	BridgeParams, CurrencyAmount, QuoteDetails, QuoteFees, QuoteStep, StepItem,
	TransactionParams, UnifiedQuote,
};
use crate::wallet::{
	UserOperationCall, UserOperationReceipt, WalletClient, WalletError, WalletKind,
};

pub const TEST_SENDER: &str = "0x742d35Cc6634C0532925a3b8D38BA2297C33A9D7";
pub const TEST_USDC_BASE: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";
pub const TEST_USDC_POLYGON: &str = "0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359";

/// Builder for `BridgeParams` with a Base to Polygon USDC transfer as default
#[derive(Debug, Clone)]
pub struct BridgeParamsBuilder {
	params: BridgeParams,
}

impl Default for BridgeParamsBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl BridgeParamsBuilder {
	pub fn new() -> Self {
		Self {
			params: BridgeParams {
				from_chain_id: BASE,
				to_chain_id: POLYGON,
				from_token: TEST_USDC_BASE.to_string(),
				to_token: TEST_USDC_POLYGON.to_string(),
				amount: U256::from(1_000_000u64),
				sender: TEST_SENDER.to_string(),
				recipient: TEST_SENDER.to_string(),
			},
		}
	}

	pub fn route(mut self, from_chain_id: ChainId, to_chain_id: ChainId) -> Self {
		self.params.from_chain_id = from_chain_id;
		self.params.to_chain_id = to_chain_id;
		self
	}

	pub fn tokens(mut self, from_token: &str, to_token: &str) -> Self {
		self.params.from_token = from_token.to_string();
		self.params.to_token = to_token.to_string();
		self
	}

	pub fn amount(mut self, amount: u128) -> Self {
		self.params.amount = U256::from(amount);
		self
	}

	pub fn recipient(mut self, recipient: &str) -> Self {
		self.params.recipient = recipient.to_string();
		self
	}

	pub fn build(self) -> BridgeParams {
		self.params
	}
}

/// Builder for a `UnifiedQuote` mirroring the given request
#[derive(Debug, Clone)]
pub struct QuoteBuilder {
	quote: UnifiedQuote,
}

impl QuoteBuilder {
	pub fn new(provider: Provider, params: &BridgeParams) -> Self {
		let currency = |chain_id, address: &str| CurrencyAmount {
			chain_id,
			address: address.to_string(),
			symbol: Some("USDC".to_string()),
			decimals: Some(6),
			amount: params.amount.clone(),
			amount_usd: None,
		};
		Self {
			quote: UnifiedQuote {
				provider,
				details: QuoteDetails {
					currency_in: currency(params.from_chain_id, &params.from_token),
					currency_out: currency(params.to_chain_id, &params.to_token),
					recipient: params.recipient.clone(),
					time_estimate: Some(20),
				},
				fees: QuoteFees::default(),
				steps: Vec::new(),
				metadata: None,
			},
		}
	}

	/// Append a step with a single transaction
	pub fn step(mut self, id: &str, tx: TransactionParams, request_id: Option<&str>) -> Self {
		self.quote.steps.push(QuoteStep {
			id: id.to_string(),
			description: None,
			request_id: request_id.map(str::to_string),
			items: vec![StepItem { data: tx }],
		});
		self
	}

	pub fn build(self) -> UnifiedQuote {
		self.quote
	}
}

/// Deposit transaction with the given EIP-1559 fields, in wei
pub fn deposit_tx(
	chain_id: ChainId,
	max_priority_fee_per_gas: Option<u128>,
	max_fee_per_gas: Option<u128>,
) -> TransactionParams {
	let mut tx = TransactionParams::new(chain_id, "0xa5F565650890fBA1824Ee0F21EbBbF660a179934", "0xdeadbeef");
	tx.max_priority_fee_per_gas = max_priority_fee_per_gas.map(U256::from);
	tx.max_fee_per_gas = max_fee_per_gas.map(U256::from);
	tx
}

/// Wallet that records submissions and answers with deterministic hashes
#[derive(Debug)]
pub struct RecordingWallet {
	kind: WalletKind,
	address: String,
	failure: Option<WalletError>,
	receipt_success: bool,
	counter: AtomicUsize,
	pub sent: Mutex<Vec<TransactionParams>>,
	pub user_operations: Mutex<Vec<Vec<UserOperationCall>>>,
}

impl RecordingWallet {
	pub fn eoa() -> Self {
		Self::new(WalletKind::Eoa)
	}

	pub fn smart_account() -> Self {
		Self::new(WalletKind::SmartAccount)
	}

	fn new(kind: WalletKind) -> Self {
		Self {
			kind,
			address: TEST_SENDER.to_string(),
			failure: None,
			receipt_success: true,
			counter: AtomicUsize::new(0),
			sent: Mutex::new(Vec::new()),
			user_operations: Mutex::new(Vec::new()),
		}
	}

	/// Every submission fails with `error`
	pub fn failing(mut self, error: WalletError) -> Self {
		self.failure = Some(error);
		self
	}

	/// User operations are included but report `success: false`
	pub fn with_failed_receipts(mut self) -> Self {
		self.receipt_success = false;
		self
	}

	pub fn sent_transactions(&self) -> Vec<TransactionParams> {
		self.sent.lock().unwrap().clone()
	}

	pub fn sent_user_operations(&self) -> Vec<Vec<UserOperationCall>> {
		self.user_operations.lock().unwrap().clone()
	}

	fn next_hash(&self) -> String {
		let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
		format!("0x{:064x}", n)
	}
}

#[async_trait]
impl WalletClient for RecordingWallet {
	fn kind(&self) -> WalletKind {
		self.kind
	}

	fn address(&self) -> &str {
		&self.address
	}

	async fn send_transaction(&self, tx: &TransactionParams) -> Result<String, WalletError> {
		if let Some(error) = &self.failure {
			return Err(error.clone());
		}
		self.sent.lock().unwrap().push(tx.clone());
		Ok(self.next_hash())
	}

	async fn send_user_operation(
		&self,
		_chain_id: u64,
		calls: &[UserOperationCall],
	) -> Result<String, WalletError> {
		if let Some(error) = &self.failure {
			return Err(error.clone());
		}
		self.user_operations.lock().unwrap().push(calls.to_vec());
		Ok(self.next_hash())
	}

	async fn wait_for_user_operation_receipt(
		&self,
		_hash: &str,
		_timeout: Duration,
	) -> Result<UserOperationReceipt, WalletError> {
		Ok(UserOperationReceipt {
			success: self.receipt_success,
			transaction_hash: Some(self.next_hash()),
		})
	}
}

/// Error a scripted adapter raises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
	NoRoutes,
	Network,
	Timeout,
	Rejected,
	Unknown,
}

impl MockFailure {
	pub fn to_error(self) -> AdapterError {
		match self {
			MockFailure::NoRoutes => AdapterError::NoRoutes {
				reason: "no routes found".to_string(),
			},
			MockFailure::Network => AdapterError::from_http_failure(503, "Service Unavailable"),
			MockFailure::Timeout => AdapterError::Timeout { timeout_ms: 15_000 },
			MockFailure::Rejected => AdapterError::Wallet(WalletError::Rejected),
			MockFailure::Unknown => AdapterError::InvalidResponse {
				reason: "unexpected payload".to_string(),
			},
		}
	}
}

/// Scripted answer for a price or quote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
	Quote,
	NoRoute,
	Fail(MockFailure),
}

/// Scripted outcome of `execute`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockExecution {
	Complete(BridgeStatus),
	Fail(MockFailure),
	/// Block until the request's cancellation token fires
	Hang,
}

/// Entry in a log shared between adapters, used to check call ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
	Started(Provider, &'static str),
	Finished(Provider, &'static str),
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<CallEvent>>>);

impl CallLog {
	pub fn push(&self, event: CallEvent) {
		self.0.lock().unwrap().push(event);
	}

	pub fn events(&self) -> Vec<CallEvent> {
		self.0.lock().unwrap().clone()
	}

	/// True when no call started before the previous one finished
	pub fn is_sequential(&self) -> bool {
		let mut open = 0usize;
		for event in self.events() {
			match event {
				CallEvent::Started(..) => {
					open += 1;
					if open > 1 {
						return false;
					}
				},
				CallEvent::Finished(..) => open = open.saturating_sub(1),
			}
		}
		true
	}
}

/// Scripted adapter with call counting
#[derive(Debug, Clone)]
pub struct MockBridgeAdapter {
	config: ProviderConfig,
	price: MockResponse,
	quote: MockResponse,
	execution: MockExecution,
	quote_tx: TransactionParams,
	delay: Option<Duration>,
	healthy: bool,
	route_support: Option<bool>,
	log: CallLog,
	pub price_calls: Arc<AtomicUsize>,
	pub quote_calls: Arc<AtomicUsize>,
	pub execute_calls: Arc<AtomicUsize>,
	pub executed: Arc<Mutex<Vec<UnifiedQuote>>>,
}

impl MockBridgeAdapter {
	pub fn new(provider: Provider, priority: u32) -> Self {
		let chains = vec![ETHEREUM, OPTIMISM, POLYGON, BASE, ARBITRUM];
		Self {
			config: ProviderConfig::new(provider, priority, format!("https://{}.mock", provider))
				.with_chains(SupportedChains::symmetric(chains)),
			price: MockResponse::Quote,
			quote: MockResponse::Quote,
			execution: MockExecution::Complete(BridgeStatus::Success),
			quote_tx: deposit_tx(BASE, Some(100_000_000), Some(1_000_000_000)),
			delay: None,
			healthy: true,
			route_support: None,
			log: CallLog::default(),
			price_calls: Arc::new(AtomicUsize::new(0)),
			quote_calls: Arc::new(AtomicUsize::new(0)),
			execute_calls: Arc::new(AtomicUsize::new(0)),
			executed: Arc::new(Mutex::new(Vec::new())),
		}
	}

	pub fn with_config(mut self, config: ProviderConfig) -> Self {
		self.config = config;
		self
	}

	pub fn with_price(mut self, response: MockResponse) -> Self {
		self.price = response;
		self
	}

	pub fn with_quote(mut self, response: MockResponse) -> Self {
		self.quote = response;
		self
	}

	pub fn with_execution(mut self, execution: MockExecution) -> Self {
		self.execution = execution;
		self
	}

	/// Transaction embedded in returned quotes
	pub fn with_quote_transaction(mut self, tx: TransactionParams) -> Self {
		self.quote_tx = tx;
		self
	}

	/// Sleep this long inside every call
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);
		self
	}

	pub fn with_log(mut self, log: CallLog) -> Self {
		self.log = log;
		self
	}

	pub fn unhealthy(mut self) -> Self {
		self.healthy = false;
		self
	}

	/// Answer `is_supported` with this value whatever the config says
	pub fn with_route_support(mut self, supported: bool) -> Self {
		self.route_support = Some(supported);
		self
	}

	pub fn total_calls(&self) -> usize {
		self.price_calls.load(Ordering::SeqCst)
			+ self.quote_calls.load(Ordering::SeqCst)
			+ self.execute_calls.load(Ordering::SeqCst)
	}

	pub fn executed_quotes(&self) -> Vec<UnifiedQuote> {
		self.executed.lock().unwrap().clone()
	}

	async fn respond(
		&self,
		operation: &'static str,
		response: &MockResponse,
		params: &BridgeParams,
		executable: bool,
	) -> AdapterResult<Option<UnifiedQuote>> {
		let provider = self.config.provider;
		self.log.push(CallEvent::Started(provider, operation));
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		let result = match response {
			MockResponse::Quote => {
				let mut builder = QuoteBuilder::new(provider, params);
				if executable {
					builder = builder.step(
						"deposit",
						self.quote_tx.clone(),
						Some(&format!("0x{}-request", provider)),
					);
				}
				Ok(Some(builder.build()))
			},
			MockResponse::NoRoute => Ok(None),
			MockResponse::Fail(failure) => Err(failure.to_error()),
		};
		self.log.push(CallEvent::Finished(provider, operation));
		result
	}
}

#[async_trait]
impl BridgeAdapter for MockBridgeAdapter {
	fn provider(&self) -> Provider {
		self.config.provider
	}

	fn config(&self) -> &ProviderConfig {
		&self.config
	}

	fn is_supported(&self, from_chain_id: ChainId, to_chain_id: ChainId) -> bool {
		self.route_support
			.unwrap_or_else(|| self.config.supports_route(from_chain_id, to_chain_id))
	}

	async fn get_price(&self, params: &BridgeParams) -> AdapterResult<Option<UnifiedQuote>> {
		self.price_calls.fetch_add(1, Ordering::SeqCst);
		self.respond("price", &self.price, params, false).await
	}

	async fn get_quote(&self, params: &BridgeParams) -> AdapterResult<Option<UnifiedQuote>> {
		self.quote_calls.fetch_add(1, Ordering::SeqCst);
		self.respond("quote", &self.quote, params, true).await
	}

	async fn execute(
		&self,
		quote: &UnifiedQuote,
		request: ExecutionRequest,
	) -> AdapterResult<ExecutionResult> {
		let provider = self.config.provider;
		self.execute_calls.fetch_add(1, Ordering::SeqCst);
		self.executed.lock().unwrap().push(quote.clone());
		self.log.push(CallEvent::Started(provider, "execute"));
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}

		let outcome = match &self.execution {
			MockExecution::Hang => {
				request.cancel.cancelled().await;
				Err(AdapterError::Cancelled)
			},
			MockExecution::Fail(failure) => Err(failure.to_error()),
			MockExecution::Complete(status) => {
				let hash = format!("0x{}-source", provider);
				request.progress.emit(ProgressEvent::TransactionSubmitted {
					provider,
					hash: hash.clone(),
				});
				let result = ExecutionResult {
					provider,
					request_id: quote.request_id().map(str::to_string),
					submission: SubmissionPath::Transactions,
					source_tx_hashes: vec![hash],
					destination_tx_hashes: vec![format!("0x{}-destination", provider)],
					user_operation_hash: None,
					status: *status,
				};
				if result.is_success() {
					request.progress.emit(ProgressEvent::Completed {
						provider,
						result: result.clone(),
					});
				}
				Ok(result)
			},
		};
		self.log.push(CallEvent::Finished(provider, "execute"));
		outcome
	}

	async fn is_healthy(&self) -> bool {
		self.config.enabled && self.healthy
	}
}
