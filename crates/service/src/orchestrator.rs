//! Fallback orchestrator
//!
//! Drives one logical operation (price, quote or execute) across the ordered
//! providers for a route. Providers are tried strictly one after another:
//! the next attempt starts only once the previous one has resolved, so two
//! providers never submit transactions for the same transfer.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bridge_adapters::AdapterRegistry;
use bridge_config::OrchestratorSettings;
use bridge_types::constants::limits::{
	ABANDONED_REASON, DEFAULT_EXECUTION_TIMEOUT_MS, DEFAULT_MAX_PROVIDERS_TO_TRY, NO_ROUTES_REASON,
};
use bridge_types::{
	AdapterError, AdapterResult, BridgeAdapter, BridgeParams, ErrorReport, ErrorReporter,
	ExecutionContext, ExecutionRequest, ExecutionResult, FallbackAttempt, OperationKind,
	ProgressEvent, Provider, RouteSelection, UnifiedQuote,
};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::attempt_tracker::{AttemptTracker, AttemptUpdate};
use crate::errors::BridgeError;
use crate::gas::GasEscalator;
use crate::reporter::{report_in_background, TracingErrorReporter};
use crate::selector::ProviderSelector;

const TRACING_TARGET: &str = "bridge_engine::orchestrator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
	/// Upper bound on providers tried for one operation
	pub max_providers_to_try: usize,
	/// Wall-clock limit for one execution, polling included
	pub execution_timeout: Duration,
}

impl Default for OrchestratorOptions {
	fn default() -> Self {
		Self {
			max_providers_to_try: DEFAULT_MAX_PROVIDERS_TO_TRY,
			execution_timeout: Duration::from_millis(DEFAULT_EXECUTION_TIMEOUT_MS),
		}
	}
}

impl From<&OrchestratorSettings> for OrchestratorOptions {
	fn from(settings: &OrchestratorSettings) -> Self {
		Self {
			max_providers_to_try: settings.max_providers_to_try,
			execution_timeout: Duration::from_millis(settings.execution_timeout_ms),
		}
	}
}

/// Observable engine state for the caller's UI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineSnapshot {
	pub is_loading: bool,
	pub error: Option<String>,
	pub last_attempt_provider: Option<Provider>,
	pub fallback_attempts: Vec<FallbackAttempt>,
	/// Provider that serviced (or is servicing) the latest operation.
	/// Kept after success so the caller can execute with the same provider.
	pub current_provider: Option<Provider>,
	pub session_id: Option<String>,
}

pub struct BridgeService {
	registry: Arc<AdapterRegistry>,
	selector: ProviderSelector,
	gas: GasEscalator,
	tracker: AttemptTracker,
	reporter: Arc<dyn ErrorReporter>,
	options: OrchestratorOptions,
	state: Arc<RwLock<EngineSnapshot>>,
}

impl std::fmt::Debug for BridgeService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BridgeService")
			.field("providers", &self.selector.configs().len())
			.field("gas", &self.gas)
			.field("options", &self.options)
			.finish()
	}
}

impl BridgeService {
	pub fn new(registry: Arc<AdapterRegistry>, options: OrchestratorOptions) -> Self {
		let selector = ProviderSelector::new(registry.configs());
		Self {
			registry,
			selector,
			gas: GasEscalator::default(),
			tracker: AttemptTracker::new(),
			reporter: Arc::new(TracingErrorReporter),
			options,
			state: Arc::new(RwLock::new(EngineSnapshot::default())),
		}
	}

	pub fn with_gas_escalator(mut self, gas: GasEscalator) -> Self {
		self.gas = gas;
		self
	}

	pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
		self.reporter = reporter;
		self
	}

	pub fn with_tracker(mut self, tracker: AttemptTracker) -> Self {
		self.tracker = tracker;
		self
	}

	pub fn options(&self) -> &OrchestratorOptions {
		&self.options
	}

	pub fn selector(&self) -> &ProviderSelector {
		&self.selector
	}

	pub fn tracker(&self) -> &AttemptTracker {
		&self.tracker
	}

	pub fn select_provider(&self, params: &BridgeParams) -> RouteSelection {
		self.selector.select(params.from_chain_id, params.to_chain_id)
	}

	pub fn available_providers(
		&self,
		from_chain_id: bridge_types::ChainId,
		to_chain_id: bridge_types::ChainId,
	) -> Vec<Provider> {
		self.selector.available_providers(from_chain_id, to_chain_id)
	}

	pub async fn current_provider(&self) -> Option<Provider> {
		self.state.read().await.current_provider
	}

	pub async fn state(&self) -> EngineSnapshot {
		self.state.read().await.clone()
	}

	/// Clear observable state before a new top-level action
	pub async fn reset(&self) {
		*self.state.write().await = EngineSnapshot::default();
	}

	/// Indicative price from the first provider that has a route
	pub async fn get_price(&self, params: &BridgeParams) -> Result<UnifiedQuote, BridgeError> {
		self.quote_operation(OperationKind::Price, params).await
	}

	/// Executable quote from the first provider that has a route
	pub async fn get_quote(&self, params: &BridgeParams) -> Result<UnifiedQuote, BridgeError> {
		self.quote_operation(OperationKind::Quote, params).await
	}

	async fn quote_operation(
		&self,
		operation: OperationKind,
		params: &BridgeParams,
	) -> Result<UnifiedQuote, BridgeError> {
		params.validate().map_err(BridgeError::InvalidParams)?;

		let context = ExecutionContext::new(params.from_chain_id, params.to_chain_id);
		let selection = self.select_provider(params);
		self.run(operation, context, selection, |adapter, _| async move {
			match operation {
				OperationKind::Price => adapter.get_price(params).await,
				_ => adapter.get_quote(params).await,
			}
		})
		.await
	}

	/// Execute `quote` with the provider that produced it.
	///
	/// Gas fields are raised to the current minimum first. The execution is
	/// aborted through `request.cancel` or after the configured deadline.
	/// Progress is pushed to `request.progress`.
	pub async fn execute_quote(
		&self,
		quote: &UnifiedQuote,
		request: ExecutionRequest,
	) -> Result<ExecutionResult, BridgeError> {
		if !quote.is_executable() {
			return Err(BridgeError::InvalidParams(
				"quote carries no transactions".to_string(),
			));
		}

		let context = ExecutionContext::new(
			quote.details.currency_in.chain_id,
			quote.details.currency_out.chain_id,
		);
		let mut quote = quote.clone();
		self.gas.escalate_quote(&mut quote).await;

		// Transactions in a quote are only valid for the provider that built it
		let selection = RouteSelection {
			primary: Some(quote.provider),
			fallback: Vec::new(),
			reasoning: vec![format!("{}: produced the quote", quote.provider)],
		};

		let quote = &quote;
		let request = &request;
		let tracker = &self.tracker;
		let timeout = self.options.execution_timeout;
		self.run(
			OperationKind::Execute,
			context,
			selection,
			|adapter, attempt_id| async move {
				request.progress.emit(ProgressEvent::ProviderSelected {
					provider: adapter.provider(),
				});
				let result = execute_with_deadline(adapter, quote, request, timeout).await?;
				tracker.update(
					&attempt_id,
					AttemptUpdate {
						source_tx_hash: result.source_tx_hashes.last().cloned(),
						destination_tx_hash: result.destination_tx_hashes.last().cloned(),
					},
				);
				Ok(Some(result))
			},
		)
		.await
	}

	/// Liveness of every registered provider
	pub async fn health_check_all(&self) -> HashMap<Provider, bool> {
		let checks = self.registry.all().map(|adapter| async move {
			(adapter.provider(), adapter.is_healthy().await)
		});
		join_all(checks).await.into_iter().collect()
	}

	/// The fallback state machine shared by every operation.
	///
	/// `call` receives the adapter and the tracker id of the attempt. `Ok(None)`
	/// is a soft failure and always moves on; errors move on only when their
	/// category allows immediate failover.
	async fn run<T, F, Fut>(
		&self,
		operation: OperationKind,
		mut context: ExecutionContext,
		selection: RouteSelection,
		mut call: F,
	) -> Result<T, BridgeError>
	where
		F: FnMut(Arc<dyn BridgeAdapter>, String) -> Fut,
		Fut: Future<Output = AdapterResult<Option<T>>>,
	{
		let from_chain_id = context.chain_data.from_chain_id;
		let to_chain_id = context.chain_data.to_chain_id;
		let mut in_flight = InFlight::new(&self.tracker, &self.state, &context);
		self.begin(&context).await;

		debug!(
			target: TRACING_TARGET,
			%operation,
			session_id = %context.session_id,
			reasoning = ?selection.reasoning,
			"Provider selection"
		);

		if selection.is_empty() {
			let error = BridgeError::UnsupportedRoute {
				from_chain_id,
				to_chain_id,
			};
			warn!(target: TRACING_TARGET, %operation, from_chain_id, to_chain_id, "No provider supports route");
			self.report(operation, &context, None, 0, &error);
			self.finish(&context, Some(&error)).await;
			in_flight.settle();
			return Err(error);
		}

		let providers: Vec<Provider> = selection
			.ordered()
			.into_iter()
			.take(self.options.max_providers_to_try.max(1))
			.collect();
		let mut last_error: Option<BridgeError> = None;

		for (index, provider) in providers.iter().copied().enumerate() {
			let has_next = index + 1 < providers.len();

			let Some(adapter) = self.registry.get(provider) else {
				warn!(target: TRACING_TARGET, %provider, "No adapter registered, skipping");
				context.record_fallback(provider, "no adapter registered");
				last_error = Some(BridgeError::NoAdapter(provider));
				continue;
			};

			if !adapter.is_supported(from_chain_id, to_chain_id) {
				info!(target: TRACING_TARGET, %provider, from_chain_id, to_chain_id, "Provider does not support route, skipping");
				context.record_fallback(
					provider,
					format!(
						"route {} -> {} not supported",
						from_chain_id, to_chain_id
					),
				);
				continue;
			}

			self.mark_attempt(provider).await;
			let attempt_id = self.tracker.start(provider, operation, &context);
			in_flight.track(&attempt_id);
			let outcome = call(adapter.clone(), attempt_id.clone()).await;
			in_flight.untrack();

			match outcome {
				Ok(Some(value)) => {
					self.tracker.complete(&attempt_id);
					info!(
						target: TRACING_TARGET,
						%provider,
						%operation,
						fallbacks = context.fallback_attempts.len(),
						"Operation succeeded"
					);
					self.finish(&context, None).await;
					in_flight.settle();
					return Ok(value);
				},
				Ok(None) => {
					self.tracker.complete_no_route(&attempt_id);
					context.record_fallback(provider, NO_ROUTES_REASON);
					self.publish_fallbacks(&context).await;
					if has_next {
						info!(target: TRACING_TARGET, %provider, %operation, "No route, trying next provider");
					}
				},
				Err(source) => {
					let error = BridgeError::adapter(provider, source);
					self.tracker.fail(&attempt_id, error.to_string());

					if matches!(error, BridgeError::Cancelled) {
						info!(target: TRACING_TARGET, %provider, %operation, "Operation cancelled");
						self.finish(&context, Some(&error)).await;
						in_flight.settle();
						return Err(error);
					}

					self.report(operation, &context, Some(provider), index as u32, &error);
					let category = error.category();
					let may_fail_over = category.is_immediate_failover()
						&& adapter.config().retry_policy.fallback_on_failure;

					if may_fail_over && has_next {
						info!(
							target: TRACING_TARGET,
							%provider,
							%operation,
							%category,
							"Provider failed, trying next provider"
						);
						context.record_fallback(provider, error.to_string());
						self.publish_fallbacks(&context).await;
						last_error = Some(error);
						continue;
					}

					warn!(target: TRACING_TARGET, %provider, %operation, %category, error = %error, "Operation failed");
					self.finish(&context, Some(&error)).await;
					in_flight.settle();
					return Err(error);
				},
			}
		}

		let error = match last_error {
			Some(error) => error,
			None => {
				let error = BridgeError::AllProvidersFailed {
					from_chain_id,
					to_chain_id,
				};
				self.report(operation, &context, None, providers.len() as u32, &error);
				error
			},
		};
		warn!(target: TRACING_TARGET, %operation, error = %error, "All providers exhausted");
		self.finish(&context, Some(&error)).await;
		in_flight.settle();
		Err(error)
	}

	async fn begin(&self, context: &ExecutionContext) {
		let mut state = self.state.write().await;
		state.is_loading = true;
		state.error = None;
		state.fallback_attempts.clear();
		state.session_id = Some(context.session_id.clone());
	}

	async fn mark_attempt(&self, provider: Provider) {
		let mut state = self.state.write().await;
		state.last_attempt_provider = Some(provider);
		state.current_provider = Some(provider);
	}

	async fn publish_fallbacks(&self, context: &ExecutionContext) {
		self.state.write().await.fallback_attempts = context.fallback_attempts.clone();
	}

	async fn finish(&self, context: &ExecutionContext, error: Option<&BridgeError>) {
		let mut state = self.state.write().await;
		state.is_loading = false;
		state.error = error.map(ToString::to_string);
		state.fallback_attempts = context.fallback_attempts.clone();
	}

	fn report(
		&self,
		operation: OperationKind,
		context: &ExecutionContext,
		provider: Option<Provider>,
		retry_count: u32,
		error: &BridgeError,
	) {
		report_in_background(
			&self.reporter,
			ErrorReport {
				category: error.category(),
				provider,
				operation,
				retry_count,
				from_chain_id: context.chain_data.from_chain_id,
				to_chain_id: context.chain_data.to_chain_id,
				message: error.to_string(),
				session_id: context.session_id.clone(),
			},
		);
	}
}

/// Settles an operation whose future is dropped before it resolves.
///
/// The running attempt is failed and the snapshot stops loading, unless a
/// newer operation has taken over the snapshot in the meantime.
struct InFlight {
	tracker: AttemptTracker,
	state: Arc<RwLock<EngineSnapshot>>,
	session_id: String,
	attempt_id: Option<String>,
	settled: bool,
}

impl InFlight {
	fn new(
		tracker: &AttemptTracker,
		state: &Arc<RwLock<EngineSnapshot>>,
		context: &ExecutionContext,
	) -> Self {
		Self {
			tracker: tracker.clone(),
			state: state.clone(),
			session_id: context.session_id.clone(),
			attempt_id: None,
			settled: false,
		}
	}

	fn track(&mut self, attempt_id: &str) {
		self.attempt_id = Some(attempt_id.to_string());
	}

	fn untrack(&mut self) {
		self.attempt_id = None;
	}

	fn settle(&mut self) {
		self.settled = true;
	}
}

impl Drop for InFlight {
	fn drop(&mut self) {
		if self.settled {
			return;
		}
		if let Some(attempt_id) = self.attempt_id.take() {
			self.tracker.fail(&attempt_id, ABANDONED_REASON);
		}
		debug!(target: TRACING_TARGET, session_id = %self.session_id, "Operation dropped before resolving");

		let session_id = std::mem::take(&mut self.session_id);
		match self.state.try_write() {
			Ok(mut state) => stop_loading(&mut state, &session_id),
			Err(_) => {
				// Lock is busy; finish on the runtime if there is one
				if let Ok(handle) = tokio::runtime::Handle::try_current() {
					let state = self.state.clone();
					handle.spawn(async move {
						stop_loading(&mut *state.write().await, &session_id);
					});
				}
			},
		}
	}
}

fn stop_loading(state: &mut EngineSnapshot, session_id: &str) {
	if state.session_id.as_deref() == Some(session_id) {
		state.is_loading = false;
		state.error = Some(ABANDONED_REASON.to_string());
	}
}

/// Run `execute` under an absolute deadline.
///
/// On expiry the child token is cancelled and the adapter is awaited until
/// it unwinds, so no poll outlives the deadline.
async fn execute_with_deadline(
	adapter: Arc<dyn BridgeAdapter>,
	quote: &UnifiedQuote,
	request: &ExecutionRequest,
	timeout: Duration,
) -> AdapterResult<ExecutionResult> {
	let deadline = request.cancel.child_token();
	let execution = adapter.execute(quote, request.clone().with_cancel(deadline.clone()));
	tokio::pin!(execution);

	tokio::select! {
		result = &mut execution => result,
		_ = tokio::time::sleep(timeout) => {
			let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
			warn!(target: TRACING_TARGET, provider = %adapter.provider(), timeout_ms, "Execution deadline reached, aborting");
			deadline.cancel();
			let _ = execution.await;
			Err(AdapterError::Timeout { timeout_ms })
		},
	}
}
