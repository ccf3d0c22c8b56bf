//! Failure reporting
//!
//! Reports are dispatched on a spawned task so a slow or failing sink never
//! delays the orchestrator.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_types::{ErrorReport, ErrorReporter};
use tracing::error;

const TRACING_TARGET: &str = "bridge_engine::errors";

/// Default reporter: one structured `error!` event per report
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

#[async_trait]
impl ErrorReporter for TracingErrorReporter {
	async fn report(&self, report: ErrorReport) {
		error!(
			target: TRACING_TARGET,
			category = %report.category,
			provider = ?report.provider,
			operation = %report.operation,
			retry_count = report.retry_count,
			from_chain_id = report.from_chain_id,
			to_chain_id = report.to_chain_id,
			session_id = %report.session_id,
			"{}",
			report.message
		);
	}
}

/// Fire-and-forget dispatch
pub(crate) fn report_in_background(reporter: &Arc<dyn ErrorReporter>, report: ErrorReport) {
	let reporter = Arc::clone(reporter);
	tokio::spawn(async move {
		reporter.report(report).await;
	});
}
