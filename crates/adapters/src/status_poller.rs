//! Bridge status polling with exponential backoff

use std::time::Duration;

use async_trait::async_trait;
use bridge_types::constants::limits::{
	DEFAULT_POLL_BACKOFF_MULTIPLIER, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_ATTEMPTS,
	DEFAULT_POLL_MAX_INTERVAL_MS,
};
use bridge_types::{AdapterResult, StatusReport};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Tracing target for structured logging
const TRACING_TARGET: &str = "bridge_engine::status_poller";

/// Source of bridge status for one tracking id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusFetcher: Send + Sync {
	async fn fetch_status(&self, request_id: &str) -> AdapterResult<StatusReport>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollOptions {
	pub max_attempts: u32,
	pub interval: Duration,
	pub backoff_multiplier: f64,
	pub max_interval: Duration,
}

impl Default for PollOptions {
	fn default() -> Self {
		Self {
			max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
			interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
			backoff_multiplier: DEFAULT_POLL_BACKOFF_MULTIPLIER,
			max_interval: Duration::from_millis(DEFAULT_POLL_MAX_INTERVAL_MS),
		}
	}
}

impl PollOptions {
	/// `min(current * backoff_multiplier, max_interval)`; saturates at
	/// `max_interval` when the product does not fit a `Duration`
	pub fn next_interval(&self, current: Duration) -> Duration {
		Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_multiplier)
			.unwrap_or(self.max_interval)
			.min(self.max_interval)
	}
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
	#[error("polling cancelled")]
	Cancelled,

	#[error("no terminal status after {attempts} attempts")]
	Timeout { attempts: u32 },
}

/// Polls a status endpoint until the bridge reaches `success`, `failure` or `refund`
#[derive(Debug, Clone, Default)]
pub struct StatusPoller {
	options: PollOptions,
}

impl StatusPoller {
	pub fn new(options: PollOptions) -> Self {
		Self { options }
	}

	pub fn options(&self) -> &PollOptions {
		&self.options
	}

	/// Poll until a terminal status, `max_attempts` fetches, or cancellation.
	///
	/// Fetch errors are logged and count as an attempt. `on_update` sees every
	/// non-terminal report.
	pub async fn poll<F>(
		&self,
		fetcher: &dyn StatusFetcher,
		request_id: &str,
		cancel: &CancellationToken,
		mut on_update: F,
	) -> Result<StatusReport, PollError>
	where
		F: FnMut(&StatusReport) + Send,
	{
		let mut interval = self.options.interval;

		for attempt in 1..=self.options.max_attempts {
			let fetched = tokio::select! {
				biased;
				_ = cancel.cancelled() => return Err(PollError::Cancelled),
				fetched = fetcher.fetch_status(request_id) => fetched,
			};

			match fetched {
				Ok(report) if report.status.is_terminal() => {
					tracing::debug!(
						target: TRACING_TARGET,
						request_id = %request_id,
						attempt,
						status = %report.status,
						"Bridge reached terminal status"
					);
					return Ok(report);
				},
				Ok(report) => {
					tracing::debug!(
						target: TRACING_TARGET,
						request_id = %request_id,
						attempt,
						status = %report.status,
						"Bridge still in progress"
					);
					on_update(&report);
				},
				Err(e) => {
					tracing::warn!(
						target: TRACING_TARGET,
						request_id = %request_id,
						attempt,
						error = %e,
						"Status fetch failed, will retry"
					);
				},
			}

			if attempt == self.options.max_attempts {
				break;
			}

			tokio::select! {
				biased;
				_ = cancel.cancelled() => return Err(PollError::Cancelled),
				_ = tokio::time::sleep(interval) => {},
			}
			interval = self.options.next_interval(interval);
		}

		tracing::warn!(
			target: TRACING_TARGET,
			request_id = %request_id,
			attempts = self.options.max_attempts,
			"Giving up on bridge status"
		);
		Err(PollError::Timeout {
			attempts: self.options.max_attempts,
		})
	}
}
