//! In-memory ledger of provider attempts that are still running
//!
//! Records exist only while active: `complete`, `complete_no_route` and
//! `fail` remove them and hand the final record back for logging. Records
//! nobody settled are swept once they outlive the tracker's max age.

use std::sync::Arc;
use std::time::Duration;

use bridge_types::constants::limits::STALE_ATTEMPT_MAX_AGE_MS;
use bridge_types::{ChainId, ExecutionContext, OperationKind, Provider};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
	Pending,
	Success,
	/// The provider answered but had no route
	NoRoute,
	Failed,
}

/// Route context an attempt was started with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptContext {
	pub session_id: String,
	pub from_chain_id: ChainId,
	pub to_chain_id: ChainId,
}

impl From<&ExecutionContext> for AttemptContext {
	fn from(context: &ExecutionContext) -> Self {
		Self {
			session_id: context.session_id.clone(),
			from_chain_id: context.chain_data.from_chain_id,
			to_chain_id: context.chain_data.to_chain_id,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeAttempt {
	pub id: String,
	pub provider: Provider,
	pub operation: OperationKind,
	pub status: AttemptStatus,
	pub start_time: DateTime<Utc>,
	pub end_time: Option<DateTime<Utc>>,
	pub source_tx_hash: Option<String>,
	pub destination_tx_hash: Option<String>,
	pub error: Option<String>,
	pub context: AttemptContext,
}

impl BridgeAttempt {
	pub fn duration_ms(&self) -> Option<i64> {
		self.end_time
			.map(|end| (end - self.start_time).num_milliseconds())
	}
}

/// Hashes learned while an attempt runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptUpdate {
	pub source_tx_hash: Option<String>,
	pub destination_tx_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AttemptTracker {
	active: Arc<DashMap<String, BridgeAttempt>>,
	max_age: Duration,
}

impl Default for AttemptTracker {
	fn default() -> Self {
		Self::with_max_age(Duration::from_millis(STALE_ATTEMPT_MAX_AGE_MS))
	}
}

impl AttemptTracker {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_max_age(max_age: Duration) -> Self {
		Self {
			active: Arc::new(DashMap::new()),
			max_age,
		}
	}

	pub fn max_age(&self) -> Duration {
		self.max_age
	}

	/// Drop attempts older than the max age and return how many went
	pub fn prune_stale(&self) -> usize {
		let now = Utc::now();
		let before = self.active.len();
		self.active.retain(|_, attempt| {
			// A start time in the future means clock skew, keep it
			(now - attempt.start_time)
				.to_std()
				.map(|age| age < self.max_age)
				.unwrap_or(true)
		});
		let pruned = before.saturating_sub(self.active.len());
		if pruned > 0 {
			warn!(pruned, remaining = self.active.len(), "Swept stale bridge attempts");
		}
		pruned
	}

	/// Open a pending attempt and return its id
	pub fn start(
		&self,
		provider: Provider,
		operation: OperationKind,
		context: &ExecutionContext,
	) -> String {
		self.prune_stale();
		let id = Uuid::new_v4().to_string();
		let attempt = BridgeAttempt {
			id: id.clone(),
			provider,
			operation,
			status: AttemptStatus::Pending,
			start_time: Utc::now(),
			end_time: None,
			source_tx_hash: None,
			destination_tx_hash: None,
			error: None,
			context: context.into(),
		};
		debug!(
			attempt_id = %id,
			%provider,
			%operation,
			session_id = %context.session_id,
			"Bridge attempt started"
		);
		self.active.insert(id.clone(), attempt);
		id
	}

	/// Merge newly known hashes into an active attempt
	pub fn update(&self, id: &str, update: AttemptUpdate) -> bool {
		match self.active.get_mut(id) {
			Some(mut attempt) => {
				if update.source_tx_hash.is_some() {
					attempt.source_tx_hash = update.source_tx_hash;
				}
				if update.destination_tx_hash.is_some() {
					attempt.destination_tx_hash = update.destination_tx_hash;
				}
				true
			},
			None => false,
		}
	}

	pub fn complete(&self, id: &str) -> Option<BridgeAttempt> {
		let attempt = self.finish(id, AttemptStatus::Success, None)?;
		info!(
			attempt_id = %attempt.id,
			provider = %attempt.provider,
			operation = %attempt.operation,
			duration_ms = attempt.duration_ms(),
			"Bridge attempt succeeded"
		);
		Some(attempt)
	}

	pub fn complete_no_route(&self, id: &str) -> Option<BridgeAttempt> {
		let attempt = self.finish(id, AttemptStatus::NoRoute, None)?;
		info!(
			attempt_id = %attempt.id,
			provider = %attempt.provider,
			operation = %attempt.operation,
			"Bridge attempt found no route"
		);
		Some(attempt)
	}

	pub fn fail(&self, id: &str, error: impl Into<String>) -> Option<BridgeAttempt> {
		let attempt = self.finish(id, AttemptStatus::Failed, Some(error.into()))?;
		warn!(
			attempt_id = %attempt.id,
			provider = %attempt.provider,
			operation = %attempt.operation,
			error = attempt.error.as_deref().unwrap_or_default(),
			"Bridge attempt failed"
		);
		Some(attempt)
	}

	fn finish(
		&self,
		id: &str,
		status: AttemptStatus,
		error: Option<String>,
	) -> Option<BridgeAttempt> {
		let (_, mut attempt) = self.active.remove(id)?;
		attempt.status = status;
		attempt.end_time = Some(Utc::now());
		attempt.error = error;
		Some(attempt)
	}

	pub fn get(&self, id: &str) -> Option<BridgeAttempt> {
		self.active.get(id).map(|attempt| attempt.clone())
	}

	/// Snapshot of every active attempt
	pub fn active(&self) -> Vec<BridgeAttempt> {
		self.prune_stale();
		self.active.iter().map(|entry| entry.value().clone()).collect()
	}

	pub fn len(&self) -> usize {
		self.active.len()
	}

	pub fn is_empty(&self) -> bool {
		self.active.is_empty()
	}

	pub fn clear(&self) {
		self.active.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bridge_types::chain::{BASE, POLYGON};

	#[test]
	fn test_attempt_lifecycle() {
		let tracker = AttemptTracker::new();
		let context = ExecutionContext::new(BASE, POLYGON);
		let id = tracker.start(Provider::Relay, OperationKind::Execute, &context);

		let active = tracker.get(&id).unwrap();
		assert_eq!(active.status, AttemptStatus::Pending);
		assert_eq!(active.context.session_id, context.session_id);

		assert!(tracker.update(
			&id,
			AttemptUpdate {
				source_tx_hash: Some("0xsource".to_string()),
				destination_tx_hash: None,
			}
		));

		let done = tracker.complete(&id).unwrap();
		assert_eq!(done.status, AttemptStatus::Success);
		assert_eq!(done.source_tx_hash.as_deref(), Some("0xsource"));
		assert!(done.end_time.is_some());
		assert!(tracker.is_empty());
		assert!(tracker.complete(&id).is_none());
	}

	#[test]
	fn test_no_route_and_failure_are_distinct() {
		let tracker = AttemptTracker::new();
		let context = ExecutionContext::new(BASE, POLYGON);

		let soft = tracker.start(Provider::Relay, OperationKind::Price, &context);
		let hard = tracker.start(Provider::Bungee, OperationKind::Price, &context);
		assert_eq!(tracker.len(), 2);

		let soft = tracker.complete_no_route(&soft).unwrap();
		let hard = tracker.fail(&hard, "HTTP 503").unwrap();
		assert_eq!(soft.status, AttemptStatus::NoRoute);
		assert_eq!(soft.error, None);
		assert_eq!(hard.status, AttemptStatus::Failed);
		assert_eq!(hard.error.as_deref(), Some("HTTP 503"));
		assert!(tracker.active().is_empty());
		assert!(!tracker.update(&hard.id, AttemptUpdate::default()));
	}

	#[test]
	fn test_start_sweeps_stale_attempts() {
		let tracker = AttemptTracker::with_max_age(Duration::ZERO);
		let context = ExecutionContext::new(BASE, POLYGON);

		let first = tracker.start(Provider::Relay, OperationKind::Quote, &context);
		let second = tracker.start(Provider::Bungee, OperationKind::Quote, &context);

		assert!(tracker.get(&first).is_none());
		assert!(tracker.get(&second).is_some());
		assert_eq!(tracker.len(), 1);
		assert_eq!(tracker.prune_stale(), 1);
		assert!(tracker.is_empty());
	}

	#[test]
	fn test_fresh_attempts_survive_sweep() {
		let tracker = AttemptTracker::new();
		let context = ExecutionContext::new(BASE, POLYGON);
		tracker.start(Provider::Relay, OperationKind::Price, &context);
		tracker.start(Provider::Bungee, OperationKind::Price, &context);

		assert_eq!(tracker.max_age(), Duration::from_millis(STALE_ATTEMPT_MAX_AGE_MS));
		assert_eq!(tracker.prune_stale(), 0);
		assert_eq!(tracker.active().len(), 2);
	}
}
