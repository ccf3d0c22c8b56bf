//! Quote request cache
//!
//! Two layers keyed by the full identity of a request, provider included:
//! - in-flight: concurrent identical requests share one underlying future
//! - completed: successful quotes reused until they pass the TTL, evicted
//!   least-recently-accessed first once `max_size` is exceeded
//!
//! Expired entries in both layers are swept on every access.

use std::sync::Arc;
use std::time::Duration;

use bridge_types::constants::limits::{DEFAULT_QUOTE_CACHE_MAX_SIZE, DEFAULT_QUOTE_CACHE_TTL_MS};
use bridge_types::{
	AdapterError, AdapterResult, BridgeParams, ChainId, OperationKind, Provider, UnifiedQuote,
	U256,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::time::Instant;
use tracing::debug;

type SharedFetch = Shared<BoxFuture<'static, Result<Option<UnifiedQuote>, Arc<AdapterError>>>>;

/// Semantic identity of a price or quote request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuoteCacheKey {
	pub provider: Provider,
	pub operation: OperationKind,
	pub from_chain_id: ChainId,
	pub to_chain_id: ChainId,
	pub from_token: String,
	pub to_token: String,
	pub amount: U256,
	pub sender: String,
	pub recipient: String,
}

impl QuoteCacheKey {
	pub fn new(provider: Provider, operation: OperationKind, params: &BridgeParams) -> Self {
		Self {
			provider,
			operation,
			from_chain_id: params.from_chain_id,
			to_chain_id: params.to_chain_id,
			from_token: params.from_token.to_ascii_lowercase(),
			to_token: params.to_token.to_ascii_lowercase(),
			amount: params.amount.clone(),
			sender: params.sender.to_ascii_lowercase(),
			recipient: params.recipient.to_ascii_lowercase(),
		}
	}
}

#[derive(Clone)]
struct InFlight {
	future: SharedFetch,
	started_at: Instant,
}

#[derive(Debug, Clone)]
struct CacheEntry {
	quote: UnifiedQuote,
	timestamp: Instant,
	last_accessed: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteCacheConfig {
	pub ttl: Duration,
	pub max_size: usize,
}

impl Default for QuoteCacheConfig {
	fn default() -> Self {
		Self {
			ttl: Duration::from_millis(DEFAULT_QUOTE_CACHE_TTL_MS),
			max_size: DEFAULT_QUOTE_CACHE_MAX_SIZE,
		}
	}
}

/// Shared store injected into every adapter
#[derive(Clone)]
pub struct QuoteCache {
	in_flight: Arc<DashMap<QuoteCacheKey, InFlight>>,
	completed: Arc<DashMap<QuoteCacheKey, CacheEntry>>,
	config: QuoteCacheConfig,
}

impl std::fmt::Debug for QuoteCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("QuoteCache")
			.field("in_flight", &self.in_flight.len())
			.field("completed", &self.completed.len())
			.field("config", &self.config)
			.finish()
	}
}

impl Default for QuoteCache {
	fn default() -> Self {
		Self::new(QuoteCacheConfig::default())
	}
}

impl QuoteCache {
	pub fn new(config: QuoteCacheConfig) -> Self {
		Self {
			in_flight: Arc::new(DashMap::new()),
			completed: Arc::new(DashMap::new()),
			config,
		}
	}

	pub fn config(&self) -> QuoteCacheConfig {
		self.config
	}

	/// Serve `key` from the completed layer, join an in-flight request for it,
	/// or start `fetch`. Successful quotes are stored in the completed layer.
	pub async fn get_or_fetch<F>(
		&self,
		key: QuoteCacheKey,
		fetch: F,
	) -> AdapterResult<Option<UnifiedQuote>>
	where
		F: FnOnce() -> BoxFuture<'static, AdapterResult<Option<UnifiedQuote>>>,
	{
		let now = Instant::now();
		self.sweep(now);

		if let Some(quote) = self.get(&key, now) {
			debug!(provider = %key.provider, operation = %key.operation, "Quote served from cache");
			return Ok(Some(quote));
		}

		let (future, leader) = match self.in_flight.entry(key.clone()) {
			Entry::Occupied(mut occupied) => {
				if self.is_fresh(occupied.get().started_at, now) {
					debug!(provider = %key.provider, operation = %key.operation, "Joining in-flight quote request");
					(occupied.get().future.clone(), false)
				} else {
					let future = Self::share(fetch);
					occupied.insert(InFlight {
						future: future.clone(),
						started_at: now,
					});
					(future, true)
				}
			},
			Entry::Vacant(vacant) => {
				let future = Self::share(fetch);
				vacant.insert(InFlight {
					future: future.clone(),
					started_at: now,
				});
				(future, true)
			},
		};

		let result = future.clone().await;

		if leader {
			self.in_flight
				.remove_if(&key, |_, entry| entry.future.ptr_eq(&future));
			if let Ok(Some(quote)) = &result {
				self.set(key, quote.clone(), Instant::now());
			}
		}

		result.map_err(AdapterError::from_shared)
	}

	fn share<F>(fetch: F) -> SharedFetch
	where
		F: FnOnce() -> BoxFuture<'static, AdapterResult<Option<UnifiedQuote>>>,
	{
		fetch().map(|result| result.map_err(Arc::new)).boxed().shared()
	}

	fn is_fresh(&self, since: Instant, now: Instant) -> bool {
		now.saturating_duration_since(since) < self.config.ttl
	}

	/// Completed quote for `key` if still within the TTL. Touches `last_accessed`.
	pub fn get(&self, key: &QuoteCacheKey, now: Instant) -> Option<UnifiedQuote> {
		let mut entry = self.completed.get_mut(key)?;
		if !self.is_fresh(entry.timestamp, now) {
			return None;
		}
		entry.last_accessed = now;
		Some(entry.quote.clone())
	}

	/// Store a completed quote, then evict down to `max_size` by oldest
	/// `last_accessed`. The entry just written is never the one evicted.
	pub fn set(&self, key: QuoteCacheKey, quote: UnifiedQuote, now: Instant) {
		self.completed.insert(
			key.clone(),
			CacheEntry {
				quote,
				timestamp: now,
				last_accessed: now,
			},
		);

		while self.completed.len() > self.config.max_size {
			let victim = self
				.completed
				.iter()
				.filter(|entry| entry.key() != &key)
				.min_by_key(|entry| entry.value().last_accessed)
				.map(|entry| entry.key().clone());
			match victim {
				Some(victim) => {
					self.completed.remove(&victim);
				},
				None => break,
			}
		}
	}

	/// Remove expired entries from both layers, returning how many were dropped
	pub fn sweep(&self, now: Instant) -> usize {
		let before = self.in_flight.len() + self.completed.len();
		self.in_flight
			.retain(|_, entry| self.is_fresh(entry.started_at, now));
		self.completed
			.retain(|_, entry| self.is_fresh(entry.timestamp, now));
		before.saturating_sub(self.in_flight.len() + self.completed.len())
	}

	pub fn clear(&self) {
		self.in_flight.clear();
		self.completed.clear();
	}

	/// Number of completed quotes held
	pub fn len(&self) -> usize {
		self.completed.len()
	}

	pub fn is_empty(&self) -> bool {
		self.completed.is_empty()
	}

	pub fn in_flight_len(&self) -> usize {
		self.in_flight.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bridge_types::test_utils::{BridgeParamsBuilder, QuoteBuilder};
	use bridge_types::ErrorCategory;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn key(provider: Provider, amount: u128) -> QuoteCacheKey {
		let params = BridgeParamsBuilder::new().amount(amount).build();
		QuoteCacheKey::new(provider, OperationKind::Price, &params)
	}

	fn counted_fetch(
		calls: Arc<AtomicUsize>,
		provider: Provider,
		delay: Duration,
	) -> impl FnOnce() -> BoxFuture<'static, AdapterResult<Option<UnifiedQuote>>> {
		move || {
			async move {
				calls.fetch_add(1, Ordering::SeqCst);
				tokio::time::sleep(delay).await;
				let params = BridgeParamsBuilder::new().build();
				Ok(Some(QuoteBuilder::new(provider, &params).build()))
			}
			.boxed()
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_concurrent_identical_requests_share_one_fetch() {
		let cache = QuoteCache::default();
		let calls = Arc::new(AtomicUsize::new(0));

		let (first, second) = tokio::join!(
			cache.get_or_fetch(
				key(Provider::Relay, 100),
				counted_fetch(calls.clone(), Provider::Relay, Duration::from_millis(200))
			),
			cache.get_or_fetch(
				key(Provider::Relay, 100),
				counted_fetch(calls.clone(), Provider::Relay, Duration::from_millis(200))
			),
		);

		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(first.unwrap(), second.unwrap());
		assert_eq!(cache.in_flight_len(), 0);
		assert_eq!(cache.len(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_provider_is_part_of_the_key() {
		let cache = QuoteCache::default();
		let calls = Arc::new(AtomicUsize::new(0));

		let (relay, bungee) = tokio::join!(
			cache.get_or_fetch(
				key(Provider::Relay, 100),
				counted_fetch(calls.clone(), Provider::Relay, Duration::from_millis(50))
			),
			cache.get_or_fetch(
				key(Provider::Bungee, 100),
				counted_fetch(calls.clone(), Provider::Bungee, Duration::from_millis(50))
			),
		);

		assert_eq!(calls.load(Ordering::SeqCst), 2);
		assert_eq!(relay.unwrap().unwrap().provider, Provider::Relay);
		assert_eq!(bungee.unwrap().unwrap().provider, Provider::Bungee);
	}

	#[tokio::test(start_paused = true)]
	async fn test_completed_quote_reused_until_ttl() {
		let cache = QuoteCache::new(QuoteCacheConfig {
			ttl: Duration::from_secs(30),
			max_size: 10,
		});
		let calls = Arc::new(AtomicUsize::new(0));
		let k = key(Provider::Relay, 100);

		cache
			.get_or_fetch(k.clone(), counted_fetch(calls.clone(), Provider::Relay, Duration::ZERO))
			.await
			.unwrap();
		tokio::time::advance(Duration::from_secs(10)).await;
		cache
			.get_or_fetch(k.clone(), counted_fetch(calls.clone(), Provider::Relay, Duration::ZERO))
			.await
			.unwrap();
		assert_eq!(calls.load(Ordering::SeqCst), 1);

		tokio::time::advance(Duration::from_secs(25)).await;
		cache
			.get_or_fetch(k, counted_fetch(calls.clone(), Provider::Relay, Duration::ZERO))
			.await
			.unwrap();
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn test_no_route_and_errors_are_not_stored() {
		let cache = QuoteCache::default();

		let none = cache
			.get_or_fetch(key(Provider::Relay, 1), || async { Ok(None) }.boxed())
			.await
			.unwrap();
		assert!(none.is_none());

		let (a, b) = tokio::join!(
			cache.get_or_fetch(key(Provider::Relay, 2), || {
				async {
					tokio::time::sleep(Duration::from_millis(10)).await;
					Err(AdapterError::from_http_failure(503, "down"))
				}
				.boxed()
			}),
			cache.get_or_fetch(key(Provider::Relay, 2), || {
				async { Ok(None) }.boxed()
			}),
		);
		assert_eq!(a.unwrap_err().category(), ErrorCategory::NetworkError);
		assert_eq!(b.unwrap_err().category(), ErrorCategory::NetworkError);
		assert!(cache.is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn test_lru_eviction_uses_last_accessed() {
		let cache = QuoteCache::new(QuoteCacheConfig {
			ttl: Duration::from_secs(60),
			max_size: 2,
		});
		let params = BridgeParamsBuilder::new().build();
		let quote = QuoteBuilder::new(Provider::Relay, &params).build();
		let (a, b, c) = (
			key(Provider::Relay, 1),
			key(Provider::Relay, 2),
			key(Provider::Relay, 3),
		);

		let start = Instant::now();
		cache.set(a.clone(), quote.clone(), start);
		cache.set(b.clone(), quote.clone(), start + Duration::from_secs(1));
		// `a` is older but was read more recently than `b`
		assert!(cache.get(&a, start + Duration::from_secs(2)).is_some());
		cache.set(c.clone(), quote, start + Duration::from_secs(3));

		let now = start + Duration::from_secs(4);
		assert!(cache.get(&a, now).is_some());
		assert!(cache.get(&b, now).is_none());
		assert!(cache.get(&c, now).is_some());
	}

	#[tokio::test(start_paused = true)]
	async fn test_new_entry_survives_its_own_insert() {
		let cache = QuoteCache::new(QuoteCacheConfig {
			ttl: Duration::from_secs(60),
			max_size: 1,
		});
		let params = BridgeParamsBuilder::new().build();
		let quote = QuoteBuilder::new(Provider::Relay, &params).build();
		let now = Instant::now();

		// Older timestamp and older access than the existing entry
		cache.set(key(Provider::Relay, 1), quote.clone(), now + Duration::from_secs(5));
		cache.set(key(Provider::Relay, 2), quote, now);

		assert_eq!(cache.len(), 1);
		assert!(cache.get(&key(Provider::Relay, 2), now).is_some());
	}

	#[tokio::test(start_paused = true)]
	async fn test_sweep_and_clear() {
		let cache = QuoteCache::new(QuoteCacheConfig {
			ttl: Duration::from_secs(1),
			max_size: 10,
		});
		let params = BridgeParamsBuilder::new().build();
		let quote = QuoteBuilder::new(Provider::Relay, &params).build();
		let now = Instant::now();
		cache.set(key(Provider::Relay, 1), quote.clone(), now);
		cache.set(key(Provider::Relay, 2), quote, now);

		assert_eq!(cache.sweep(now + Duration::from_millis(500)), 0);
		assert_eq!(cache.sweep(now + Duration::from_secs(2)), 2);
		assert!(cache.is_empty());

		cache.clear();
		assert_eq!(cache.in_flight_len(), 0);
	}
}
