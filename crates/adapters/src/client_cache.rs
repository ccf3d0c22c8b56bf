//! HTTP client cache for connection reuse
//!
//! One pooled client per provider configuration, expired after a TTL.

use bridge_types::{AdapterError, AdapterResult, Provider, ProviderConfig, SecretString};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

const USER_AGENT: &str = concat!("bridge-engine/", env!("CARGO_PKG_VERSION"));

/// Everything that makes two clients different
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientConfig {
	pub base_url: String,
	pub provider: Provider,
	pub timeout_ms: u64,
	pub max_idle_per_host: usize,
	pub keep_alive_timeout_ms: u64,
	pub headers: Vec<(String, String)>,
}

impl From<&ProviderConfig> for ClientConfig {
	fn from(config: &ProviderConfig) -> Self {
		Self {
			base_url: config.endpoint.clone(),
			provider: config.provider,
			timeout_ms: config.timeouts.request_ms,
			max_idle_per_host: 10,
			keep_alive_timeout_ms: 90_000,
			headers: vec![
				("User-Agent".to_string(), USER_AGENT.to_string()),
				("Accept".to_string(), "application/json".to_string()),
			],
		}
	}
}

/// Authentication attached to every request of a client
#[derive(Debug, Clone)]
pub enum AuthConfig {
	None,
	/// Static key sent in a custom header
	ApiKey { header: String, key: SecretString },
}

impl AuthConfig {
	pub fn api_key(header: &str, key: SecretString) -> Self {
		Self::ApiKey {
			header: header.to_string(),
			key,
		}
	}

	/// `x-api-key` auth when the provider has a key configured
	pub fn from_provider(config: &ProviderConfig) -> Self {
		match &config.api_key {
			Some(key) => Self::api_key("x-api-key", key.clone()),
			None => Self::None,
		}
	}
}

#[derive(Debug, Clone)]
struct CachedClient {
	client: Arc<Client>,
	created_at: Instant,
}

impl CachedClient {
	fn is_expired(&self, ttl: Duration) -> bool {
		self.created_at.elapsed() > ttl
	}
}

/// Thread-safe HTTP client cache with TTL
#[derive(Clone, Debug)]
pub struct ClientCache {
	clients: Arc<DashMap<ClientConfig, CachedClient>>,
	ttl: Duration,
}

impl ClientCache {
	/// Cache with a 30 minute TTL
	pub fn new() -> Self {
		Self::with_ttl(Duration::from_secs(30 * 60))
	}

	pub fn with_ttl(ttl: Duration) -> Self {
		Self {
			clients: Arc::new(DashMap::new()),
			ttl,
		}
	}

	/// Get or create a client for the given configuration
	pub fn get_client(&self, config: &ClientConfig) -> AdapterResult<Arc<Client>> {
		self.clients
			.remove_if(config, |_, cached| cached.is_expired(self.ttl));

		if let Some(cached) = self.clients.get(config) {
			return Ok(cached.client.clone());
		}

		debug!(provider = %config.provider, "Creating HTTP client for {}", config.base_url);
		let client = Arc::new(Self::build_client(config)?);

		// Another task may have raced us here
		match self.clients.entry(config.clone()) {
			Entry::Occupied(entry) => Ok(entry.get().client.clone()),
			Entry::Vacant(entry) => {
				entry.insert(CachedClient {
					client: client.clone(),
					created_at: Instant::now(),
				});
				Ok(client)
			},
		}
	}

	/// Client for a provider, with its authentication headers applied
	pub fn get_client_with_auth(
		&self,
		provider_config: &ProviderConfig,
		auth: &AuthConfig,
	) -> AdapterResult<Arc<Client>> {
		let mut config = ClientConfig::from(provider_config);
		if let AuthConfig::ApiKey { header, key } = auth {
			config
				.headers
				.push((header.clone(), key.expose_secret().to_string()));
		}
		self.get_client(&config)
	}

	fn build_client(config: &ClientConfig) -> AdapterResult<Client> {
		let mut header_map = reqwest::header::HeaderMap::new();
		for (key, value) in &config.headers {
			let name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
				AdapterError::ConfigError {
					reason: format!("invalid header name '{}': {}", key, e),
				}
			})?;
			let value = reqwest::header::HeaderValue::from_str(value).map_err(|e| {
				AdapterError::ConfigError {
					reason: format!("invalid value for header '{}': {}", key, e),
				}
			})?;
			header_map.insert(name, value);
		}

		ClientBuilder::new()
			.timeout(Duration::from_millis(config.timeout_ms))
			.pool_max_idle_per_host(config.max_idle_per_host)
			.pool_idle_timeout(Duration::from_millis(config.keep_alive_timeout_ms))
			.tcp_keepalive(Duration::from_secs(60))
			.default_headers(header_map)
			.build()
			.map_err(AdapterError::HttpError)
	}

	/// Drop expired clients, returning how many were removed
	pub fn cleanup_expired(&self) -> usize {
		let before = self.clients.len();
		self.clients.retain(|_, cached| !cached.is_expired(self.ttl));
		before.saturating_sub(self.clients.len())
	}

	pub fn clear(&self) {
		self.clients.clear();
	}

	pub fn len(&self) -> usize {
		self.clients.len()
	}

	pub fn is_empty(&self) -> bool {
		self.clients.is_empty()
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}
}

impl Default for ClientCache {
	fn default() -> Self {
		Self::new()
	}
}

lazy_static::lazy_static! {
	static ref GLOBAL_CLIENT_CACHE: ClientCache = ClientCache::new();
}

/// Process-wide cache shared by adapters that are not given one
pub fn global_client_cache() -> ClientCache {
	GLOBAL_CLIENT_CACHE.clone()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn relay_config() -> ProviderConfig {
		ProviderConfig::new(Provider::Relay, 1, "https://api.relay.link")
	}

	#[test]
	fn test_client_config_from_provider() {
		let config = ClientConfig::from(&relay_config());
		assert_eq!(config.base_url, "https://api.relay.link");
		assert_eq!(config.timeout_ms, 15_000);
		assert!(config.headers.iter().any(|(k, _)| k == "User-Agent"));
	}

	#[tokio::test]
	async fn test_client_reuse_and_clear() {
		let cache = ClientCache::new();
		let config = ClientConfig::from(&relay_config());

		let first = cache.get_client(&config).unwrap();
		let second = cache.get_client(&config).unwrap();
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(cache.len(), 1);

		cache.clear();
		assert!(cache.is_empty());
	}

	#[tokio::test]
	async fn test_expired_client_is_replaced() {
		let cache = ClientCache::with_ttl(Duration::from_millis(20));
		let config = ClientConfig::from(&relay_config());

		let first = cache.get_client(&config).unwrap();
		std::thread::sleep(Duration::from_millis(40));
		assert_eq!(cache.cleanup_expired(), 1);

		let second = cache.get_client(&config).unwrap();
		assert!(!Arc::ptr_eq(&first, &second));
	}

	#[tokio::test]
	async fn test_api_key_separates_clients() {
		let cache = ClientCache::new();
		let config = ProviderConfig::new(Provider::Bungee, 2, "https://api.socket.tech/v2");

		let anonymous = cache.get_client_with_auth(&config, &AuthConfig::None).unwrap();
		let keyed = cache
			.get_client_with_auth(&config, &AuthConfig::api_key("x-api-key", "k1".into()))
			.unwrap();
		let keyed_again = cache
			.get_client_with_auth(&config, &AuthConfig::api_key("x-api-key", "k1".into()))
			.unwrap();

		assert!(!Arc::ptr_eq(&anonymous, &keyed));
		assert!(Arc::ptr_eq(&keyed, &keyed_again));
	}

	#[test]
	fn test_auth_from_provider_config() {
		let config = ProviderConfig::new(Provider::Bungee, 2, "https://api.socket.tech/v2")
			.with_api_key(SecretString::from("secret"));
		assert!(matches!(
			AuthConfig::from_provider(&config),
			AuthConfig::ApiKey { ref header, .. } if header == "x-api-key"
		));
		assert!(matches!(
			AuthConfig::from_provider(&relay_config()),
			AuthConfig::None
		));
	}
}
