//! Request helpers shared by the REST adapters

use bridge_types::{AdapterError, AdapterResult};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

/// Join `path` onto `base`, keeping any path prefix `base` already has
pub(crate) fn build_url(base: &str, path: &str) -> AdapterResult<Url> {
	let normalized = if base.ends_with('/') {
		base.to_string()
	} else {
		format!("{}/", base)
	};
	let base = Url::parse(&normalized).map_err(|e| AdapterError::ConfigError {
		reason: format!("invalid endpoint '{}': {}", normalized, e),
	})?;
	base.join(path.trim_start_matches('/'))
		.map_err(|e| AdapterError::ConfigError {
			reason: format!("invalid path '{}': {}", path, e),
		})
}

/// Body text of a successful response, or an `HttpStatusError` carrying it
pub(crate) async fn read_body(response: Response) -> AdapterResult<String> {
	let status = response.status();
	let body = response.text().await?;
	if !status.is_success() {
		return Err(AdapterError::from_http_failure(status.as_u16(), body));
	}
	Ok(body)
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &str, context: &str) -> AdapterResult<T> {
	serde_json::from_str(body).map_err(|e| AdapterError::InvalidResponse {
		reason: format!("failed to parse {} response: {}", context, e),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_build_url_keeps_base_path() {
		assert_eq!(
			build_url("https://api.socket.tech/v2", "quote")
				.unwrap()
				.as_str(),
			"https://api.socket.tech/v2/quote"
		);
		assert_eq!(
			build_url("https://api.relay.link/", "/intents/status/v2")
				.unwrap()
				.as_str(),
			"https://api.relay.link/intents/status/v2"
		);
		assert!(build_url("not a url", "quote").is_err());
	}
}
