//! Configuration loading utilities

use crate::{ConfigValidationError, Settings};
use config::{Config, ConfigError, Environment, File};
use thiserror::Error;

/// Prefix for environment overrides, e.g. `BRIDGE__POLLING__MAX_ATTEMPTS=30`
pub const ENV_PREFIX: &str = "BRIDGE";
pub const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
	#[error("failed to read configuration: {0}")]
	Config(#[from] ConfigError),

	#[error("invalid configuration: {0}")]
	Validation(#[from] ConfigValidationError),
}

/// Load configuration from `config/config.*` plus `BRIDGE__*` environment overrides
pub fn load_config() -> Result<Settings, ConfigLoadError> {
	load_config_from("config/config")
}

/// Load configuration from the given file stem. A missing file falls back to defaults.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigLoadError> {
	let s = Config::builder()
		.add_source(File::with_name(path).required(false))
		.add_source(
			Environment::with_prefix(ENV_PREFIX)
				.separator(ENV_SEPARATOR)
				.try_parsing(true),
		)
		.build()?;

	let settings: Settings = s.try_deserialize()?;
	settings.validate()?;
	Ok(settings)
}

#[cfg(test)]
mod tests {
	use super::*;
	use bridge_types::Provider;
	use std::io::Write;

	#[test]
	fn test_missing_file_yields_defaults() {
		let settings = load_config_from("does/not/exist").unwrap();
		assert_eq!(settings.providers.len(), 2);
		assert_eq!(settings.polling.max_attempts, 60);
	}

	#[test]
	fn test_file_overrides_defaults() {
		let dir = std::env::temp_dir().join(format!("bridge-config-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("engine.json");
		let mut file = std::fs::File::create(&path).unwrap();
		write!(
			file,
			r#"{{
				"polling": {{ "max_attempts": 10, "interval_ms": 500 }},
				"providers": [
					{{
						"provider": "bungee",
						"priority": 1,
						"endpoint": "https://bungee.example",
						"supported_chains": {{ "origins": [8453], "destinations": [137] }}
					}}
				]
			}}"#
		)
		.unwrap();

		let stem = dir.join("engine");
		let settings = load_config_from(stem.to_str().unwrap()).unwrap();
		assert_eq!(settings.polling.max_attempts, 10);
		assert_eq!(settings.polling.interval_ms, 500);
		assert_eq!(settings.polling.max_interval_ms, 30_000);
		assert_eq!(settings.providers.len(), 1);
		assert_eq!(settings.providers[0].provider, Provider::Bungee);
		assert!(settings.providers[0].enabled);

		std::fs::remove_dir_all(&dir).unwrap();
	}

	#[test]
	fn test_invalid_file_is_rejected() {
		let dir = std::env::temp_dir().join(format!("bridge-config-bad-{}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("engine.json");
		std::fs::write(&path, r#"{ "cache": { "max_size": 0 } }"#).unwrap();

		let stem = dir.join("engine");
		let result = load_config_from(stem.to_str().unwrap());
		assert!(matches!(
			result,
			Err(ConfigLoadError::Validation(
				ConfigValidationError::ZeroCacheSize
			))
		));

		std::fs::remove_dir_all(&dir).unwrap();
	}
}
