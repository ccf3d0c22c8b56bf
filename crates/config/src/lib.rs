//! Bridge Configuration
//!
//! Configuration management and startup utilities for the bridge execution engine.

pub mod configurable_value;
pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use configurable_value::{ConfigurableValue, ConfigurableValueError, ValueType};
pub use loader::{load_config, load_config_from, ConfigLoadError};
pub use settings::{
	CacheSettings, ConfigValidationError, DiagnosticsSettings, GasSettings, LogFormat,
	LoggingSettings, OrchestratorSettings, PollingSettings, ProviderSettings, RouteSettings,
	Settings,
};
pub use startup_logger::{log_provider_summary, log_service_info, log_startup_complete};
