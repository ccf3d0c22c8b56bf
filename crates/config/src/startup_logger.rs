//! Startup logging for the bridge engine

use std::env;
use tracing::info;

use crate::Settings;

/// Logs service information at startup
pub fn log_service_info() {
	// Root package name, not this crate's
	let service_name = "bridge-engine";
	let service_version = env!("CARGO_PKG_VERSION");

	info!("=== Bridge Engine Starting ===");
	info!("🚀 Service: {} v{}", service_name, service_version);
	info!("💻 Platform: {} ({})", env::consts::OS, env::consts::ARCH);

	if let Ok(cwd) = env::current_dir() {
		info!("📁 Working Directory: {}", cwd.display());
	}
	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("🔧 Log Level: {}", rust_log);
	}

	info!(
		"🕒 Started at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs the configured providers in priority order
pub fn log_provider_summary(settings: &Settings) {
	let mut providers: Vec<_> = settings.providers.iter().collect();
	providers.sort_by_key(|p| p.priority);

	for provider in providers {
		info!(
			"🌉 Provider {} (priority {}): {} [{}] origins={} destinations={}",
			provider.provider,
			provider.priority,
			provider.endpoint,
			if provider.enabled { "enabled" } else { "disabled" },
			provider.supported_chains.origins.len(),
			provider.supported_chains.destinations.len(),
		);
	}
	info!(
		"🔁 Polling: {} attempts, {}ms x{} up to {}ms",
		settings.polling.max_attempts,
		settings.polling.interval_ms,
		settings.polling.backoff_multiplier,
		settings.polling.max_interval_ms
	);
}

/// Logs startup completion
pub fn log_startup_complete(provider_count: usize) {
	info!("✅ Bridge Engine Ready");
	info!("📡 {} provider adapter(s) registered", provider_count);
}
