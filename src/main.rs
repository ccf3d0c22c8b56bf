//! Bridge Engine
//!
//! Loads configuration, builds every provider adapter and reports provider
//! ordering and health for the configured probe routes.

use bridge_engine::BridgeEngineBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	BridgeEngineBuilder::new().run_diagnostics().await
}
