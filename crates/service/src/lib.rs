//! Bridge Service
//!
//! Provider selection, gas escalation, attempt tracking and the fallback
//! orchestrator that ties the adapters together.

pub mod attempt_tracker;
pub mod errors;
pub mod gas;
pub mod orchestrator;
pub mod reporter;
pub mod selector;

pub use attempt_tracker::{
	AttemptContext, AttemptStatus, AttemptTracker, AttemptUpdate, BridgeAttempt,
};
pub use errors::BridgeError;
pub use gas::{GasEscalator, GasPolicy};
pub use orchestrator::{BridgeService, EngineSnapshot, OrchestratorOptions};
pub use reporter::TracingErrorReporter;
pub use selector::ProviderSelector;
