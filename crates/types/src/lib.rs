//! Bridge Types
//!
//! Shared models and traits for the multi-provider bridge execution engine.
//! This crate contains the domain models, the adapter contract and the
//! external collaborator traits.

pub mod adapters;
pub mod chain;
pub mod constants;
pub mod context;
pub mod execution;
pub mod gas;
pub mod models;
pub mod normalization;
pub mod provider;
pub mod quote;
pub mod reporting;
pub mod wallet;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export chrono and serde_json for convenience
pub use chrono;
pub use serde_json;
pub use tokio_util::sync::CancellationToken;

pub use adapters::{
	AdapterError, AdapterResult, BridgeAdapter, ErrorCategory, ExecutionRequest,
};
pub use chain::ChainId;
pub use context::{ExecutionContext, FallbackAttempt, OperationKind, RouteSelection};
pub use execution::{
	BridgeStatus, ExecutionResult, ProgressEvent, ProgressReporter, StatusReport,
	SubmissionPath,
};
pub use gas::{BlockFees, GasOracle, GasOracleError, GasPrice};
pub use models::{SecretString, U256};
pub use normalization::NormalizationRules;
pub use provider::{
	Provider, ProviderCapabilities, ProviderConfig, ProviderTimeouts, RetryPolicy,
	SupportedChains,
};
pub use quote::{
	BridgeParams, CurrencyAmount, FeeAmount, QuoteDetails, QuoteFees, QuoteStep, StepItem,
	TransactionParams, UnifiedQuote,
};
pub use reporting::{ErrorReport, ErrorReporter};
pub use wallet::{
	UserOperationCall, UserOperationReceipt, WalletClient, WalletError, WalletKind,
};
