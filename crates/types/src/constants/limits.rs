//! Global limits and defaults for configuration and runtime

/// Default per-request timeout for provider APIs in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000; // 15s

/// Upper bound on providers tried for one logical operation
pub const DEFAULT_MAX_PROVIDERS_TO_TRY: usize = 2;

/// Wall-clock deadline for one execution, including completion polling
pub const DEFAULT_EXECUTION_TIMEOUT_MS: u64 = 300_000; // 5 minutes

/// Attempts older than this are swept from the tracker as abandoned
pub const STALE_ATTEMPT_MAX_AGE_MS: u64 = 2 * DEFAULT_EXECUTION_TIMEOUT_MS;

/// Status polling defaults
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_POLL_BACKOFF_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_POLL_MAX_INTERVAL_MS: u64 = 30_000;

/// Quote cache defaults
pub const DEFAULT_QUOTE_CACHE_TTL_MS: u64 = 30_000; // 30s
pub const DEFAULT_QUOTE_CACHE_MAX_SIZE: usize = 50;

/// Gas fallbacks used when the latest block cannot be read
pub const FALLBACK_MAX_PRIORITY_FEE_WEI: u128 = 1_500_000_000; // 1.5 gwei
pub const FALLBACK_MAX_FEE_WEI: u128 = 3_000_000_000; // 3 gwei

/// Max fee is this percentage of the latest base fee plus the priority fee
pub const DEFAULT_BASE_FEE_MULTIPLIER_PERCENT: u128 = 200;

/// Time allowed for a bundler to include a user operation
pub const DEFAULT_USER_OPERATION_TIMEOUT_MS: u64 = 120_000; // 2 minutes

/// Reason recorded when a provider reports no route
pub const NO_ROUTES_REASON: &str = "no routes available";

/// Reason recorded when the caller drops an operation before it resolves
pub const ABANDONED_REASON: &str = "operation abandoned by caller";
