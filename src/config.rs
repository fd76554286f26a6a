//! Global configuration constants for the per-key limiter.
//!
//! Compile-time defaults live here. Runtime refill configuration is loaded
//! from JSON through [`FlatRefillConfig`](crate::refill::FlatRefillConfig).

/// Number of entity slots pre-allocated by [`Limiter::new`](crate::Limiter::new).
///
/// Avoids rehashing while the first wave of entities is seen. The map still
/// grows without bound past this point; there is no eviction.
pub const DEFAULT_BUCKET_CAPACITY: usize = 1_000;

/// Default starting balance for a newly seen entity.
pub const DEFAULT_INITIAL_TOKENS: f64 = 100.0;

/// Default ceiling that interval refills never push a balance past.
pub const DEFAULT_MAX_TOKENS: f64 = 100.0;

/// Default number of tokens credited per elapsed interval.
pub const DEFAULT_TOKENS_PER_INTERVAL: f64 = 10.0;

/// Default refill interval in milliseconds (one second).
pub const DEFAULT_INTERVAL_MS: u64 = 1_000;
