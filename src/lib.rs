//! # perkey-ratelimit
//!
//! In-memory, per-entity token bucket rate limiter.
//!
//! Every entity (user, IP address, API key, any hashable value) owns an
//! independent token balance. A request with a cost is allowed when the
//! balance covers it, after the balance has been topped up by a pluggable
//! [`Refiller`] policy.
//!
//! ## Architecture
//!
//! ```text
//! allow(entity, cost) → Limiter → RwLock<HashMap<K, Arc<Mutex<Bucket>>>>
//!                                → Mutex<Bucket> → Refiller::refill → compare + debit
//! penalize / reward   → Limiter → Mutex<Bucket> → add delta (no refill)
//! ```
//!
//! ## Example
//!
//! ```
//! use perkey_ratelimit::{Limiter, NoRefill};
//!
//! let limiter = Limiter::new(NoRefill::new(2.0));
//! let user = "lewis".to_string();
//! assert!(limiter.allow(&user, 1.0).unwrap());
//! assert!(limiter.allow(&user, 1.0).unwrap());
//! assert!(limiter.reject(&user, 1.0).unwrap());
//!
//! limiter.penalize(&user, 3.0).unwrap();
//! assert_eq!(limiter.balance(&user), -3.0);
//! ```
//!
//! State is process-local and transient. Nothing is evicted: the number of
//! buckets grows with the number of distinct entities seen.

/// Per-entity token balance record.
pub mod bucket;
/// Global configuration constants: defaults for map sizing and flat refill.
pub mod config;
/// Error taxonomy for limiter operations and refill policies.
pub mod error;
/// The entity-keyed bucket store and its two-tier locking.
pub mod limiter;
/// Refill policies: the `Refiller` trait, `NoRefill`, and `FlatRefill`.
pub mod refill;

pub use bucket::Bucket;
pub use error::LimiterError;
pub use limiter::Limiter;
pub use refill::{FlatRefill, FlatRefillConfig, NoRefill, Refiller};
