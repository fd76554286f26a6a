//! Per-entity token balance.

use std::time::Instant;

/// Mutable token state for one entity.
///
/// A `Bucket` lives inside the [`Limiter`](crate::Limiter) behind its own
/// mutex. Refill policies receive it by `&mut` while that mutex is held.
/// `tokens` may go negative after a penalty or above the policy ceiling after
/// a reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    /// Current balance.
    pub tokens: f64,
    /// Point in time up to which refills have been credited.
    pub last_refill: Instant,
}

impl Bucket {
    /// Creates a bucket holding `tokens`, refilled as of now.
    pub fn new(tokens: f64) -> Self {
        Self::with_last_refill(tokens, Instant::now())
    }

    /// Creates a bucket holding `tokens`, refilled as of `last_refill`.
    pub fn with_last_refill(tokens: f64, last_refill: Instant) -> Self {
        Self {
            tokens,
            last_refill,
        }
    }
}
