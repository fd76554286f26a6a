//! Error types returned by limiter operations.
//!
//! Every failure is a recoverable [`LimiterError`]; no operation panics on bad
//! input. A rejected request is *not* an error: `allow` reports it as
//! `Ok(false)`.

use thiserror::Error;

/// Error returned by [`Limiter`](crate::Limiter) operations and refill policies.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LimiterError {
    /// A cost, penalty, or reward was below zero.
    #[error("{operation}: amount must be non-negative, got {amount}")]
    NegativeAmount {
        /// Name of the rejecting operation (`allow`, `penalize`, ...).
        operation: &'static str,
        /// The offending value.
        amount: f64,
    },
    /// A cost, penalty, or reward was NaN or infinite.
    #[error("{operation}: amount must be finite")]
    InvalidAmount {
        /// Name of the rejecting operation.
        operation: &'static str,
    },
    /// The refill policy could not bring a bucket up to date.
    #[error("refill failed: {0}")]
    Refill(String),
    /// A refill configuration document could not be parsed.
    #[error("invalid refill config: {0}")]
    Config(#[from] serde_json::Error),
    /// A refill configuration field holds an unusable value.
    #[error("invalid refill config: {field} must be a non-negative number, got {value}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// The offending value.
        value: f64,
    },
}

/// Reject negative and non-finite amounts.
pub(crate) fn check_amount(operation: &'static str, amount: f64) -> Result<(), LimiterError> {
    if !amount.is_finite() {
        return Err(LimiterError::InvalidAmount { operation });
    }
    if amount < 0.0 {
        return Err(LimiterError::NegativeAmount { operation, amount });
    }
    Ok(())
}
