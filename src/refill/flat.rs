//! Flat interval refill: the same schedule for every entity.
//!
//! Tokens accrue in whole intervals only. When `n` intervals have elapsed
//! since a bucket's `last_refill`, the bucket gains
//! `n * tokens_per_interval` tokens (capped at `max_tokens`) and its
//! `last_refill` moves forward by exactly `n * interval`. The partial interval
//! that remains is carried over to the next call instead of being dropped.

use super::Refiller;
use crate::bucket::Bucket;
use crate::config;
use crate::error::LimiterError;
use serde::Deserialize;
use std::time::{Duration, Instant};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Refills `tokens_per_interval` tokens every `interval`, up to `max_tokens`.
///
/// `initial_tokens` may differ from `max_tokens`: starting above the ceiling
/// gives new entities a one-off burst, starting below it makes them earn
/// their first requests. A zero `interval` disables refill entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatRefill {
    /// Balance given to an entity when its bucket is created.
    pub initial_tokens: f64,
    /// Ceiling applied to the balance after every refill.
    pub max_tokens: f64,
    /// Tokens credited per whole elapsed interval.
    pub tokens_per_interval: f64,
    /// Length of one refill interval.
    pub interval: Duration,
}

impl FlatRefill {
    /// Creates a policy from its four parameters.
    pub fn new(
        initial_tokens: f64,
        max_tokens: f64,
        tokens_per_interval: f64,
        interval: Duration,
    ) -> Self {
        Self {
            initial_tokens,
            max_tokens,
            tokens_per_interval,
            interval,
        }
    }

    /// Builds a policy from a deserialized [`FlatRefillConfig`].
    pub fn from_config(config: &FlatRefillConfig) -> Self {
        Self::new(
            config.initial_tokens,
            config.max_tokens,
            config.tokens_per_interval,
            Duration::from_millis(config.interval_ms),
        )
    }

    /// Applies every whole interval elapsed between `bucket.last_refill` and `now`.
    ///
    /// The result is capped at `max_tokens`, so a balance pushed above the
    /// ceiling by a reward or a large `initial_tokens` is brought back down
    /// once a refill is due.
    pub fn refill_at(&self, bucket: &mut Bucket, now: Instant) {
        let interval = self.interval.as_nanos();
        if interval == 0 {
            return;
        }
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let intervals = elapsed.as_nanos() / interval;
        if intervals == 0 {
            return;
        }

        let credited = intervals as f64 * self.tokens_per_interval;
        bucket.tokens = (bucket.tokens + credited).min(self.max_tokens);
        bucket.last_refill += duration_from_nanos(intervals * interval);
    }
}

impl Default for FlatRefill {
    fn default() -> Self {
        Self::from_config(&FlatRefillConfig::default())
    }
}

impl From<FlatRefillConfig> for FlatRefill {
    fn from(config: FlatRefillConfig) -> Self {
        Self::from_config(&config)
    }
}

impl<K> Refiller<K> for FlatRefill {
    fn new_bucket(&self, _entity: &K) -> Bucket {
        Bucket::new(self.initial_tokens)
    }

    fn refill(&self, _entity: &K, bucket: &mut Bucket) -> Result<(), LimiterError> {
        self.refill_at(bucket, Instant::now());
        Ok(())
    }
}

/// Runtime configuration for [`FlatRefill`], typically loaded from JSON.
///
/// Missing fields fall back to the defaults in [`config`](crate::config).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlatRefillConfig {
    /// See [`FlatRefill::initial_tokens`].
    #[serde(default = "default_initial_tokens")]
    pub initial_tokens: f64,
    /// See [`FlatRefill::max_tokens`]. Must be non-negative.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: f64,
    /// See [`FlatRefill::tokens_per_interval`]. Must be non-negative.
    #[serde(default = "default_tokens_per_interval")]
    pub tokens_per_interval: f64,
    /// Refill interval in milliseconds. `0` disables refill.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl FlatRefillConfig {
    /// Parses a JSON document such as
    /// `{"max_tokens": 50, "tokens_per_interval": 5, "interval_ms": 60000}`.
    ///
    /// The parsed document is checked with [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, LimiterError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects a negative or non-finite `max_tokens` or `tokens_per_interval`.
    pub fn validate(&self) -> Result<(), LimiterError> {
        for (field, value) in [
            ("max_tokens", self.max_tokens),
            ("tokens_per_interval", self.tokens_per_interval),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LimiterError::InvalidConfig { field, value });
            }
        }
        Ok(())
    }
}

impl Default for FlatRefillConfig {
    fn default() -> Self {
        Self {
            initial_tokens: config::DEFAULT_INITIAL_TOKENS,
            max_tokens: config::DEFAULT_MAX_TOKENS,
            tokens_per_interval: config::DEFAULT_TOKENS_PER_INTERVAL,
            interval_ms: config::DEFAULT_INTERVAL_MS,
        }
    }
}

fn default_initial_tokens() -> f64 {
    config::DEFAULT_INITIAL_TOKENS
}

fn default_max_tokens() -> f64 {
    config::DEFAULT_MAX_TOKENS
}

fn default_tokens_per_interval() -> f64 {
    config::DEFAULT_TOKENS_PER_INTERVAL
}

fn default_interval_ms() -> u64 {
    config::DEFAULT_INTERVAL_MS
}

// `Duration::from_nanos` takes a u64, which a product of u128 nanos can outgrow.
fn duration_from_nanos(nanos: u128) -> Duration {
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    Duration::new(secs, (nanos % NANOS_PER_SEC) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn hourly() -> FlatRefill {
        FlatRefill::new(100.0, 100.0, 10.0, HOUR)
    }

    // ── refill_at ──────────────────────────────────────────────────────

    #[test]
    fn test_refill_two_intervals() {
        let start = Instant::now();
        let mut bucket = Bucket::with_last_refill(10.0, start);
        hourly().refill_at(&mut bucket, start + 2 * HOUR);
        assert_eq!(bucket.tokens, 30.0);
        assert_eq!(bucket.last_refill, start + 2 * HOUR);
    }

    #[test]
    fn test_refill_keeps_partial_interval() {
        let start = Instant::now();
        let mut bucket = Bucket::with_last_refill(10.0, start);
        let now = start + 2 * HOUR + Duration::from_secs(1800);
        hourly().refill_at(&mut bucket, now);
        assert_eq!(bucket.tokens, 30.0);
        // Timestamp advances by whole intervals, not to `now`
        assert_eq!(bucket.last_refill, start + 2 * HOUR);

        // The carried half hour completes a third interval later on
        hourly().refill_at(&mut bucket, now + Duration::from_secs(1800));
        assert_eq!(bucket.tokens, 40.0);
        assert_eq!(bucket.last_refill, start + 3 * HOUR);
    }

    #[test]
    fn test_refill_caps_at_max() {
        let start = Instant::now();
        let mut bucket = Bucket::with_last_refill(10.0, start);
        hourly().refill_at(&mut bucket, start + 24 * HOUR);
        assert_eq!(bucket.tokens, 100.0);
        assert_eq!(bucket.last_refill, start + 24 * HOUR);
    }

    #[test]
    fn test_refill_under_one_interval_is_noop() {
        let start = Instant::now();
        let mut bucket = Bucket::with_last_refill(10.0, start);
        hourly().refill_at(&mut bucket, start + Duration::from_secs(3599));
        assert_eq!(bucket.tokens, 10.0);
        assert_eq!(bucket.last_refill, start);
    }

    #[test]
    fn test_refill_zero_interval_disables() {
        let start = Instant::now();
        let policy = FlatRefill::new(5.0, 100.0, 10.0, Duration::ZERO);
        let mut bucket = Bucket::with_last_refill(5.0, start);
        policy.refill_at(&mut bucket, start + 1000 * HOUR);
        assert_eq!(bucket.tokens, 5.0);
        assert_eq!(bucket.last_refill, start);
    }

    #[test]
    fn test_refill_recovers_negative_balance() {
        let start = Instant::now();
        let mut bucket = Bucket::with_last_refill(-25.0, start);
        hourly().refill_at(&mut bucket, start + 3 * HOUR);
        assert_eq!(bucket.tokens, 5.0);
    }

    #[test]
    fn test_refill_clamps_rewarded_balance_to_max() {
        let start = Instant::now();
        let mut bucket = Bucket::with_last_refill(150.0, start);
        hourly().refill_at(&mut bucket, start + 2 * HOUR);
        assert_eq!(bucket.tokens, 100.0);
        assert_eq!(bucket.last_refill, start + 2 * HOUR);
    }

    #[test]
    fn test_refill_not_due_keeps_rewarded_balance() {
        let start = Instant::now();
        let mut bucket = Bucket::with_last_refill(150.0, start);
        hourly().refill_at(&mut bucket, start + Duration::from_secs(60));
        assert_eq!(bucket.tokens, 150.0);
    }

    #[test]
    fn test_refill_now_before_last_refill_is_noop() {
        let start = Instant::now();
        let mut bucket = Bucket::with_last_refill(10.0, start + HOUR);
        hourly().refill_at(&mut bucket, start);
        assert_eq!(bucket.tokens, 10.0);
        assert_eq!(bucket.last_refill, start + HOUR);
    }

    #[test]
    fn test_new_bucket_starts_at_initial_not_max() {
        let policy = FlatRefill::new(20.0, 100.0, 10.0, HOUR);
        let bucket = Refiller::<u32>::new_bucket(&policy, &7);
        assert_eq!(bucket.tokens, 20.0);
    }

    #[test]
    fn test_duration_from_nanos_splits_seconds() {
        assert_eq!(
            duration_from_nanos(2_500_000_000),
            Duration::new(2, 500_000_000)
        );
    }

    // ── FlatRefillConfig ───────────────────────────────────────────────

    #[test]
    fn test_config_from_json_full() {
        let cfg = FlatRefillConfig::from_json(
            r#"{"initial_tokens": 5, "max_tokens": 50, "tokens_per_interval": 2.5, "interval_ms": 60000}"#,
        )
        .unwrap();
        let policy = FlatRefill::from(cfg);
        assert_eq!(policy.initial_tokens, 5.0);
        assert_eq!(policy.max_tokens, 50.0);
        assert_eq!(policy.tokens_per_interval, 2.5);
        assert_eq!(policy.interval, Duration::from_secs(60));
    }

    #[test]
    fn test_config_from_json_defaults() {
        let cfg = FlatRefillConfig::from_json("{}").unwrap();
        assert_eq!(cfg, FlatRefillConfig::default());
        assert_eq!(FlatRefill::from(cfg), FlatRefill::default());
    }

    #[test]
    fn test_config_rejects_unknown_field() {
        let err = FlatRefillConfig::from_json(r#"{"capacity": 10}"#).unwrap_err();
        assert!(matches!(err, LimiterError::Config(_)));
    }

    #[test]
    fn test_config_rejects_negative_rate() {
        let err = FlatRefillConfig::from_json(r#"{"tokens_per_interval": -5}"#).unwrap_err();
        assert!(matches!(
            err,
            LimiterError::InvalidConfig {
                field: "tokens_per_interval",
                ..
            }
        ));
    }

    #[test]
    fn test_config_rejects_negative_max() {
        let err = FlatRefillConfig::from_json(r#"{"max_tokens": -1}"#).unwrap_err();
        assert!(matches!(
            err,
            LimiterError::InvalidConfig {
                field: "max_tokens",
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "invalid refill config: max_tokens must be a non-negative number, got -1"
        );
    }

    #[test]
    fn test_config_allows_negative_initial_tokens() {
        let cfg = FlatRefillConfig::from_json(r#"{"initial_tokens": -10}"#).unwrap();
        assert_eq!(cfg.initial_tokens, -10.0);
    }

    #[test]
    fn test_config_rejects_negative_interval() {
        assert!(FlatRefillConfig::from_json(r#"{"interval_ms": -1}"#).is_err());
    }
}
