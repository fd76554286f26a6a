//! Per-entity token bucket limiter.
//!
//! A [`Limiter`] maps each entity to its own [`Bucket`], created lazily through
//! the configured [`Refiller`]. Two lock tiers keep unrelated entities apart:
//!
//! - the entity map sits behind a `RwLock`, held only to look up or insert a
//!   map entry;
//! - each bucket sits behind its own `Mutex`, held for refill, comparison and
//!   debit, so all operations on one entity are serialized while different
//!   entities never wait on each other's balance updates.
//!
//! Buckets are never removed. Memory grows with the number of distinct
//! entities seen; callers that need a bound must rebuild the limiter.

use crate::bucket::Bucket;
use crate::config;
use crate::error::{check_amount, LimiterError};
use crate::refill::Refiller;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Shared handle to one entity's bucket.
type BucketHandle = Arc<Mutex<Bucket>>;

/// Concurrent token bucket limiter keyed by entity.
///
/// Entities can be any hashable key: strings, IP addresses, user IDs, UUIDs.
/// The limiter is `Send + Sync` when `K` and `R` are, and is meant to be
/// shared across threads behind an `Arc` or a reference.
pub struct Limiter<K, R> {
    buckets: RwLock<HashMap<K, BucketHandle>>,
    refiller: R,
}

impl<K, R> Limiter<K, R>
where
    K: Eq + Hash + Clone + fmt::Debug,
    R: Refiller<K>,
{
    /// Creates an empty limiter with the given refill policy.
    pub fn new(refiller: R) -> Self {
        Self::with_capacity(refiller, config::DEFAULT_BUCKET_CAPACITY)
    }

    /// Creates an empty limiter with room for `capacity` entities before rehashing.
    pub fn with_capacity(refiller: R, capacity: usize) -> Self {
        Self {
            buckets: RwLock::new(HashMap::with_capacity(capacity)),
            refiller,
        }
    }

    /// Returns the refill policy this limiter was built with.
    pub fn refiller(&self) -> &R {
        &self.refiller
    }

    /// Returns `Ok(true)` if `entity` can afford `cost`, debiting it.
    ///
    /// The bucket is refilled before the comparison, so an entity that has
    /// been idle receives everything it is owed first. When the balance is
    /// short, nothing is debited and `Ok(false)` is returned.
    ///
    /// A zero cost is always allowed and touches no state. A negative or non-finite
    /// cost is an error, as is a refill policy failure; in the latter case the
    /// bucket keeps its pre-call state.
    ///
    /// Use `allow` to gate requests. To punish an entity flagged by another
    /// system, use [`penalize`](Self::penalize).
    pub fn allow(&self, entity: &K, cost: f64) -> Result<bool, LimiterError> {
        check_amount("allow", cost)?;
        if cost == 0.0 {
            return Ok(true);
        }

        let handle = self.bucket(entity);
        let mut bucket = handle.lock();

        // Refill a copy so a failing policy cannot leave a half-updated bucket
        let mut refilled = *bucket;
        if let Err(e) = self.refiller.refill(entity, &mut refilled) {
            tracing::warn!(entity = ?entity, error = %e, "Refill failed");
            return Err(e);
        }
        *bucket = refilled;

        if bucket.tokens < cost {
            tracing::trace!(entity = ?entity, cost, tokens = bucket.tokens, "Request denied");
            return Ok(false);
        }
        bucket.tokens -= cost;
        tracing::trace!(entity = ?entity, cost, tokens = bucket.tokens, "Request allowed");
        Ok(true)
    }

    /// Logical negation of [`allow`](Self::allow), with the same side effects.
    pub fn reject(&self, entity: &K, cost: f64) -> Result<bool, LimiterError> {
        self.allow(entity, cost).map(|allowed| !allowed)
    }

    /// Unconditionally removes `amount` tokens from `entity`'s balance.
    ///
    /// No refill is applied and the balance may go negative. An unseen entity
    /// gets a bucket first, since the abuse may have been detected elsewhere
    /// before it ever reached this limiter.
    pub fn penalize(&self, entity: &K, amount: f64) -> Result<(), LimiterError> {
        check_amount("penalize", amount)?;
        self.adjust(entity, -amount);
        Ok(())
    }

    /// Unconditionally adds `amount` tokens to `entity`'s balance.
    ///
    /// Mirror of [`penalize`](Self::penalize): no refill, no ceiling.
    pub fn reward(&self, entity: &K, amount: f64) -> Result<(), LimiterError> {
        check_amount("reward", amount)?;
        self.adjust(entity, amount);
        Ok(())
    }

    /// Current balance of `entity`, or `0.0` if it has never been seen.
    ///
    /// Read-only: no bucket is created and no refill is applied, so the value
    /// may lag behind what the next `allow` would observe.
    pub fn balance(&self, entity: &K) -> f64 {
        let handle = self.buckets.read().get(entity).cloned();
        handle.map_or(0.0, |h| h.lock().tokens)
    }

    /// Number of distinct entities currently tracked.
    pub fn count(&self) -> usize {
        self.buckets.read().len()
    }

    fn adjust(&self, entity: &K, delta: f64) {
        if delta == 0.0 {
            return;
        }
        let handle = self.bucket(entity);
        let mut bucket = handle.lock();
        bucket.tokens += delta;
        tracing::debug!(entity = ?entity, delta, tokens = bucket.tokens, "Balance adjusted");
    }

    /// Looks up `entity`'s bucket, creating it through the refiller if absent.
    ///
    /// Optimistic read first; on a miss the map is re-checked under the write
    /// lock so that racing callers all end up with the same bucket.
    fn bucket(&self, entity: &K) -> BucketHandle {
        if let Some(handle) = self.buckets.read().get(entity) {
            return Arc::clone(handle);
        }

        let mut buckets = self.buckets.write();
        if let Some(handle) = buckets.get(entity) {
            return Arc::clone(handle);
        }
        let bucket = self.refiller.new_bucket(entity);
        tracing::debug!(entity = ?entity, tokens = bucket.tokens, "Bucket created");
        let handle = Arc::new(Mutex::new(bucket));
        buckets.insert(entity.clone(), Arc::clone(&handle));
        handle
    }
}

impl<K, R: fmt::Debug> fmt::Debug for Limiter<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Limiter")
            .field("entities", &self.buckets.read().len())
            .field("refiller", &self.refiller)
            .finish()
    }
}
