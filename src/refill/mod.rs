//! Refill policies: how an entity's balance accrues over time.
//!
//! The [`Limiter`](crate::Limiter) owns one [`Refiller`] and calls it in two
//! places: once when an entity is first seen ([`Refiller::new_bucket`]) and on
//! every debit, under that entity's lock, before the balance is compared to
//! the cost ([`Refiller::refill`]). The limiter never calls `refill` twice
//! concurrently for the same entity.
//!
//! Two policies ship with the crate: [`NoRefill`] for fixed allowances and
//! [`FlatRefill`] for whole-interval accrual up to a ceiling. Anything else
//! (tiers by entity class, time-of-day budgets) is a caller-side impl.

/// Whole-interval refill with a ceiling, plus its serde configuration.
pub mod flat;
/// Fixed allowance without regeneration.
pub mod none;

pub use flat::{FlatRefill, FlatRefillConfig};
pub use none::NoRefill;

use crate::bucket::Bucket;
use crate::error::LimiterError;
use std::sync::Arc;

/// Refill policy for entities of type `K`.
pub trait Refiller<K> {
    /// Creates a fully initialised bucket for an entity seen for the first time.
    fn new_bucket(&self, entity: &K) -> Bucket;

    /// Brings `bucket` up to date as of now.
    ///
    /// Called with the bucket's lock held. If this returns `Err`, every change
    /// made to `bucket` is discarded and the debit fails with that error.
    fn refill(&self, entity: &K, bucket: &mut Bucket) -> Result<(), LimiterError>;
}

impl<K, R: Refiller<K> + ?Sized> Refiller<K> for Arc<R> {
    fn new_bucket(&self, entity: &K) -> Bucket {
        (**self).new_bucket(entity)
    }

    fn refill(&self, entity: &K, bucket: &mut Bucket) -> Result<(), LimiterError> {
        (**self).refill(entity, bucket)
    }
}

impl<K, R: Refiller<K> + ?Sized> Refiller<K> for Box<R> {
    fn new_bucket(&self, entity: &K) -> Bucket {
        (**self).new_bucket(entity)
    }

    fn refill(&self, entity: &K, bucket: &mut Bucket) -> Result<(), LimiterError> {
        (**self).refill(entity, bucket)
    }
}
