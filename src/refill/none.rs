//! Fixed allowance policy.

use super::Refiller;
use crate::bucket::Bucket;
use crate::error::LimiterError;

/// Starts every entity at `initial_tokens` and never adds more.
///
/// Models one-time quotas. Also handy as a deterministic policy in tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoRefill {
    /// Balance given to an entity when its bucket is created.
    pub initial_tokens: f64,
}

impl NoRefill {
    /// Creates a policy that hands out `initial_tokens` once per entity.
    pub fn new(initial_tokens: f64) -> Self {
        Self { initial_tokens }
    }
}

impl<K> Refiller<K> for NoRefill {
    fn new_bucket(&self, _entity: &K) -> Bucket {
        Bucket::new(self.initial_tokens)
    }

    fn refill(&self, _entity: &K, _bucket: &mut Bucket) -> Result<(), LimiterError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bucket_uses_initial_tokens() {
        let policy = NoRefill::new(42.0);
        let bucket = Refiller::<&str>::new_bucket(&policy, &"alice");
        assert_eq!(bucket.tokens, 42.0);
    }

    #[test]
    fn test_refill_leaves_bucket_untouched() {
        let policy = NoRefill::new(10.0);
        let mut bucket = Bucket::new(3.0);
        let before = bucket;
        policy.refill(&1u64, &mut bucket).unwrap();
        assert_eq!(bucket, before);
    }
}
