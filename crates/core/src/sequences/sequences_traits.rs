use async_trait::async_trait;

use crate::errors::Result;
use crate::tenants::PartitionHandle;

/// Storage contract for sequence counters.
#[async_trait]
pub trait SequenceRepositoryTrait: Send + Sync {
    /// Creates the counter if absent, adds one, and returns the new value.
    ///
    /// Implementations must perform this as a single atomic upsert at the
    /// storage layer; concurrent callers never receive the same value.
    async fn increment(&self, partition: &PartitionHandle, counter_name: &str) -> Result<i64>;

    /// Current value of a counter, `None` if it was never incremented.
    fn current(&self, partition: &PartitionHandle, counter_name: &str) -> Result<Option<i64>>;
}

#[async_trait]
pub trait SequenceServiceTrait: Send + Sync {
    /// Next value of the named counter. Values are never handed out twice,
    /// even when the operation that consumed one later fails.
    async fn next(&self, partition: &PartitionHandle, counter_name: &str) -> Result<i64>;

    /// Next value formatted as `<PREFIX>-000042`.
    async fn next_code(
        &self,
        partition: &PartitionHandle,
        counter_name: &str,
        prefix: &str,
    ) -> Result<String>;

    fn current(&self, partition: &PartitionHandle, counter_name: &str) -> Result<Option<i64>>;
}
