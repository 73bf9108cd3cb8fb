use std::future::Future;
use std::sync::Arc;

use log::warn;

use super::sequences_traits::{SequenceRepositoryTrait, SequenceServiceTrait};
use crate::constants::SEQUENCE_RETRY_ATTEMPTS;
use crate::errors::{Error, Result};
use crate::tenants::PartitionHandle;

/// Formats a sequence value as a zero-padded code, e.g. `NEED-000042`.
pub fn format_code(prefix: &str, value: i64) -> String {
    format!("{}-{:06}", prefix, value)
}

/// Runs `attempt` until it succeeds, fails with something other than a
/// unique violation, or `SEQUENCE_RETRY_ATTEMPTS` runs are used up.
///
/// Each attempt is expected to allocate a fresh sequence value, so a retry
/// never reuses the number that collided.
pub async fn with_sequence_retry<T, F, Fut>(mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = String::new();
    for attempt_no in 1..=SEQUENCE_RETRY_ATTEMPTS {
        match attempt().await {
            Err(err) if err.is_unique_violation() => {
                warn!(
                    "Sequence collision on attempt {}/{}: {}",
                    attempt_no, SEQUENCE_RETRY_ATTEMPTS, err
                );
                last_error = err.to_string();
            }
            other => return other,
        }
    }
    Err(Error::Conflict(format!(
        "Could not allocate a unique code after {} attempts: {}",
        SEQUENCE_RETRY_ATTEMPTS, last_error
    )))
}

pub struct SequenceService {
    repository: Arc<dyn SequenceRepositoryTrait>,
}

impl SequenceService {
    pub fn new(repository: Arc<dyn SequenceRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl SequenceServiceTrait for SequenceService {
    async fn next(&self, partition: &PartitionHandle, counter_name: &str) -> Result<i64> {
        if counter_name.trim().is_empty() {
            return Err(Error::invalid_input("Counter name cannot be empty"));
        }
        self.repository.increment(partition, counter_name).await
    }

    async fn next_code(
        &self,
        partition: &PartitionHandle,
        counter_name: &str,
        prefix: &str,
    ) -> Result<String> {
        let value = self.next(partition, counter_name).await?;
        Ok(format_code(prefix, value))
    }

    fn current(&self, partition: &PartitionHandle, counter_name: &str) -> Result<Option<i64>> {
        self.repository.current(partition, counter_name)
    }
}
