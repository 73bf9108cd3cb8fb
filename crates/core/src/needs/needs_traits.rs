//! Need repository and service traits.

use async_trait::async_trait;

use super::needs_model::{Need, NeedFilter, NeedStatus, NeedSummary, NeedUpdate, NewNeed};
use crate::errors::Result;
use crate::tenants::PartitionHandle;

/// Persistence contract for needs and their plan links.
#[async_trait]
pub trait NeedRepositoryTrait: Send + Sync {
    fn get_by_id(&self, partition: &PartitionHandle, need_id: &str) -> Result<Need>;

    fn list(&self, partition: &PartitionHandle, filter: &NeedFilter) -> Result<Vec<Need>>;

    /// Needs that reference the plan through their plan links.
    fn list_by_plan(&self, partition: &PartitionHandle, plan_id: &str) -> Result<Vec<Need>>;

    /// Inserts a need with status `LookingForPartner`.
    ///
    /// `school_id` and `school_year` on `new_need` are already resolved.
    async fn create(
        &self,
        partition: &PartitionHandle,
        new_need: NewNeed,
        code: String,
    ) -> Result<Need>;

    async fn update(
        &self,
        partition: &PartitionHandle,
        need_id: &str,
        update: NeedUpdate,
    ) -> Result<Need>;

    /// Writes only the derived status column.
    async fn update_status(
        &self,
        partition: &PartitionHandle,
        need_id: &str,
        status: NeedStatus,
    ) -> Result<()>;

    /// Deletes the need together with its plan links and contributions.
    async fn delete(&self, partition: &PartitionHandle, need_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait NeedServiceTrait: Send + Sync {
    fn get_need(&self, partition: &PartitionHandle, need_id: &str) -> Result<Need>;

    fn get_need_summary(&self, partition: &PartitionHandle, need_id: &str) -> Result<NeedSummary>;

    fn list_needs(&self, partition: &PartitionHandle, filter: &NeedFilter) -> Result<Vec<Need>>;

    async fn create_need(&self, partition: &PartitionHandle, new_need: NewNeed) -> Result<Need>;

    async fn update_need(
        &self,
        partition: &PartitionHandle,
        need_id: &str,
        update: NeedUpdate,
    ) -> Result<Need>;

    async fn delete_need(&self, partition: &PartitionHandle, need_id: &str) -> Result<()>;

    /// Re-derives the need status (and its plans) now and returns the need.
    async fn recompute_need(&self, partition: &PartitionHandle, need_id: &str) -> Result<Need>;
}
