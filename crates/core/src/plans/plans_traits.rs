//! Plan repository and service traits.

use async_trait::async_trait;

use super::plans_model::{NewPlan, Plan, PlanFilter, PlanStatus, PlanUpdate};
use crate::errors::Result;
use crate::needs::Need;
use crate::tenants::PartitionHandle;

/// Persistence contract for plans. Every call is scoped to one partition.
#[async_trait]
pub trait PlanRepositoryTrait: Send + Sync {
    fn get_by_id(&self, partition: &PartitionHandle, plan_id: &str) -> Result<Plan>;

    fn list(&self, partition: &PartitionHandle, filter: &PlanFilter) -> Result<Vec<Plan>>;

    /// Inserts a plan with the given sequence number and status `Created`.
    async fn create(
        &self,
        partition: &PartitionHandle,
        new_plan: NewPlan,
        sequence_number: i64,
    ) -> Result<Plan>;

    async fn update(
        &self,
        partition: &PartitionHandle,
        plan_id: &str,
        update: PlanUpdate,
    ) -> Result<Plan>;

    /// Writes only the derived status column.
    async fn update_status(
        &self,
        partition: &PartitionHandle,
        plan_id: &str,
        status: PlanStatus,
    ) -> Result<()>;

    async fn delete(&self, partition: &PartitionHandle, plan_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait PlanServiceTrait: Send + Sync {
    fn get_plan(&self, partition: &PartitionHandle, plan_id: &str) -> Result<Plan>;

    fn list_plans(&self, partition: &PartitionHandle, filter: &PlanFilter) -> Result<Vec<Plan>>;

    fn get_plan_needs(&self, partition: &PartitionHandle, plan_id: &str) -> Result<Vec<Need>>;

    async fn create_plan(&self, partition: &PartitionHandle, new_plan: NewPlan) -> Result<Plan>;

    async fn update_plan(
        &self,
        partition: &PartitionHandle,
        plan_id: &str,
        update: PlanUpdate,
    ) -> Result<Plan>;

    /// Deletes a plan. Refused while needs still reference it.
    async fn delete_plan(&self, partition: &PartitionHandle, plan_id: &str) -> Result<()>;

    /// Re-derives the plan status now and returns the refreshed plan.
    async fn recompute_plan(&self, partition: &PartitionHandle, plan_id: &str) -> Result<Plan>;
}
