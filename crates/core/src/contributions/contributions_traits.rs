//! Contribution repository and service traits.

use async_trait::async_trait;

use super::contributions_model::{
    Contribution, ContributionFilter, ContributionUpdate, NewContribution,
};
use crate::errors::Result;
use crate::needs::Need;
use crate::tenants::PartitionHandle;

/// Persistence contract for contributions.
#[async_trait]
pub trait ContributionRepositoryTrait: Send + Sync {
    fn get_by_id(&self, partition: &PartitionHandle, contribution_id: &str)
        -> Result<Contribution>;

    fn list(
        &self,
        partition: &PartitionHandle,
        filter: &ContributionFilter,
    ) -> Result<Vec<Contribution>>;

    /// Sum of `quantity` over every contribution referencing the need.
    fn sum_quantity_for_need(&self, partition: &PartitionHandle, need_id: &str) -> Result<f64>;

    /// Inserts a contribution, copying school data from `need`.
    async fn create(
        &self,
        partition: &PartitionHandle,
        new_contribution: NewContribution,
        need: &Need,
    ) -> Result<Contribution>;

    /// Updates a contribution, copying school data from `need`.
    async fn update(
        &self,
        partition: &PartitionHandle,
        contribution_id: &str,
        update: ContributionUpdate,
        need: &Need,
    ) -> Result<Contribution>;

    async fn delete(&self, partition: &PartitionHandle, contribution_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait ContributionServiceTrait: Send + Sync {
    fn get_contribution(
        &self,
        partition: &PartitionHandle,
        contribution_id: &str,
    ) -> Result<Contribution>;

    fn list_contributions(
        &self,
        partition: &PartitionHandle,
        filter: &ContributionFilter,
    ) -> Result<Vec<Contribution>>;

    async fn create_contribution(
        &self,
        partition: &PartitionHandle,
        new_contribution: NewContribution,
    ) -> Result<Contribution>;

    async fn update_contribution(
        &self,
        partition: &PartitionHandle,
        contribution_id: &str,
        update: ContributionUpdate,
    ) -> Result<Contribution>;

    async fn delete_contribution(
        &self,
        partition: &PartitionHandle,
        contribution_id: &str,
    ) -> Result<()>;
}
