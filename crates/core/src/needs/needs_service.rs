use log::debug;
use std::sync::Arc;

use super::needs_model::{Need, NeedFilter, NeedSummary, NeedUpdate, NewNeed};
use super::needs_traits::{NeedRepositoryTrait, NeedServiceTrait};
use crate::constants::{NEED_CODE_PREFIX, NEED_SEQUENCE};
use crate::contributions::{ContributionFilter, ContributionRepositoryTrait};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::plans::{Plan, PlanRepositoryTrait};
use crate::propagation::StatusPropagationEngine;
use crate::sequences::{with_sequence_retry, SequenceServiceTrait};
use crate::tenants::PartitionHandle;

/// Service for managing needs and their plan links.
pub struct NeedService {
    repository: Arc<dyn NeedRepositoryTrait>,
    plan_repository: Arc<dyn PlanRepositoryTrait>,
    contribution_repository: Arc<dyn ContributionRepositoryTrait>,
    sequences: Arc<dyn SequenceServiceTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    propagation: Arc<StatusPropagationEngine>,
}

impl NeedService {
    pub fn new(
        repository: Arc<dyn NeedRepositoryTrait>,
        plan_repository: Arc<dyn PlanRepositoryTrait>,
        contribution_repository: Arc<dyn ContributionRepositoryTrait>,
        sequences: Arc<dyn SequenceServiceTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        propagation: Arc<StatusPropagationEngine>,
    ) -> Self {
        Self {
            repository,
            plan_repository,
            contribution_repository,
            sequences,
            event_sink,
            propagation,
        }
    }

    /// Loads every referenced plan; fails with NotFound on the first missing one.
    fn load_plans(&self, partition: &PartitionHandle, plan_ids: &[String]) -> Result<Vec<Plan>> {
        plan_ids
            .iter()
            .map(|id| self.plan_repository.get_by_id(partition, id))
            .collect()
    }
}

#[async_trait::async_trait]
impl NeedServiceTrait for NeedService {
    fn get_need(&self, partition: &PartitionHandle, need_id: &str) -> Result<Need> {
        self.repository.get_by_id(partition, need_id)
    }

    fn get_need_summary(&self, partition: &PartitionHandle, need_id: &str) -> Result<NeedSummary> {
        let need = self.repository.get_by_id(partition, need_id)?;
        let contributions = self.contribution_repository.list(
            partition,
            &ContributionFilter {
                need_id: Some(need_id.to_string()),
                ..Default::default()
            },
        )?;
        Ok(NeedSummary {
            need,
            fulfilled_quantity: contributions.iter().map(|c| c.quantity).sum(),
            contribution_count: contributions.len(),
        })
    }

    fn list_needs(&self, partition: &PartitionHandle, filter: &NeedFilter) -> Result<Vec<Need>> {
        self.repository.list(partition, filter)
    }

    async fn create_need(&self, partition: &PartitionHandle, new_need: NewNeed) -> Result<Need> {
        new_need.validate()?;
        let plans = self.load_plans(partition, &new_need.plan_ids)?;

        let mut new_need = new_need;
        if let Some(first) = plans.first() {
            new_need
                .school_id
                .get_or_insert_with(|| first.school_id.clone());
            new_need
                .school_year
                .get_or_insert_with(|| first.school_year.clone());
        }

        let sequences = &self.sequences;
        let repository = &self.repository;
        let need = with_sequence_retry(|| {
            let new_need = new_need.clone();
            async move {
                let code = sequences
                    .next_code(partition, NEED_SEQUENCE, NEED_CODE_PREFIX)
                    .await?;
                repository.create(partition, new_need, code).await
            }
        })
        .await?;
        debug!(
            "[{}] created need {} ({})",
            partition.partition_id(),
            need.code,
            need.id
        );

        self.event_sink
            .emit(
                partition,
                DomainEvent::need_written(need.id.clone(), need.plan_ids.clone()),
            )
            .await;
        self.repository.get_by_id(partition, &need.id)
    }

    async fn update_need(
        &self,
        partition: &PartitionHandle,
        need_id: &str,
        update: NeedUpdate,
    ) -> Result<Need> {
        update.validate()?;
        let existing = self.repository.get_by_id(partition, need_id)?;
        self.load_plans(partition, &update.plan_ids)?;

        let updated = self.repository.update(partition, need_id, update).await?;

        let mut affected = existing.plan_ids;
        affected.extend(updated.plan_ids.iter().cloned());
        self.event_sink
            .emit(partition, DomainEvent::need_written(need_id, affected))
            .await;
        self.repository.get_by_id(partition, need_id)
    }

    /// Deletes the need and its contributions, then re-evaluates its plans.
    async fn delete_need(&self, partition: &PartitionHandle, need_id: &str) -> Result<()> {
        let existing = self.repository.get_by_id(partition, need_id)?;
        self.repository.delete(partition, need_id).await?;
        self.event_sink
            .emit(
                partition,
                DomainEvent::need_written(need_id, existing.plan_ids),
            )
            .await;
        Ok(())
    }

    async fn recompute_need(&self, partition: &PartitionHandle, need_id: &str) -> Result<Need> {
        self.propagation.recompute_need(partition, need_id).await?;
        self.repository.get_by_id(partition, need_id)
    }
}
