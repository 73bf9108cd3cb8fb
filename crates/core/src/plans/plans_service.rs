use log::debug;
use std::sync::Arc;

use super::plans_model::{NewPlan, Plan, PlanFilter, PlanUpdate};
use super::plans_traits::{PlanRepositoryTrait, PlanServiceTrait};
use crate::constants::PLAN_SEQUENCE;
use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink};
use crate::needs::{Need, NeedRepositoryTrait};
use crate::propagation::StatusPropagationEngine;
use crate::sequences::{with_sequence_retry, SequenceServiceTrait};
use crate::tenants::PartitionHandle;

/// Service for managing improvement plans.
pub struct PlanService {
    repository: Arc<dyn PlanRepositoryTrait>,
    need_repository: Arc<dyn NeedRepositoryTrait>,
    sequences: Arc<dyn SequenceServiceTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    propagation: Arc<StatusPropagationEngine>,
}

impl PlanService {
    pub fn new(
        repository: Arc<dyn PlanRepositoryTrait>,
        need_repository: Arc<dyn NeedRepositoryTrait>,
        sequences: Arc<dyn SequenceServiceTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        propagation: Arc<StatusPropagationEngine>,
    ) -> Self {
        Self {
            repository,
            need_repository,
            sequences,
            event_sink,
            propagation,
        }
    }
}

#[async_trait::async_trait]
impl PlanServiceTrait for PlanService {
    fn get_plan(&self, partition: &PartitionHandle, plan_id: &str) -> Result<Plan> {
        self.repository.get_by_id(partition, plan_id)
    }

    fn list_plans(&self, partition: &PartitionHandle, filter: &PlanFilter) -> Result<Vec<Plan>> {
        self.repository.list(partition, filter)
    }

    fn get_plan_needs(&self, partition: &PartitionHandle, plan_id: &str) -> Result<Vec<Need>> {
        self.repository.get_by_id(partition, plan_id)?;
        self.need_repository.list_by_plan(partition, plan_id)
    }

    /// Creates a plan numbered from the partition's `plan` counter.
    async fn create_plan(&self, partition: &PartitionHandle, new_plan: NewPlan) -> Result<Plan> {
        new_plan.validate()?;
        let sequences = &self.sequences;
        let repository = &self.repository;

        let plan = with_sequence_retry(|| {
            let new_plan = new_plan.clone();
            async move {
                let sequence_number = sequences.next(partition, PLAN_SEQUENCE).await?;
                repository.create(partition, new_plan, sequence_number).await
            }
        })
        .await?;

        debug!(
            "[{}] created plan {} (#{})",
            partition.partition_id(),
            plan.id,
            plan.sequence_number
        );
        Ok(plan)
    }

    async fn update_plan(
        &self,
        partition: &PartitionHandle,
        plan_id: &str,
        update: PlanUpdate,
    ) -> Result<Plan> {
        update.validate()?;
        let existing = self.repository.get_by_id(partition, plan_id)?;
        let updated = self.repository.update(partition, plan_id, update).await?;

        if existing.school_year != updated.school_year {
            self.event_sink
                .emit(partition, DomainEvent::plan_schedule_changed(plan_id))
                .await;
            return self.repository.get_by_id(partition, plan_id);
        }
        Ok(updated)
    }

    async fn delete_plan(&self, partition: &PartitionHandle, plan_id: &str) -> Result<()> {
        self.repository.get_by_id(partition, plan_id)?;
        let needs = self.need_repository.list_by_plan(partition, plan_id)?;
        if !needs.is_empty() {
            return Err(Error::Conflict(format!(
                "Plan {} is still referenced by {} need(s)",
                plan_id,
                needs.len()
            )));
        }
        self.repository.delete(partition, plan_id).await?;
        Ok(())
    }

    async fn recompute_plan(&self, partition: &PartitionHandle, plan_id: &str) -> Result<Plan> {
        self.propagation.recompute_plan(partition, plan_id).await?;
        self.repository.get_by_id(partition, plan_id)
    }
}
