use log::debug;
use std::sync::Arc;

use super::contributions_model::{
    Contribution, ContributionFilter, ContributionUpdate, NewContribution,
};
use super::contributions_traits::{ContributionRepositoryTrait, ContributionServiceTrait};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::needs::NeedRepositoryTrait;
use crate::tenants::PartitionHandle;

/// Service for recording partner contributions.
///
/// Every successful write notifies the event sink for each need whose
/// fulfilled quantity may have changed.
pub struct ContributionService {
    repository: Arc<dyn ContributionRepositoryTrait>,
    need_repository: Arc<dyn NeedRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl ContributionService {
    pub fn new(
        repository: Arc<dyn ContributionRepositoryTrait>,
        need_repository: Arc<dyn NeedRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            repository,
            need_repository,
            event_sink,
        }
    }
}

#[async_trait::async_trait]
impl ContributionServiceTrait for ContributionService {
    fn get_contribution(
        &self,
        partition: &PartitionHandle,
        contribution_id: &str,
    ) -> Result<Contribution> {
        self.repository.get_by_id(partition, contribution_id)
    }

    fn list_contributions(
        &self,
        partition: &PartitionHandle,
        filter: &ContributionFilter,
    ) -> Result<Vec<Contribution>> {
        self.repository.list(partition, filter)
    }

    async fn create_contribution(
        &self,
        partition: &PartitionHandle,
        new_contribution: NewContribution,
    ) -> Result<Contribution> {
        new_contribution.validate()?;
        let need = self
            .need_repository
            .get_by_id(partition, &new_contribution.need_id)?;

        let contribution = self
            .repository
            .create(partition, new_contribution, &need)
            .await?;
        debug!(
            "[{}] contribution {} of {} recorded for need {}",
            partition.partition_id(),
            contribution.id,
            contribution.quantity,
            need.code
        );

        self.event_sink
            .emit(
                partition,
                DomainEvent::contribution_written(contribution.need_id.clone()),
            )
            .await;
        Ok(contribution)
    }

    async fn update_contribution(
        &self,
        partition: &PartitionHandle,
        contribution_id: &str,
        update: ContributionUpdate,
    ) -> Result<Contribution> {
        update.validate()?;
        let existing = self.repository.get_by_id(partition, contribution_id)?;
        let need = self.need_repository.get_by_id(partition, &update.need_id)?;

        let contribution = self
            .repository
            .update(partition, contribution_id, update, &need)
            .await?;

        let mut events = vec![DomainEvent::contribution_written(
            contribution.need_id.clone(),
        )];
        if existing.need_id != contribution.need_id {
            events.push(DomainEvent::contribution_written(existing.need_id));
        }
        self.event_sink.emit_batch(partition, events).await;
        Ok(contribution)
    }

    async fn delete_contribution(
        &self,
        partition: &PartitionHandle,
        contribution_id: &str,
    ) -> Result<()> {
        let existing = self.repository.get_by_id(partition, contribution_id)?;
        self.repository.delete(partition, contribution_id).await?;
        self.event_sink
            .emit(
                partition,
                DomainEvent::contribution_written(existing.need_id),
            )
            .await;
        Ok(())
    }
}
