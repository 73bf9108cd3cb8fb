//! Cascading need -> plan status recomputation.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, warn};

use super::clock::{Clock, SystemClock};
use super::status_rules::{derive_need_status, derive_plan_status};
use crate::contributions::ContributionRepositoryTrait;
use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink};
use crate::needs::{NeedRepositoryTrait, NeedStatus};
use crate::plans::{PlanRepositoryTrait, PlanStatus};
use crate::tenants::PartitionHandle;

/// Recomputes derived statuses from persisted state.
///
/// Every recomputation reads the current rows and writes an absolute status,
/// so running it twice, or concurrently for the same need, converges on the
/// same result. As an event sink it logs and swallows every failure.
pub struct StatusPropagationEngine {
    plans: Arc<dyn PlanRepositoryTrait>,
    needs: Arc<dyn NeedRepositoryTrait>,
    contributions: Arc<dyn ContributionRepositoryTrait>,
    clock: Arc<dyn Clock>,
}

impl StatusPropagationEngine {
    pub fn new(
        plans: Arc<dyn PlanRepositoryTrait>,
        needs: Arc<dyn NeedRepositoryTrait>,
        contributions: Arc<dyn ContributionRepositoryTrait>,
    ) -> Self {
        Self {
            plans,
            needs,
            contributions,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Recomputes a need's status, then every plan it references.
    ///
    /// Returns `None` without touching anything when the need has no usable
    /// target quantity.
    pub async fn recompute_need(
        &self,
        partition: &PartitionHandle,
        need_id: &str,
    ) -> Result<Option<NeedStatus>> {
        let need = self.needs.get_by_id(partition, need_id)?;
        let Some(target) = need.effective_target() else {
            debug!("Need {} has no target quantity, status left as is", need_id);
            return Ok(None);
        };

        let fulfilled = self
            .contributions
            .sum_quantity_for_need(partition, need_id)?;
        let status = derive_need_status(fulfilled, target);

        self.needs
            .update_status(partition, need_id, status)
            .await?;
        debug!(
            "[{}] need {} -> {} ({} of {})",
            partition.partition_id(),
            need_id,
            status,
            fulfilled,
            target
        );

        self.recompute_plans(partition, &need.plan_ids).await;
        Ok(Some(status))
    }

    /// Recomputes each plan in turn. A plan that fails is logged and skipped
    /// so its siblings still pick up the change.
    async fn recompute_plans<'a, I>(&self, partition: &PartitionHandle, plan_ids: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for plan_id in plan_ids {
            if let Err(e) = self.recompute_plan(partition, plan_id).await {
                log_failure(partition, &format!("plan {}", plan_id), &e);
            }
        }
    }

    /// Recomputes a plan's status from all needs referencing it.
    pub async fn recompute_plan(
        &self,
        partition: &PartitionHandle,
        plan_id: &str,
    ) -> Result<PlanStatus> {
        let plan = self.plans.get_by_id(partition, plan_id)?;
        let needs = self.needs.list_by_plan(partition, plan_id)?;

        let status = if needs.is_empty() {
            PlanStatus::Created
        } else {
            let school_year = plan.parsed_school_year()?;
            let statuses: Vec<NeedStatus> =
                needs.iter().map(|n| n.implementation_status).collect();
            derive_plan_status(&statuses, &school_year, self.clock.today())
        };

        self.plans
            .update_status(partition, plan_id, status)
            .await?;
        debug!(
            "[{}] plan {} -> {} ({} need(s))",
            partition.partition_id(),
            plan_id,
            status,
            needs.len()
        );
        Ok(status)
    }

    async fn handle(&self, partition: &PartitionHandle, event: &DomainEvent) -> Result<()> {
        match event {
            DomainEvent::ContributionWritten { need_id } => {
                self.recompute_need(partition, need_id).await?;
            }
            DomainEvent::NeedWritten { need_id, plan_ids } => {
                // The need may be gone (deleted) or target-less; its plans
                // still have to reflect the changed set of needs.
                let mut pending: BTreeSet<&String> = plan_ids.iter().collect();
                match self.needs.get_by_id(partition, need_id) {
                    Ok(need) => {
                        if self.recompute_need(partition, need_id).await?.is_some() {
                            for plan_id in &need.plan_ids {
                                pending.remove(plan_id);
                            }
                        }
                    }
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e),
                }
                self.recompute_plans(partition, pending).await;
            }
            DomainEvent::PlanScheduleChanged { plan_id } => {
                self.recompute_plan(partition, plan_id).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DomainEventSink for StatusPropagationEngine {
    async fn emit(&self, partition: &PartitionHandle, event: DomainEvent) {
        if let Err(e) = self.handle(partition, &event).await {
            log_failure(partition, &format!("{:?}", event), &e);
        }
    }
}

fn log_failure(partition: &PartitionHandle, subject: &str, e: &Error) {
    if e.is_not_found() {
        warn!(
            "[{}] status propagation skipped for {}: {}",
            partition.partition_id(),
            subject,
            e
        );
    } else {
        error!(
            "[{}] status propagation failed for {}: {}",
            partition.partition_id(),
            subject,
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::needs::NeedRepositoryTrait;
    use crate::plans::PlanRepositoryTrait;
    use crate::propagation::FixedClock;
    use crate::test_support::InMemoryStore;
    use chrono::NaiveDate;

    fn engine(store: &Arc<InMemoryStore>, today: NaiveDate) -> StatusPropagationEngine {
        StatusPropagationEngine::new(store.clone(), store.clone(), store.clone())
            .with_clock(Arc::new(FixedClock(today)))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn contribution_written_cascades_to_plan() {
        let store = Arc::new(InMemoryStore::default());
        let p = PartitionHandle::for_tenant("ncr");
        let plan = store.seed_plan(&p, "2024-2025");
        let need = store.seed_need(&p, &[&plan.id], Some(100.0));
        store.seed_contribution(&p, &need.id, 40.0);

        let engine = engine(&store, date(2025, 1, 15));
        engine
            .emit(&p, DomainEvent::contribution_written(need.id.clone()))
            .await;

        let need = store.get_by_id_need(&p, &need.id);
        assert_eq!(need.implementation_status, NeedStatus::PercentComplete(40));
        let plan = PlanRepositoryTrait::get_by_id(store.as_ref(), &p, &plan.id).unwrap();
        assert_eq!(plan.status, PlanStatus::Ongoing);
    }

    #[tokio::test]
    async fn recompute_need_is_idempotent() {
        let store = Arc::new(InMemoryStore::default());
        let p = PartitionHandle::for_tenant("ncr");
        let plan = store.seed_plan(&p, "2024-2025");
        let need = store.seed_need(&p, &[&plan.id], Some(3.0));
        store.seed_contribution(&p, &need.id, 1.0);

        let engine = engine(&store, date(2025, 1, 15));
        let first = engine.recompute_need(&p, &need.id).await.unwrap();
        let second = engine.recompute_need(&p, &need.id).await.unwrap();

        assert_eq!(first, Some(NeedStatus::PercentComplete(33)));
        assert_eq!(first, second);
        assert_eq!(
            store.get_by_id_need(&p, &need.id).implementation_status,
            NeedStatus::PercentComplete(33)
        );
    }

    #[tokio::test]
    async fn need_without_target_is_left_alone() {
        let store = Arc::new(InMemoryStore::default());
        let p = PartitionHandle::for_tenant("ncr");
        let plan = store.seed_plan(&p, "2024-2025");
        let need = store.seed_need(&p, &[&plan.id], None);
        store.seed_contribution(&p, &need.id, 10.0);

        let engine = engine(&store, date(2025, 1, 15));
        assert_eq!(engine.recompute_need(&p, &need.id).await.unwrap(), None);
        assert_eq!(
            store.get_by_id_need(&p, &need.id).implementation_status,
            NeedStatus::LookingForPartner
        );
        assert_eq!(store.status_writes(), 0);
    }

    #[tokio::test]
    async fn ended_year_without_completions_is_unimplemented() {
        let store = Arc::new(InMemoryStore::default());
        let p = PartitionHandle::for_tenant("ncr");
        let plan = store.seed_plan(&p, "2020-2021");
        store.set_plan_status(&p, &plan.id, PlanStatus::Completed);
        store.seed_need(&p, &[&plan.id], Some(10.0));

        let engine = engine(&store, date(2026, 10, 19));
        let status = engine.recompute_plan(&p, &plan.id).await.unwrap();
        assert_eq!(status, PlanStatus::Unimplemented);
    }

    #[tokio::test]
    async fn deleted_need_recomputes_its_former_plans() {
        let store = Arc::new(InMemoryStore::default());
        let p = PartitionHandle::for_tenant("ncr");
        let plan = store.seed_plan(&p, "2024-2025");
        store.set_plan_status(&p, &plan.id, PlanStatus::Completed);

        let engine = engine(&store, date(2025, 1, 15));
        engine
            .emit(
                &p,
                DomainEvent::need_written("gone", vec![plan.id.clone()]),
            )
            .await;

        let plan = PlanRepositoryTrait::get_by_id(store.as_ref(), &p, &plan.id).unwrap();
        assert_eq!(plan.status, PlanStatus::Created);
    }

    #[tokio::test]
    async fn need_shared_by_two_plans_updates_both() {
        let store = Arc::new(InMemoryStore::default());
        let p = PartitionHandle::for_tenant("ncr");
        let a = store.seed_plan(&p, "2024-2025");
        let b = store.seed_plan(&p, "2024-2025");
        let need = store.seed_need(&p, &[&a.id, &b.id], Some(5.0));
        store.seed_contribution(&p, &need.id, 5.0);

        let engine = engine(&store, date(2025, 1, 15));
        engine.recompute_need(&p, &need.id).await.unwrap();

        for plan_id in [&a.id, &b.id] {
            let plan = PlanRepositoryTrait::get_by_id(store.as_ref(), &p, plan_id).unwrap();
            assert_eq!(plan.status, PlanStatus::Completed);
        }
    }

    #[tokio::test]
    async fn failing_plan_does_not_block_its_siblings() {
        let store = Arc::new(InMemoryStore::default());
        let p = PartitionHandle::for_tenant("ncr");
        let broken = store.seed_plan(&p, "not-a-year");
        let healthy = store.seed_plan(&p, "2024-2025");
        let need = store.seed_need(&p, &[&broken.id, &healthy.id], Some(5.0));
        store.seed_contribution(&p, &need.id, 5.0);

        let engine = engine(&store, date(2025, 1, 15));
        engine
            .emit(&p, DomainEvent::contribution_written(need.id.clone()))
            .await;

        assert_eq!(
            store.get_by_id_need(&p, &need.id).implementation_status,
            NeedStatus::Completed
        );
        let healthy = PlanRepositoryTrait::get_by_id(store.as_ref(), &p, &healthy.id).unwrap();
        assert_eq!(healthy.status, PlanStatus::Completed);

        // Same for the plans listed on a need event.
        store.set_plan_status(&p, &healthy.id, PlanStatus::Created);
        engine
            .emit(
                &p,
                DomainEvent::need_written("gone", vec![broken.id.clone(), healthy.id.clone()]),
            )
            .await;
        let healthy = PlanRepositoryTrait::get_by_id(store.as_ref(), &p, &healthy.id).unwrap();
        assert_eq!(healthy.status, PlanStatus::Completed);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let store = Arc::new(InMemoryStore::default());
        let p = PartitionHandle::for_tenant("ncr");
        let plan = store.seed_plan(&p, "not-a-year");
        store.seed_need(&p, &[&plan.id], Some(1.0));

        let engine = engine(&store, date(2025, 1, 15));
        // Unparseable school year and a vanished need: neither may panic.
        engine
            .emit(&p, DomainEvent::plan_schedule_changed(plan.id.clone()))
            .await;
        engine
            .emit(&p, DomainEvent::contribution_written("missing"))
            .await;

        let plan = PlanRepositoryTrait::get_by_id(store.as_ref(), &p, &plan.id).unwrap();
        assert_eq!(plan.status, PlanStatus::Created);
        assert!(NeedRepositoryTrait::get_by_id(store.as_ref(), &p, "missing").is_err());
    }
}
