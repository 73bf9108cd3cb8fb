use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::model::PlanDB;
use crate::db::{get_connection, PartitionPools};
use crate::errors::StorageError;
use crate::schema::plans;
use snds_core::errors::{Error, Result};
use snds_core::plans::{NewPlan, Plan, PlanFilter, PlanRepositoryTrait, PlanStatus, PlanUpdate};
use snds_core::PartitionHandle;

pub struct PlanRepository {
    pools: Arc<PartitionPools>,
}

impl PlanRepository {
    pub fn new(pools: Arc<PartitionPools>) -> Self {
        PlanRepository { pools }
    }
}

#[async_trait]
impl PlanRepositoryTrait for PlanRepository {
    fn get_by_id(&self, partition: &PartitionHandle, plan_id: &str) -> Result<Plan> {
        let db = self.pools.get(partition)?;
        let mut conn = get_connection(&db.pool)?;
        plans::table
            .find(plan_id)
            .select(PlanDB::as_select())
            .first::<PlanDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| Error::not_found("Plan", plan_id))
            .and_then(Plan::try_from)
    }

    fn list(&self, partition: &PartitionHandle, filter: &PlanFilter) -> Result<Vec<Plan>> {
        let db = self.pools.get(partition)?;
        let mut conn = get_connection(&db.pool)?;

        let mut query = plans::table.into_boxed();
        if let Some(school_id) = &filter.school_id {
            query = query.filter(plans::school_id.eq(school_id));
        }
        if let Some(school_year) = &filter.school_year {
            query = query.filter(plans::school_year.eq(school_year));
        }
        if let Some(status) = filter.status {
            query = query.filter(plans::status.eq(status.as_str()));
        }

        query
            .select(PlanDB::as_select())
            .order(plans::sequence_number.asc())
            .load::<PlanDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(Plan::try_from)
            .collect()
    }

    async fn create(
        &self,
        partition: &PartitionHandle,
        new_plan: NewPlan,
        sequence_number: i64,
    ) -> Result<Plan> {
        let db = self.pools.get(partition)?;
        db.writer
            .exec(move |conn| -> Result<Plan> {
                let row = PlanDB::from_new(new_plan, Uuid::new_v4().to_string(), sequence_number)?;
                let inserted = diesel::insert_into(plans::table)
                    .values(&row)
                    .returning(PlanDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Plan::try_from(inserted)
            })
            .await
    }

    async fn update(
        &self,
        partition: &PartitionHandle,
        plan_id: &str,
        update: PlanUpdate,
    ) -> Result<Plan> {
        let db = self.pools.get(partition)?;
        let plan_id = plan_id.to_string();
        db.writer
            .exec(move |conn| -> Result<Plan> {
                let objectives = serde_json::to_string(&update.objectives)?;
                let updated = diesel::update(plans::table.find(&plan_id))
                    .set((
                        plans::school_year.eq(update.school_year),
                        plans::title.eq(update.title),
                        plans::objectives.eq(objectives),
                        plans::owner_id.eq(update.owner_id),
                        plans::updated_at.eq(chrono::Utc::now().naive_utc()),
                    ))
                    .returning(PlanDB::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                updated
                    .ok_or_else(|| Error::not_found("Plan", plan_id))
                    .and_then(Plan::try_from)
            })
            .await
    }

    async fn update_status(
        &self,
        partition: &PartitionHandle,
        plan_id: &str,
        status: PlanStatus,
    ) -> Result<()> {
        let db = self.pools.get(partition)?;
        let plan_id = plan_id.to_string();
        db.writer
            .exec(move |conn| -> Result<()> {
                let affected = diesel::update(plans::table.find(&plan_id))
                    .set(plans::status.eq(status.as_str()))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(Error::not_found("Plan", plan_id));
                }
                Ok(())
            })
            .await
    }

    async fn delete(&self, partition: &PartitionHandle, plan_id: &str) -> Result<usize> {
        let db = self.pools.get(partition)?;
        let plan_id = plan_id.to_string();
        db.writer
            .exec(move |conn| -> Result<usize> {
                Ok(diesel::delete(plans::table.find(plan_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_plan(school_id: &str, school_year: &str) -> NewPlan {
        NewPlan {
            school_id: school_id.to_string(),
            school_year: school_year.to_string(),
            title: "Reading recovery".to_string(),
            objectives: vec!["Raise literacy".to_string(), "Stock library".to_string()],
            owner_id: Some("principal-1".to_string()),
        }
    }

    #[tokio::test]
    async fn plans_round_trip_with_objectives_and_status() {
        let dir = tempdir().unwrap();
        let repo = PlanRepository::new(Arc::new(PartitionPools::new(dir.path())));
        let p = PartitionHandle::for_tenant("ncr");

        let plan = repo.create(&p, new_plan("school-1", "2024-2025"), 1).await.unwrap();
        assert_eq!(plan.status, PlanStatus::Created);

        repo.update_status(&p, &plan.id, PlanStatus::Ongoing).await.unwrap();
        let loaded = repo.get_by_id(&p, &plan.id).unwrap();
        assert_eq!(loaded.status, PlanStatus::Ongoing);
        assert_eq!(loaded.objectives, vec!["Raise literacy", "Stock library"]);
    }

    #[tokio::test]
    async fn sequence_numbers_are_unique_per_partition() {
        let dir = tempdir().unwrap();
        let repo = PlanRepository::new(Arc::new(PartitionPools::new(dir.path())));
        let ncr = PartitionHandle::for_tenant("ncr");
        let car = PartitionHandle::for_tenant("car");

        repo.create(&ncr, new_plan("s", "2024-2025"), 1).await.unwrap();
        repo.create(&car, new_plan("s", "2024-2025"), 1).await.unwrap();
        let err = repo.create(&ncr, new_plan("s", "2024-2025"), 1).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn list_filters_and_partition_isolation() {
        let dir = tempdir().unwrap();
        let repo = PlanRepository::new(Arc::new(PartitionPools::new(dir.path())));
        let ncr = PartitionHandle::for_tenant("ncr");
        let car = PartitionHandle::for_tenant("car");

        repo.create(&ncr, new_plan("school-1", "2024-2025"), 1).await.unwrap();
        repo.create(&ncr, new_plan("school-2", "2024-2025"), 2).await.unwrap();
        repo.create(&ncr, new_plan("school-1", "2025-2026"), 3).await.unwrap();

        let filter = PlanFilter {
            school_id: Some("school-1".to_string()),
            ..Default::default()
        };
        let found = repo.list(&ncr, &filter).unwrap();
        assert_eq!(
            found.iter().map(|p| p.sequence_number).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert!(repo.list(&car, &PlanFilter::default()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_plans_are_not_found() {
        let dir = tempdir().unwrap();
        let repo = PlanRepository::new(Arc::new(PartitionPools::new(dir.path())));
        let p = PartitionHandle::for_tenant("ncr");

        assert!(matches!(
            repo.get_by_id(&p, "nope"),
            Err(Error::NotFound { entity: "Plan", .. })
        ));
        assert!(repo
            .update_status(&p, "nope", PlanStatus::Completed)
            .await
            .unwrap_err()
            .is_not_found());
        assert_eq!(repo.delete(&p, "nope").await.unwrap(), 0);
    }
}
