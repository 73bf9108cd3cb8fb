use async_trait::async_trait;
use diesel::dsl::sum;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::model::ContributionDB;
use crate::db::{get_connection, PartitionPools};
use crate::errors::StorageError;
use crate::schema::contributions;
use snds_core::contributions::{
    Contribution, ContributionFilter, ContributionRepositoryTrait, ContributionUpdate,
    NewContribution,
};
use snds_core::errors::{Error, Result};
use snds_core::needs::Need;
use snds_core::PartitionHandle;

pub struct ContributionRepository {
    pools: Arc<PartitionPools>,
}

impl ContributionRepository {
    pub fn new(pools: Arc<PartitionPools>) -> Self {
        ContributionRepository { pools }
    }
}

#[async_trait]
impl ContributionRepositoryTrait for ContributionRepository {
    fn get_by_id(
        &self,
        partition: &PartitionHandle,
        contribution_id: &str,
    ) -> Result<Contribution> {
        let db = self.pools.get(partition)?;
        let mut conn = get_connection(&db.pool)?;
        contributions::table
            .find(contribution_id)
            .select(ContributionDB::as_select())
            .first::<ContributionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| Error::not_found("Contribution", contribution_id))
            .and_then(Contribution::try_from)
    }

    fn list(
        &self,
        partition: &PartitionHandle,
        filter: &ContributionFilter,
    ) -> Result<Vec<Contribution>> {
        let db = self.pools.get(partition)?;
        let mut conn = get_connection(&db.pool)?;

        let mut query = contributions::table.into_boxed();
        if let Some(need_id) = &filter.need_id {
            query = query.filter(contributions::need_id.eq(need_id));
        }
        if let Some(partner_id) = &filter.partner_id {
            query = query.filter(contributions::partner_id.eq(partner_id));
        }
        if let Some(school_id) = &filter.school_id {
            query = query.filter(contributions::school_id.eq(school_id));
        }
        if let Some(school_year) = &filter.school_year {
            query = query.filter(contributions::school_year.eq(school_year));
        }

        query
            .select(ContributionDB::as_select())
            .order((contributions::created_at.asc(), contributions::id.asc()))
            .load::<ContributionDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(Contribution::try_from)
            .collect()
    }

    fn sum_quantity_for_need(&self, partition: &PartitionHandle, need_id: &str) -> Result<f64> {
        let db = self.pools.get(partition)?;
        let mut conn = get_connection(&db.pool)?;
        let total: Option<f64> = contributions::table
            .filter(contributions::need_id.eq(need_id))
            .select(sum(contributions::quantity))
            .first(&mut conn)
            .map_err(StorageError::from)?;
        Ok(total.unwrap_or(0.0))
    }

    async fn create(
        &self,
        partition: &PartitionHandle,
        new_contribution: NewContribution,
        need: &Need,
    ) -> Result<Contribution> {
        let db = self.pools.get(partition)?;
        let row = ContributionDB::from_new(new_contribution, Uuid::new_v4().to_string(), need);
        db.writer
            .exec(move |conn| -> Result<Contribution> {
                let inserted = diesel::insert_into(contributions::table)
                    .values(&row)
                    .returning(ContributionDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Contribution::try_from(inserted)
            })
            .await
    }

    async fn update(
        &self,
        partition: &PartitionHandle,
        contribution_id: &str,
        update: ContributionUpdate,
        need: &Need,
    ) -> Result<Contribution> {
        let db = self.pools.get(partition)?;
        let contribution_id = contribution_id.to_string();
        let school_id = need.school_id.clone();
        let school_year = need.school_year.clone();
        db.writer
            .exec(move |conn| -> Result<Contribution> {
                let updated = diesel::update(contributions::table.find(&contribution_id))
                    .set((
                        contributions::need_id.eq(update.need_id),
                        contributions::partner_id.eq(update.partner_id),
                        contributions::amount.eq(update.amount.to_string()),
                        contributions::quantity.eq(update.quantity),
                        contributions::unit.eq(update.unit),
                        contributions::signing_date.eq(update.signing_date),
                        contributions::start_date.eq(update.start_date),
                        contributions::end_date.eq(update.end_date),
                        contributions::school_id.eq(school_id),
                        contributions::school_year.eq(school_year),
                        contributions::updated_at.eq(chrono::Utc::now().naive_utc()),
                    ))
                    .returning(ContributionDB::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                updated
                    .ok_or_else(|| Error::not_found("Contribution", contribution_id))
                    .and_then(Contribution::try_from)
            })
            .await
    }

    async fn delete(&self, partition: &PartitionHandle, contribution_id: &str) -> Result<usize> {
        let db = self.pools.get(partition)?;
        let contribution_id = contribution_id.to_string();
        db.writer
            .exec(move |conn| -> Result<usize> {
                Ok(diesel::delete(contributions::table.find(contribution_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }
}
