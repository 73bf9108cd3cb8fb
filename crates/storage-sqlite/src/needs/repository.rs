use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::model::{NeedDB, NeedPlanDB};
use crate::db::{get_connection, PartitionPools};
use crate::errors::StorageError;
use crate::schema::{contributions, need_plans, needs};
use crate::utils::chunk_for_sqlite;
use snds_core::errors::{Error, Result, ValidationError};
use snds_core::needs::{Need, NeedFilter, NeedRepositoryTrait, NeedStatus, NeedUpdate, NewNeed};
use snds_core::PartitionHandle;

pub struct NeedRepository {
    pools: Arc<PartitionPools>,
}

impl NeedRepository {
    pub fn new(pools: Arc<PartitionPools>) -> Self {
        NeedRepository { pools }
    }
}

/// Ordered plan ids for each of the given needs.
fn load_plan_ids(
    conn: &mut SqliteConnection,
    need_ids: &[String],
) -> Result<HashMap<String, Vec<String>>> {
    let mut by_need: HashMap<String, Vec<String>> = HashMap::new();
    for chunk in chunk_for_sqlite(need_ids) {
        let links = need_plans::table
            .filter(need_plans::need_id.eq_any(chunk))
            .order((need_plans::need_id.asc(), need_plans::position.asc()))
            .select(NeedPlanDB::as_select())
            .load::<NeedPlanDB>(conn)
            .map_err(StorageError::from)?;
        for link in links {
            by_need.entry(link.need_id).or_default().push(link.plan_id);
        }
    }
    Ok(by_need)
}

fn attach_plans(conn: &mut SqliteConnection, rows: Vec<NeedDB>) -> Result<Vec<Need>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut plan_ids = load_plan_ids(conn, &ids)?;
    rows.into_iter()
        .map(|row| {
            let links = plan_ids.remove(&row.id).unwrap_or_default();
            row.into_domain(links)
        })
        .collect()
}

fn find_need(conn: &mut SqliteConnection, need_id: &str) -> Result<Need> {
    let row = needs::table
        .find(need_id)
        .select(NeedDB::as_select())
        .first::<NeedDB>(conn)
        .optional()
        .map_err(StorageError::from)?
        .ok_or_else(|| Error::not_found("Need", need_id))?;
    attach_plans(conn, vec![row])?
        .pop()
        .ok_or_else(|| Error::not_found("Need", need_id))
}

fn replace_links(conn: &mut SqliteConnection, need_id: &str, plan_ids: &[String]) -> Result<()> {
    diesel::delete(need_plans::table.filter(need_plans::need_id.eq(need_id)))
        .execute(conn)
        .map_err(StorageError::from)?;
    diesel::insert_into(need_plans::table)
        .values(&NeedPlanDB::links(need_id, plan_ids))
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

fn dedup_preserving_order(plan_ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    plan_ids
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

#[async_trait]
impl NeedRepositoryTrait for NeedRepository {
    fn get_by_id(&self, partition: &PartitionHandle, need_id: &str) -> Result<Need> {
        let db = self.pools.get(partition)?;
        let mut conn = get_connection(&db.pool)?;
        find_need(&mut conn, need_id)
    }

    fn list(&self, partition: &PartitionHandle, filter: &NeedFilter) -> Result<Vec<Need>> {
        let db = self.pools.get(partition)?;
        let mut conn = get_connection(&db.pool)?;

        let mut query = needs::table.into_boxed();
        if let Some(plan_id) = &filter.plan_id {
            let linked = need_plans::table
                .filter(need_plans::plan_id.eq(plan_id.clone()))
                .select(need_plans::need_id);
            query = query.filter(needs::id.eq_any(linked));
        }
        if let Some(school_id) = &filter.school_id {
            query = query.filter(needs::school_id.eq(school_id));
        }
        if let Some(school_year) = &filter.school_year {
            query = query.filter(needs::school_year.eq(school_year));
        }

        let rows = query
            .select(NeedDB::as_select())
            .order(needs::code.asc())
            .load::<NeedDB>(&mut conn)
            .map_err(StorageError::from)?;
        attach_plans(&mut conn, rows)
    }

    fn list_by_plan(&self, partition: &PartitionHandle, plan_id: &str) -> Result<Vec<Need>> {
        self.list(
            partition,
            &NeedFilter {
                plan_id: Some(plan_id.to_string()),
                ..Default::default()
            },
        )
    }

    async fn create(
        &self,
        partition: &PartitionHandle,
        new_need: NewNeed,
        code: String,
    ) -> Result<Need> {
        let school_id = new_need.school_id.clone().ok_or_else(|| {
            Error::Validation(ValidationError::MissingField("schoolId".to_string()))
        })?;
        let school_year = new_need.school_year.clone().ok_or_else(|| {
            Error::Validation(ValidationError::MissingField("schoolYear".to_string()))
        })?;

        let db = self.pools.get(partition)?;
        db.writer
            .exec(move |conn| -> Result<Need> {
                let now = chrono::Utc::now().naive_utc();
                let row = NeedDB {
                    id: Uuid::new_v4().to_string(),
                    code,
                    school_id,
                    school_year,
                    title: new_need.title,
                    description: new_need.description,
                    target_quantity: new_need.target_quantity,
                    unit: new_need.unit,
                    implementation_status: NeedStatus::LookingForPartner.to_string(),
                    created_at: now,
                    updated_at: now,
                };
                diesel::insert_into(needs::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                replace_links(conn, &row.id, &dedup_preserving_order(new_need.plan_ids))?;
                find_need(conn, &row.id)
            })
            .await
    }

    async fn update(
        &self,
        partition: &PartitionHandle,
        need_id: &str,
        update: NeedUpdate,
    ) -> Result<Need> {
        let db = self.pools.get(partition)?;
        let need_id = need_id.to_string();
        db.writer
            .exec(move |conn| -> Result<Need> {
                let affected = diesel::update(needs::table.find(&need_id))
                    .set((
                        needs::title.eq(update.title),
                        needs::description.eq(update.description),
                        needs::target_quantity.eq(update.target_quantity),
                        needs::unit.eq(update.unit),
                        needs::updated_at.eq(chrono::Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(Error::not_found("Need", need_id));
                }
                replace_links(conn, &need_id, &dedup_preserving_order(update.plan_ids))?;
                find_need(conn, &need_id)
            })
            .await
    }

    async fn update_status(
        &self,
        partition: &PartitionHandle,
        need_id: &str,
        status: NeedStatus,
    ) -> Result<()> {
        let db = self.pools.get(partition)?;
        let need_id = need_id.to_string();
        db.writer
            .exec(move |conn| -> Result<()> {
                let affected = diesel::update(needs::table.find(&need_id))
                    .set(needs::implementation_status.eq(status.to_string()))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(Error::not_found("Need", need_id));
                }
                Ok(())
            })
            .await
    }

    async fn delete(&self, partition: &PartitionHandle, need_id: &str) -> Result<usize> {
        let db = self.pools.get(partition)?;
        let need_id = need_id.to_string();
        db.writer
            .exec(move |conn| -> Result<usize> {
                diesel::delete(contributions::table.filter(contributions::need_id.eq(&need_id)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                diesel::delete(need_plans::table.filter(need_plans::need_id.eq(&need_id)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(diesel::delete(needs::table.find(&need_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }
}
