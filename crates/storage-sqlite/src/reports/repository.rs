use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use super::model::{ReportDefinitionDB, ReportQueryDB};
use crate::db::{get_connection, PartitionPools};
use crate::errors::StorageError;
use crate::schema::{report_definitions, report_queries};
use snds_core::errors::{Error, Result};
use snds_core::reports::{
    NewReportDefinition, NewReportQuery, ReportDefinition, ReportQuery, ReportRepositoryTrait,
};
use snds_core::PartitionHandle;

pub struct ReportRepository {
    pools: Arc<PartitionPools>,
}

impl ReportRepository {
    pub fn new(pools: Arc<PartitionPools>) -> Self {
        ReportRepository { pools }
    }
}

#[async_trait]
impl ReportRepositoryTrait for ReportRepository {
    fn get_definition(
        &self,
        partition: &PartitionHandle,
        report_id: &str,
    ) -> Result<ReportDefinition> {
        let db = self.pools.get(partition)?;
        let mut conn = get_connection(&db.pool)?;
        report_definitions::table
            .find(report_id)
            .select(ReportDefinitionDB::as_select())
            .first::<ReportDefinitionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| Error::not_found("Report", report_id))
            .and_then(ReportDefinition::try_from)
    }

    fn list_definitions(&self, partition: &PartitionHandle) -> Result<Vec<ReportDefinition>> {
        let db = self.pools.get(partition)?;
        let mut conn = get_connection(&db.pool)?;
        report_definitions::table
            .select(ReportDefinitionDB::as_select())
            .order(report_definitions::name.asc())
            .load::<ReportDefinitionDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(ReportDefinition::try_from)
            .collect()
    }

    async fn create_definition(
        &self,
        partition: &PartitionHandle,
        new_definition: NewReportDefinition,
    ) -> Result<ReportDefinition> {
        let db = self.pools.get(partition)?;
        let row = ReportDefinitionDB::from_new(new_definition, Uuid::new_v4().to_string())?;
        db.writer
            .exec(move |conn| -> Result<ReportDefinition> {
                let inserted = diesel::insert_into(report_definitions::table)
                    .values(&row)
                    .returning(ReportDefinitionDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                ReportDefinition::try_from(inserted)
            })
            .await
    }

    async fn delete_definition(
        &self,
        partition: &PartitionHandle,
        report_id: &str,
    ) -> Result<usize> {
        let db = self.pools.get(partition)?;
        let report_id = report_id.to_string();
        db.writer
            .exec(move |conn| -> Result<usize> {
                Ok(diesel::delete(report_definitions::table.find(report_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    fn get_query(&self, partition: &PartitionHandle, query_id: &str) -> Result<ReportQuery> {
        let db = self.pools.get(partition)?;
        let mut conn = get_connection(&db.pool)?;
        report_queries::table
            .find(query_id)
            .select(ReportQueryDB::as_select())
            .first::<ReportQueryDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| Error::not_found("ReportQuery", query_id))
            .and_then(ReportQuery::try_from)
    }

    fn list_queries(&self, partition: &PartitionHandle) -> Result<Vec<ReportQuery>> {
        let db = self.pools.get(partition)?;
        let mut conn = get_connection(&db.pool)?;
        report_queries::table
            .select(ReportQueryDB::as_select())
            .order(report_queries::name.asc())
            .load::<ReportQueryDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(ReportQuery::try_from)
            .collect()
    }

    async fn create_query(
        &self,
        partition: &PartitionHandle,
        new_query: NewReportQuery,
    ) -> Result<ReportQuery> {
        let db = self.pools.get(partition)?;
        let row = ReportQueryDB::from_new(new_query, Uuid::new_v4().to_string())?;
        db.writer
            .exec(move |conn| -> Result<ReportQuery> {
                let inserted = diesel::insert_into(report_queries::table)
                    .values(&row)
                    .returning(ReportQueryDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                ReportQuery::try_from(inserted)
            })
            .await
    }

    async fn delete_query(&self, partition: &PartitionHandle, query_id: &str) -> Result<usize> {
        let db = self.pools.get(partition)?;
        let query_id = query_id.to_string();
        db.writer
            .exec(move |conn| -> Result<usize> {
                Ok(diesel::delete(report_queries::table.find(query_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use snds_core::reports::QueryStep;
    use tempfile::tempdir;

    fn needs_by_year() -> NewReportQuery {
        serde_json::from_value(json!({
            "name": "Needs by year",
            "collection": "needs",
            "params": [{"name": "year", "type": "string", "required": true}],
            "steps": [
                {"op": "find", "filter": {"schoolYear": "{{year}}"},
                 "sort": [{"field": "code", "direction": "asc"}], "limit": 10},
                {"op": "count", "filter": {}}
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn queries_keep_their_steps_and_params() {
        let dir = tempdir().unwrap();
        let repo = ReportRepository::new(Arc::new(PartitionPools::new(dir.path())));
        let p = PartitionHandle::for_tenant("ncr");

        let created = repo.create_query(&p, needs_by_year()).await.unwrap();
        let loaded = repo.get_query(&p, &created.id).unwrap();
        assert_eq!(loaded.params, created.params);
        assert_eq!(loaded.steps, created.steps);
        assert!(matches!(loaded.steps[0], QueryStep::Find(_)));
        assert_eq!(repo.list_queries(&p).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn definitions_reference_existing_queries() {
        let dir = tempdir().unwrap();
        let repo = ReportRepository::new(Arc::new(PartitionPools::new(dir.path())));
        let p = PartitionHandle::for_tenant("ncr");
        let query = repo.create_query(&p, needs_by_year()).await.unwrap();

        let definition = repo
            .create_definition(
                &p,
                NewReportDefinition {
                    name: "Division needs".to_string(),
                    template: "needs.hbs".to_string(),
                    query_id: query.id.clone(),
                    allowed_roles: vec!["division_admin".to_string()],
                    allowed_permissions: vec!["view_reports".to_string()],
                },
            )
            .await
            .unwrap();
        let loaded = repo.get_definition(&p, &definition.id).unwrap();
        assert_eq!(loaded.allowed_roles, vec!["division_admin"]);
        assert!(loaded.is_restricted());

        let dangling = repo
            .create_definition(
                &p,
                NewReportDefinition {
                    name: "Broken".to_string(),
                    template: "t".to_string(),
                    query_id: "missing".to_string(),
                    allowed_roles: vec![],
                    allowed_permissions: vec![],
                },
            )
            .await;
        assert!(dangling.is_err());

        assert_eq!(repo.delete_definition(&p, &definition.id).await.unwrap(), 1);
        assert!(matches!(
            repo.get_definition(&p, &definition.id),
            Err(Error::NotFound { entity: "Report", .. })
        ));
        assert_eq!(repo.delete_query(&p, &query.id).await.unwrap(), 1);
    }
}
