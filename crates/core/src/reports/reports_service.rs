use log::debug;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::binding::{bind_step, resolve_params};
use super::collections::CollectionRegistry;
use super::pipeline::execute_step;
use super::reports_model::{
    NewReportDefinition, NewReportQuery, ReportDefinition, ReportOutput, ReportQuery,
};
use super::reports_traits::{ReportRepositoryTrait, ReportServiceTrait};
use crate::errors::{Error, Result};
use crate::permissions::CallerIdentity;
use crate::tenants::PartitionHandle;

/// Service for managing and running reports.
pub struct ReportService {
    repository: Arc<dyn ReportRepositoryTrait>,
    registry: Arc<CollectionRegistry>,
}

impl ReportService {
    pub fn new(repository: Arc<dyn ReportRepositoryTrait>, registry: Arc<CollectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// Role allow-list first, then the caller's expanded permissions.
    fn is_allowed(definition: &ReportDefinition, caller: &CallerIdentity) -> bool {
        if !definition.is_restricted() {
            return true;
        }
        if let Some(role) = &caller.role {
            if definition.allowed_roles.iter().any(|r| r == role) {
                return true;
            }
        }
        let expanded = caller.expanded_permissions();
        definition
            .allowed_permissions
            .iter()
            .any(|p| expanded.contains(p))
    }
}

#[async_trait::async_trait]
impl ReportServiceTrait for ReportService {
    fn get_report(&self, partition: &PartitionHandle, report_id: &str) -> Result<ReportDefinition> {
        self.repository.get_definition(partition, report_id)
    }

    fn list_reports(
        &self,
        partition: &PartitionHandle,
        caller: &CallerIdentity,
    ) -> Result<Vec<ReportDefinition>> {
        Ok(self
            .repository
            .list_definitions(partition)?
            .into_iter()
            .filter(|d| Self::is_allowed(d, caller))
            .collect())
    }

    async fn create_report(
        &self,
        partition: &PartitionHandle,
        new_definition: NewReportDefinition,
    ) -> Result<ReportDefinition> {
        new_definition.validate()?;
        self.repository
            .get_query(partition, &new_definition.query_id)?;
        self.repository
            .create_definition(partition, new_definition)
            .await
    }

    async fn delete_report(&self, partition: &PartitionHandle, report_id: &str) -> Result<()> {
        self.repository.get_definition(partition, report_id)?;
        self.repository.delete_definition(partition, report_id).await?;
        Ok(())
    }

    fn get_query(&self, partition: &PartitionHandle, query_id: &str) -> Result<ReportQuery> {
        self.repository.get_query(partition, query_id)
    }

    fn list_queries(&self, partition: &PartitionHandle) -> Result<Vec<ReportQuery>> {
        self.repository.list_queries(partition)
    }

    async fn create_query(
        &self,
        partition: &PartitionHandle,
        new_query: NewReportQuery,
    ) -> Result<ReportQuery> {
        new_query.validate()?;
        self.registry.get(&new_query.collection)?;
        self.repository.create_query(partition, new_query).await
    }

    /// Refused while a report definition still points at the query.
    async fn delete_query(&self, partition: &PartitionHandle, query_id: &str) -> Result<()> {
        self.repository.get_query(partition, query_id)?;
        let users = self
            .repository
            .list_definitions(partition)?
            .into_iter()
            .filter(|d| d.query_id == query_id)
            .count();
        if users > 0 {
            return Err(Error::Conflict(format!(
                "Report query {} is used by {} report(s)",
                query_id, users
            )));
        }
        self.repository.delete_query(partition, query_id).await?;
        Ok(())
    }

    fn run(
        &self,
        partition: &PartitionHandle,
        report_id: &str,
        params: &Map<String, Value>,
        caller: &CallerIdentity,
    ) -> Result<ReportOutput> {
        let definition = self.repository.get_definition(partition, report_id)?;
        if !Self::is_allowed(&definition, caller) {
            return Err(Error::AccessDenied(format!(
                "Report '{}' is not available to this caller",
                definition.name
            )));
        }

        let query = self.repository.get_query(partition, &definition.query_id)?;
        let source = self.registry.get(&query.collection)?;
        let bound_params = resolve_params(&query.params, params)?;

        // Only the first step's result is ever returned.
        let data = match query.steps.first() {
            Some(step) => {
                let step = bind_step(step, &bound_params)?;
                let docs = source.documents(partition)?;
                execute_step(&step, docs, &self.registry, partition)?
            }
            None => Value::Null,
        };
        if query.steps.len() > 1 {
            debug!(
                "Report {} declares {} steps; returning the first",
                report_id,
                query.steps.len()
            );
        }

        Ok(ReportOutput {
            template: definition.template,
            data,
        })
    }
}
