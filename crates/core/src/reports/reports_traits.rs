//! Report repository and service traits.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::reports_model::{
    NewReportDefinition, NewReportQuery, ReportDefinition, ReportOutput, ReportQuery,
};
use crate::errors::Result;
use crate::permissions::CallerIdentity;
use crate::tenants::PartitionHandle;

/// Persistence contract for report definitions and report queries.
#[async_trait]
pub trait ReportRepositoryTrait: Send + Sync {
    fn get_definition(&self, partition: &PartitionHandle, report_id: &str)
        -> Result<ReportDefinition>;

    fn list_definitions(&self, partition: &PartitionHandle) -> Result<Vec<ReportDefinition>>;

    async fn create_definition(
        &self,
        partition: &PartitionHandle,
        new_definition: NewReportDefinition,
    ) -> Result<ReportDefinition>;

    async fn delete_definition(&self, partition: &PartitionHandle, report_id: &str)
        -> Result<usize>;

    fn get_query(&self, partition: &PartitionHandle, query_id: &str) -> Result<ReportQuery>;

    fn list_queries(&self, partition: &PartitionHandle) -> Result<Vec<ReportQuery>>;

    async fn create_query(
        &self,
        partition: &PartitionHandle,
        new_query: NewReportQuery,
    ) -> Result<ReportQuery>;

    async fn delete_query(&self, partition: &PartitionHandle, query_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait ReportServiceTrait: Send + Sync {
    fn get_report(&self, partition: &PartitionHandle, report_id: &str) -> Result<ReportDefinition>;

    /// Definitions the caller is allowed to run.
    fn list_reports(
        &self,
        partition: &PartitionHandle,
        caller: &CallerIdentity,
    ) -> Result<Vec<ReportDefinition>>;

    async fn create_report(
        &self,
        partition: &PartitionHandle,
        new_definition: NewReportDefinition,
    ) -> Result<ReportDefinition>;

    async fn delete_report(&self, partition: &PartitionHandle, report_id: &str) -> Result<()>;

    fn get_query(&self, partition: &PartitionHandle, query_id: &str) -> Result<ReportQuery>;

    fn list_queries(&self, partition: &PartitionHandle) -> Result<Vec<ReportQuery>>;

    async fn create_query(
        &self,
        partition: &PartitionHandle,
        new_query: NewReportQuery,
    ) -> Result<ReportQuery>;

    async fn delete_query(&self, partition: &PartitionHandle, query_id: &str) -> Result<()>;

    /// Runs a report for the caller and returns the template with its data.
    fn run(
        &self,
        partition: &PartitionHandle,
        report_id: &str,
        params: &Map<String, Value>,
        caller: &CallerIdentity,
    ) -> Result<ReportOutput>;
}
