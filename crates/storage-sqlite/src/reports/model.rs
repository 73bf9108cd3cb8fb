//! Database models for reports. List and step columns hold JSON text.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use snds_core::errors::{Error, Result};
use snds_core::reports::{NewReportDefinition, NewReportQuery, ReportDefinition, ReportQuery};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::report_definitions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReportDefinitionDB {
    pub id: String,
    pub name: String,
    pub template: String,
    pub query_id: String,
    pub allowed_roles: String,
    pub allowed_permissions: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ReportDefinitionDB {
    pub fn from_new(domain: NewReportDefinition, id: String) -> Result<Self> {
        let now = chrono::Utc::now().naive_utc();
        Ok(Self {
            id,
            name: domain.name,
            template: domain.template,
            query_id: domain.query_id,
            allowed_roles: serde_json::to_string(&domain.allowed_roles)?,
            allowed_permissions: serde_json::to_string(&domain.allowed_permissions)?,
            created_at: now,
            updated_at: now,
        })
    }
}

impl TryFrom<ReportDefinitionDB> for ReportDefinition {
    type Error = Error;

    fn try_from(db: ReportDefinitionDB) -> Result<Self> {
        Ok(Self {
            allowed_roles: serde_json::from_str(&db.allowed_roles)?,
            allowed_permissions: serde_json::from_str(&db.allowed_permissions)?,
            id: db.id,
            name: db.name,
            template: db.template,
            query_id: db.query_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::report_queries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReportQueryDB {
    pub id: String,
    pub name: String,
    pub collection: String,
    pub params: String,
    pub steps: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ReportQueryDB {
    pub fn from_new(domain: NewReportQuery, id: String) -> Result<Self> {
        let now = chrono::Utc::now().naive_utc();
        Ok(Self {
            id,
            name: domain.name,
            collection: domain.collection,
            params: serde_json::to_string(&domain.params)?,
            steps: serde_json::to_string(&domain.steps)?,
            created_at: now,
            updated_at: now,
        })
    }
}

impl TryFrom<ReportQueryDB> for ReportQuery {
    type Error = Error;

    fn try_from(db: ReportQueryDB) -> Result<Self> {
        Ok(Self {
            params: serde_json::from_str(&db.params)?,
            steps: serde_json::from_str(&db.steps)?,
            id: db.id,
            name: db.name,
            collection: db.collection,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
