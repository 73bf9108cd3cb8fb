//! Database model for plans.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use snds_core::errors::{Error, Result};
use snds_core::plans::{NewPlan, Plan, PlanStatus};

/// Plan row. `objectives` is stored as a JSON array.
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::plans)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PlanDB {
    pub id: String,
    pub sequence_number: i64,
    pub school_id: String,
    pub school_year: String,
    pub title: String,
    pub objectives: String,
    pub status: String,
    pub owner_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl PlanDB {
    pub fn from_new(domain: NewPlan, id: String, sequence_number: i64) -> Result<Self> {
        let now = chrono::Utc::now().naive_utc();
        Ok(Self {
            id,
            sequence_number,
            school_id: domain.school_id,
            school_year: domain.school_year,
            title: domain.title,
            objectives: serde_json::to_string(&domain.objectives)?,
            status: PlanStatus::Created.to_string(),
            owner_id: domain.owner_id,
            created_at: now,
            updated_at: now,
        })
    }
}

impl TryFrom<PlanDB> for Plan {
    type Error = Error;

    fn try_from(db: PlanDB) -> Result<Self> {
        Ok(Self {
            objectives: serde_json::from_str(&db.objectives)?,
            status: db.status.parse()?,
            id: db.id,
            sequence_number: db.sequence_number,
            school_id: db.school_id,
            school_year: db.school_year,
            title: db.title,
            owner_id: db.owner_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
