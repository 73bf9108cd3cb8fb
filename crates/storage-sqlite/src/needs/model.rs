//! Database models for needs.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use snds_core::errors::{Error, Result};
use snds_core::needs::Need;

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::needs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NeedDB {
    pub id: String,
    pub code: String,
    pub school_id: String,
    pub school_year: String,
    pub title: String,
    pub description: Option<String>,
    pub target_quantity: Option<f64>,
    pub unit: Option<String>,
    pub implementation_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Link between a need and one of its plans. `position` keeps the order the
/// plan ids were supplied in.
#[derive(Queryable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::need_plans)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NeedPlanDB {
    pub need_id: String,
    pub plan_id: String,
    pub position: i32,
}

impl NeedPlanDB {
    pub fn links(need_id: &str, plan_ids: &[String]) -> Vec<Self> {
        plan_ids
            .iter()
            .enumerate()
            .map(|(position, plan_id)| NeedPlanDB {
                need_id: need_id.to_string(),
                plan_id: plan_id.clone(),
                position: position as i32,
            })
            .collect()
    }
}

impl NeedDB {
    /// Builds the domain need from the row and its ordered plan ids.
    pub fn into_domain(self, plan_ids: Vec<String>) -> Result<Need> {
        Ok(Need {
            implementation_status: self.implementation_status.parse().map_err(|_| {
                Error::invalid_input(format!(
                    "Stored status '{}' of need {} is not recognized",
                    self.implementation_status, self.id
                ))
            })?,
            id: self.id,
            code: self.code,
            plan_ids,
            school_id: self.school_id,
            school_year: self.school_year,
            title: self.title,
            description: self.description,
            target_quantity: self.target_quantity,
            unit: self.unit,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
