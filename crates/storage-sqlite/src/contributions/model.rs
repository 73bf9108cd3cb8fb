//! Database model for contributions.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;

use snds_core::contributions::{Contribution, NewContribution};
use snds_core::errors::{Error, Result};
use snds_core::needs::Need;

/// Contribution row. `amount` is stored as decimal text to keep precision.
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::contributions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ContributionDB {
    pub id: String,
    pub need_id: String,
    pub partner_id: String,
    pub amount: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub signing_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub school_id: String,
    pub school_year: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ContributionDB {
    pub fn from_new(domain: NewContribution, id: String, need: &Need) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            need_id: domain.need_id,
            partner_id: domain.partner_id,
            amount: domain.amount.to_string(),
            quantity: domain.quantity,
            unit: domain.unit,
            signing_date: domain.signing_date,
            start_date: domain.start_date,
            end_date: domain.end_date,
            school_id: need.school_id.clone(),
            school_year: need.school_year.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl TryFrom<ContributionDB> for Contribution {
    type Error = Error;

    fn try_from(db: ContributionDB) -> Result<Self> {
        Ok(Self {
            amount: Decimal::from_str(&db.amount)?,
            id: db.id,
            need_id: db.need_id,
            partner_id: db.partner_id,
            quantity: db.quantity,
            unit: db.unit,
            signing_date: db.signing_date,
            start_date: db.start_date,
            end_date: db.end_date,
            school_id: db.school_id,
            school_year: db.school_year,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
