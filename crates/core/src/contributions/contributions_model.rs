//! Contribution domain models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{errors::ValidationError, Error, Result};

/// A partner's pledged or delivered quantity against one need.
///
/// `school_id` and `school_year` are copied from the need when the
/// contribution is written and are kept for query efficiency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub id: String,
    pub need_id: String,
    pub partner_id: String,
    pub amount: Decimal,
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

/// Input model for creating a contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContribution {
    pub need_id: String,
    pub partner_id: String,
    #[serde(default)]
    pub amount: Decimal,
    pub quantity: f64,
    pub unit: Option<String>,
    pub signing_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl NewContribution {
    pub fn validate(&self) -> Result<()> {
        if self.need_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "needId".to_string(),
            )));
        }
        if self.partner_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "partnerId".to_string(),
            )));
        }
        validate_figures(self.quantity, self.amount)?;
        validate_dates(self.start_date, self.end_date)
    }
}

/// Input model for updating a contribution.
///
/// Moving a contribution to another need re-copies that need's school data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionUpdate {
    pub need_id: String,
    pub partner_id: String,
    #[serde(default)]
    pub amount: Decimal,
    pub quantity: f64,
    pub unit: Option<String>,
    pub signing_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ContributionUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.need_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "needId".to_string(),
            )));
        }
        if self.partner_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "partnerId".to_string(),
            )));
        }
        validate_figures(self.quantity, self.amount)?;
        validate_dates(self.start_date, self.end_date)
    }
}

fn validate_figures(quantity: f64, amount: Decimal) -> Result<()> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "Invalid quantity {}",
            quantity
        ))));
    }
    if amount.is_sign_negative() {
        return Err(Error::Validation(ValidationError::InvalidInput(
            "Amount cannot be negative".to_string(),
        )));
    }
    Ok(())
}

fn validate_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "End date {} is before start date {}",
                end, start
            ))));
        }
    }
    Ok(())
}

/// Listing filters for contributions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionFilter {
    pub need_id: Option<String>,
    pub partner_id: Option<String>,
    pub school_id: Option<String>,
    pub school_year: Option<String>,
}
