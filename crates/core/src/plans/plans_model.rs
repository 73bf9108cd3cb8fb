//! Plan domain models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::school_year::SchoolYear;
use crate::{errors::ValidationError, Error, Result};

/// Lifecycle status of a plan. Derived from its needs; never set by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlanStatus {
    #[default]
    Created,
    Ongoing,
    ForImplementation,
    Completed,
    Incomplete,
    Unimplemented,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Created => "Created",
            PlanStatus::Ongoing => "Ongoing",
            PlanStatus::ForImplementation => "ForImplementation",
            PlanStatus::Completed => "Completed",
            PlanStatus::Incomplete => "Incomplete",
            PlanStatus::Unimplemented => "Unimplemented",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Created" => Ok(PlanStatus::Created),
            "Ongoing" => Ok(PlanStatus::Ongoing),
            "ForImplementation" => Ok(PlanStatus::ForImplementation),
            "Completed" => Ok(PlanStatus::Completed),
            "Incomplete" => Ok(PlanStatus::Incomplete),
            "Unimplemented" => Ok(PlanStatus::Unimplemented),
            other => Err(Error::invalid_input(format!("Unknown plan status '{}'", other))),
        }
    }
}

/// Domain model representing an annual improvement plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub sequence_number: i64,
    pub school_id: String,
    pub school_year: String,
    pub title: String,
    pub objectives: Vec<String>,
    pub status: PlanStatus,
    pub owner_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Plan {
    pub fn parsed_school_year(&self) -> Result<SchoolYear> {
        self.school_year.parse()
    }
}

/// Input model for creating a plan. New plans always start as `Created`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlan {
    pub school_id: String,
    pub school_year: String,
    pub title: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    pub owner_id: Option<String>,
}

impl NewPlan {
    pub fn validate(&self) -> Result<()> {
        if self.school_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "schoolId".to_string(),
            )));
        }
        if self.title.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Plan title cannot be empty".to_string(),
            )));
        }
        self.school_year.parse::<SchoolYear>()?;
        Ok(())
    }
}

/// Input model for updating a plan. Status is not part of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanUpdate {
    pub school_year: String,
    pub title: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    pub owner_id: Option<String>,
}

impl PlanUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Plan title cannot be empty".to_string(),
            )));
        }
        self.school_year.parse::<SchoolYear>()?;
        Ok(())
    }
}

/// Listing filters for plans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFilter {
    pub school_id: Option<String>,
    pub school_year: Option<String>,
    pub status: Option<PlanStatus>,
}
