//! Need domain models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::plans::SchoolYear;
use crate::{errors::ValidationError, Error, Result};

/// Fulfillment state of a need, derived from its contributions.
///
/// Serialized as the display string: `LookingForPartner`, `40% Complete`,
/// or `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NeedStatus {
    #[default]
    LookingForPartner,
    PercentComplete(u32),
    Completed,
}

impl NeedStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, NeedStatus::Completed)
    }
}

impl fmt::Display for NeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeedStatus::LookingForPartner => f.write_str("LookingForPartner"),
            NeedStatus::PercentComplete(pct) => write!(f, "{}% Complete", pct),
            NeedStatus::Completed => f.write_str("Completed"),
        }
    }
}

impl FromStr for NeedStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LookingForPartner" => Ok(NeedStatus::LookingForPartner),
            "Completed" => Ok(NeedStatus::Completed),
            other => other
                .strip_suffix("% Complete")
                .and_then(|pct| pct.parse::<u32>().ok())
                .map(NeedStatus::PercentComplete)
                .ok_or_else(|| Error::invalid_input(format!("Unknown need status '{}'", other))),
        }
    }
}

impl TryFrom<String> for NeedStatus {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<NeedStatus> for String {
    fn from(status: NeedStatus) -> Self {
        status.to_string()
    }
}

/// Domain model representing a need.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Need {
    pub id: String,
    pub code: String,
    pub plan_ids: Vec<String>,
    pub school_id: String,
    pub school_year: String,
    pub title: String,
    pub description: Option<String>,
    pub target_quantity: Option<f64>,
    pub unit: Option<String>,
    pub implementation_status: NeedStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Need {
    /// Target quantity usable for status derivation, if any.
    pub fn effective_target(&self) -> Option<f64> {
        self.target_quantity.filter(|t| *t > 0.0)
    }
}

/// Input model for creating a need.
///
/// `school_id` and `school_year` default to those of the first plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNeed {
    pub plan_ids: Vec<String>,
    pub school_id: Option<String>,
    pub school_year: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub target_quantity: Option<f64>,
    pub unit: Option<String>,
}

impl NewNeed {
    pub fn validate(&self) -> Result<()> {
        if self.plan_ids.is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "planIds".to_string(),
            )));
        }
        if self.title.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Need title cannot be empty".to_string(),
            )));
        }
        validate_target(self.target_quantity)?;
        if let Some(year) = &self.school_year {
            year.parse::<SchoolYear>()?;
        }
        Ok(())
    }
}

/// Input model for updating a need. The status is never part of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedUpdate {
    pub plan_ids: Vec<String>,
    pub title: String,
    pub description: Option<String>,
    pub target_quantity: Option<f64>,
    pub unit: Option<String>,
}

impl NeedUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.plan_ids.is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "planIds".to_string(),
            )));
        }
        if self.title.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Need title cannot be empty".to_string(),
            )));
        }
        validate_target(self.target_quantity)
    }
}

fn validate_target(target: Option<f64>) -> Result<()> {
    match target {
        Some(t) if !t.is_finite() || t < 0.0 => Err(Error::Validation(
            ValidationError::InvalidInput(format!("Invalid target quantity {}", t)),
        )),
        _ => Ok(()),
    }
}

/// Listing filters for needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedFilter {
    pub plan_id: Option<String>,
    pub school_id: Option<String>,
    pub school_year: Option<String>,
}

/// A need together with its aggregate contribution figures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NeedSummary {
    #[serde(flatten)]
    pub need: Need,
    pub fulfilled_quantity: f64,
    pub contribution_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings() {
        assert_eq!(NeedStatus::PercentComplete(40).to_string(), "40% Complete");
        assert_eq!(
            "40% Complete".parse::<NeedStatus>().unwrap(),
            NeedStatus::PercentComplete(40)
        );
        assert_eq!(
            serde_json::to_string(&NeedStatus::LookingForPartner).unwrap(),
            "\"LookingForPartner\""
        );
        let parsed: NeedStatus = serde_json::from_str("\"Completed\"").unwrap();
        assert!(parsed.is_completed());
        assert!("half done".parse::<NeedStatus>().is_err());
    }

    #[test]
    fn new_need_validation() {
        let mut need = NewNeed {
            plan_ids: vec!["plan-1".to_string()],
            school_id: None,
            school_year: None,
            title: "Books".to_string(),
            description: None,
            target_quantity: Some(100.0),
            unit: Some("books".to_string()),
        };
        assert!(need.validate().is_ok());

        need.target_quantity = Some(-1.0);
        assert!(need.validate().is_err());

        need.target_quantity = None;
        need.plan_ids.clear();
        assert!(matches!(
            need.validate(),
            Err(Error::Validation(ValidationError::MissingField(_)))
        ));
    }

    #[test]
    fn zero_target_is_not_effective() {
        let need = Need {
            id: "n".into(),
            code: "NEED-000001".into(),
            plan_ids: vec![],
            school_id: "s".into(),
            school_year: "2024-2025".into(),
            title: "t".into(),
            description: None,
            target_quantity: Some(0.0),
            unit: None,
            implementation_status: NeedStatus::default(),
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        };
        assert_eq!(need.effective_target(), None);
    }
}
