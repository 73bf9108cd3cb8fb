//! Report definition and report query models.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{errors::ValidationError, Error, Result};

/// A named report: which template renders it and which query feeds it.
///
/// Empty `allowed_roles` and `allowed_permissions` mean anyone may run it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportDefinition {
    pub id: String,
    pub name: String,
    pub template: String,
    pub query_id: String,
    pub allowed_roles: Vec<String>,
    pub allowed_permissions: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ReportDefinition {
    pub fn is_restricted(&self) -> bool {
        !self.allowed_roles.is_empty() || !self.allowed_permissions.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReportDefinition {
    pub name: String,
    pub template: String,
    pub query_id: String,
    #[serde(default)]
    pub allowed_roles: Vec<String>,
    #[serde(default)]
    pub allowed_permissions: Vec<String>,
}

impl NewReportDefinition {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }
        if self.template.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "template".to_string(),
            )));
        }
        if self.query_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "queryId".to_string(),
            )));
        }
        Ok(())
    }
}

/// Declared type of a report parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Number,
    Boolean,
    /// `YYYY-MM-DD`, bound as a string so it compares like stored dates.
    Date,
}

/// A parameter a report query accepts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    /// Coerces a caller-supplied value to the declared type.
    pub fn coerce(&self, value: &Value) -> Result<Value> {
        let invalid = || {
            Error::invalid_input(format!(
                "Parameter '{}' is not a valid {:?}",
                self.name, self.param_type
            ))
        };
        match (self.param_type, value) {
            (ParamType::String, Value::String(_)) => Ok(value.clone()),
            (ParamType::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (ParamType::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
            (ParamType::Number, Value::Number(_)) => Ok(value.clone()),
            (ParamType::Number, Value::String(s)) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    return Ok(Value::from(i));
                }
                s.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(invalid)
            }
            (ParamType::Boolean, Value::Bool(_)) => Ok(value.clone()),
            (ParamType::Boolean, Value::String(s)) => match s.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            (ParamType::Date, Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

/// Sort direction for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SortKey {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Replaces id references in `path` with documents from another collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopulateSpec {
    pub path: String,
    pub from: String,
    #[serde(default = "default_foreign_field")]
    pub foreign_field: String,
}

fn default_foreign_field() -> String {
    "id".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FindStep {
    #[serde(default)]
    pub filter: Value,
    #[serde(default)]
    pub sort: Vec<SortKey>,
    #[serde(default)]
    pub skip: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub populate: Vec<PopulateSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountStep {
    #[serde(default)]
    pub filter: Value,
}

/// Group accumulator, written as `{"$sum": "$quantity"}` and the like.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Accumulator {
    #[serde(rename = "$sum")]
    Sum(Value),
    #[serde(rename = "$avg")]
    Avg(Value),
    #[serde(rename = "$min")]
    Min(Value),
    #[serde(rename = "$max")]
    Max(Value),
    #[serde(rename = "$first")]
    First(Value),
    #[serde(rename = "$last")]
    Last(Value),
    #[serde(rename = "$push")]
    Push(Value),
    #[serde(rename = "$addToSet")]
    AddToSet(Value),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupStage {
    /// Grouping key expression; `null` puts every document in one group.
    #[serde(rename = "_id")]
    pub key: Value,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Accumulator>,
}

/// One aggregation pipeline stage, e.g. `{"$match": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Stage {
    #[serde(rename = "$match")]
    Match(Value),
    #[serde(rename = "$group")]
    Group(GroupStage),
    #[serde(rename = "$sort")]
    Sort(Vec<SortKey>),
    #[serde(rename = "$skip")]
    Skip(usize),
    #[serde(rename = "$limit")]
    Limit(usize),
    #[serde(rename = "$project")]
    Project(Map<String, Value>),
    #[serde(rename = "$unwind")]
    Unwind(String),
    #[serde(rename = "$count")]
    Count(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStep {
    pub pipeline: Vec<Stage>,
}

/// One operation of a report query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum QueryStep {
    Find(FindStep),
    Count(CountStep),
    Aggregate(AggregateStep),
}

/// A stored, parameterized query over one named collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub id: String,
    pub name: String,
    pub collection: String,
    pub params: Vec<ParamSpec>,
    pub steps: Vec<QueryStep>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReportQuery {
    pub name: String,
    pub collection: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    pub steps: Vec<QueryStep>,
}

impl NewReportQuery {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }
        if self.collection.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "collection".to_string(),
            )));
        }
        if self.steps.is_empty() {
            return Err(Error::invalid_input("A report query needs at least one step"));
        }
        let mut seen = std::collections::HashSet::new();
        for param in &self.params {
            if param.name.trim().is_empty() || !seen.insert(param.name.as_str()) {
                return Err(Error::invalid_input(format!(
                    "Invalid or duplicate parameter name '{}'",
                    param.name
                )));
            }
            if let Some(default) = &param.default {
                param.coerce(default)?;
            }
        }
        Ok(())
    }
}

/// What a report run hands to the template renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutput {
    pub template: String,
    pub data: Value,
}
