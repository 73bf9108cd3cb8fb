//! Tenant domain models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{errors::ValidationError, Error, Result};

/// A tenant organization registered in the directory.
///
/// `code` is the routing key; it is immutable once the tenant exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub code: String,
    pub name: String,
    pub base_url: Option<String>,
    pub is_active: bool,
    pub logo_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for registering a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTenant {
    pub code: String,
    pub name: String,
    pub base_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub logo_url: Option<String>,
}

fn default_active() -> bool {
    true
}

impl NewTenant {
    /// Validates the new tenant data.
    ///
    /// The code ends up in a physical partition name, so only ASCII
    /// alphanumerics, `-` and `_` are accepted.
    pub fn validate(&self) -> Result<()> {
        validate_code(&self.code)?;
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Tenant name cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

fn validate_code(code: &str) -> Result<()> {
    if code.is_empty() {
        return Err(Error::Validation(ValidationError::MissingField(
            "code".to_string(),
        )));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "Tenant code '{}' may only contain letters, digits, '-' and '_'",
            code
        ))));
    }
    Ok(())
}

/// Input model for updating a tenant. The code is never changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantUpdate {
    pub name: String,
    pub base_url: Option<String>,
    pub is_active: bool,
    pub logo_url: Option<String>,
}

impl TenantUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Tenant name cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_tenant(code: &str) -> NewTenant {
        NewTenant {
            code: code.to_string(),
            name: "Division Office".to_string(),
            base_url: None,
            is_active: true,
            logo_url: None,
        }
    }

    #[test]
    fn accepts_simple_codes() {
        assert!(new_tenant("deped-ncr_01").validate().is_ok());
    }

    #[test]
    fn rejects_empty_code() {
        let err = new_tenant("").validate().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingField(_))
        ));
    }

    #[test]
    fn rejects_path_like_codes() {
        assert!(new_tenant("../etc").validate().is_err());
        assert!(new_tenant("a b").validate().is_err());
    }

    #[test]
    fn new_tenant_defaults_to_active() {
        let tenant: NewTenant =
            serde_json::from_str(r#"{"code":"ncr","name":"NCR"}"#).unwrap();
        assert!(tenant.is_active);
    }
}
