use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::permission_graph::{expand, has_permission};
use crate::errors::{Error, Result};

/// Identity of the caller as supplied by the upstream identity service.
///
/// `permissions` holds the capabilities that were granted; the implied ones
/// are derived on demand through the permission graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    pub role: Option<String>,
    pub permissions: HashSet<String>,
}

impl CallerIdentity {
    pub fn new(role: Option<String>, permissions: impl IntoIterator<Item = String>) -> Self {
        Self {
            role,
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Parses a comma separated permission list as sent in request headers.
    pub fn from_header_values(role: Option<&str>, permissions: Option<&str>) -> Self {
        let role = role
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        let permissions = permissions
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        Self::new(role, permissions)
    }

    pub fn expanded_permissions(&self) -> BTreeSet<String> {
        expand(&self.permissions)
    }

    pub fn can(&self, capability: &str) -> bool {
        has_permission(&self.permissions, capability)
    }

    /// Fails with `AccessDenied` unless the caller holds `capability`.
    pub fn require(&self, capability: &str) -> Result<()> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(Error::AccessDenied(format!(
                "Missing permission '{}'",
                capability
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_values() {
        let identity =
            CallerIdentity::from_header_values(Some(" admin "), Some("manage_plans, ,view_needs"));
        assert_eq!(identity.role.as_deref(), Some("admin"));
        assert_eq!(identity.permissions.len(), 2);
        assert!(identity.can("view_plans"));
    }

    #[test]
    fn empty_headers_give_anonymous_identity() {
        let identity = CallerIdentity::from_header_values(Some(""), None);
        assert_eq!(identity, CallerIdentity::default());
        assert!(matches!(
            identity.require("view_reports"),
            Err(Error::AccessDenied(_))
        ));
    }
}
