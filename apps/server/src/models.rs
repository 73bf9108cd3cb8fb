//! Wire models for the directory endpoints, documented in the OpenAPI spec.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use snds_core::tenants as core_tenants;
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
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

impl From<core_tenants::Tenant> for Tenant {
    fn from(t: core_tenants::Tenant) -> Self {
        Self {
            code: t.code,
            name: t.name,
            base_url: t.base_url,
            is_active: t.is_active,
            logo_url: t.logo_url,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
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

impl From<NewTenant> for core_tenants::NewTenant {
    fn from(t: NewTenant) -> Self {
        Self {
            code: t.code,
            name: t.name,
            base_url: t.base_url,
            is_active: t.is_active,
            logo_url: t.logo_url,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TenantUpdate {
    pub name: String,
    pub base_url: Option<String>,
    pub is_active: bool,
    pub logo_url: Option<String>,
}

impl From<TenantUpdate> for core_tenants::TenantUpdate {
    fn from(t: TenantUpdate) -> Self {
        Self {
            name: t.name,
            base_url: t.base_url,
            is_active: t.is_active,
            logo_url: t.logo_url,
        }
    }
}
