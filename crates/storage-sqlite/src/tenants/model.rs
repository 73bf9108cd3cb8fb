//! Database model for tenants.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use snds_core::tenants::{NewTenant, Tenant};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::tenants)]
#[diesel(primary_key(code))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TenantDB {
    pub code: String,
    pub name: String,
    pub base_url: Option<String>,
    pub is_active: bool,
    pub logo_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<TenantDB> for Tenant {
    fn from(db: TenantDB) -> Self {
        Self {
            code: db.code,
            name: db.name,
            base_url: db.base_url,
            is_active: db.is_active,
            logo_url: db.logo_url,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewTenant> for TenantDB {
    fn from(domain: NewTenant) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            code: domain.code,
            name: domain.name,
            base_url: domain.base_url,
            is_active: domain.is_active,
            logo_url: domain.logo_url,
            created_at: now,
            updated_at: now,
        }
    }
}
