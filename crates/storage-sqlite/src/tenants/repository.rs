use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use super::model::TenantDB;
use crate::db::{get_connection, Database, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::tenants;
use snds_core::errors::{Error, Result};
use snds_core::tenants::{NewTenant, Tenant, TenantRepositoryTrait, TenantUpdate};

/// Tenant directory backed by `directory.db`.
pub struct TenantRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TenantRepository {
    pub fn new(directory: Database) -> Self {
        TenantRepository {
            pool: directory.pool,
            writer: directory.writer,
        }
    }
}

#[async_trait]
impl TenantRepositoryTrait for TenantRepository {
    fn find_by_code(&self, code: &str) -> Result<Option<Tenant>> {
        let mut conn = get_connection(&self.pool)?;
        let tenant = tenants::table
            .find(code)
            .select(TenantDB::as_select())
            .first::<TenantDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(tenant.map(Tenant::from))
    }

    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Tenant>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = tenants::table.into_boxed();
        if let Some(active) = is_active_filter {
            query = query.filter(tenants::is_active.eq(active));
        }
        let rows = query
            .select(TenantDB::as_select())
            .order(tenants::code.asc())
            .load::<TenantDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Tenant::from).collect())
    }

    async fn create(&self, new_tenant: NewTenant) -> Result<Tenant> {
        self.writer
            .exec(move |conn| -> Result<Tenant> {
                let row: TenantDB = new_tenant.into();
                let inserted = diesel::insert_into(tenants::table)
                    .values(&row)
                    .returning(TenantDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(inserted.into())
            })
            .await
    }

    async fn update(&self, code: &str, update: TenantUpdate) -> Result<Tenant> {
        let code = code.to_string();
        self.writer
            .exec(move |conn| -> Result<Tenant> {
                let updated = diesel::update(tenants::table.find(&code))
                    .set((
                        tenants::name.eq(update.name),
                        tenants::base_url.eq(update.base_url),
                        tenants::is_active.eq(update.is_active),
                        tenants::logo_url.eq(update.logo_url),
                        tenants::updated_at.eq(chrono::Utc::now().naive_utc()),
                    ))
                    .returning(TenantDB::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                updated
                    .map(Tenant::from)
                    .ok_or_else(|| Error::not_found("Tenant", code))
            })
            .await
    }

    async fn upsert(&self, tenant: NewTenant) -> Result<Tenant> {
        self.writer
            .exec(move |conn| -> Result<Tenant> {
                let row: TenantDB = tenant.into();
                let stored = diesel::insert_into(tenants::table)
                    .values(&row)
                    .on_conflict(tenants::code)
                    .do_update()
                    .set((
                        tenants::name.eq(&row.name),
                        tenants::base_url.eq(&row.base_url),
                        tenants::is_active.eq(row.is_active),
                        tenants::logo_url.eq(&row.logo_url),
                        tenants::updated_at.eq(row.updated_at),
                    ))
                    .returning(TenantDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(stored.into())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_directory;
    use tempfile::tempdir;

    fn new_tenant(code: &str) -> NewTenant {
        NewTenant {
            code: code.to_string(),
            name: format!("Division {}", code),
            base_url: None,
            is_active: true,
            logo_url: None,
        }
    }

    #[tokio::test]
    async fn create_find_and_deactivate() {
        let dir = tempdir().unwrap();
        let repo = TenantRepository::new(open_directory(dir.path()).unwrap());

        repo.create(new_tenant("ncr")).await.unwrap();
        let found = repo.find_by_code("ncr").unwrap().unwrap();
        assert_eq!(found.name, "Division ncr");
        assert!(repo.find_by_code("NCR").unwrap().is_none());

        let updated = repo
            .update(
                "ncr",
                TenantUpdate {
                    name: "NCR".to_string(),
                    base_url: Some("https://ncr.example.org".to_string()),
                    is_active: false,
                    logo_url: None,
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_active);
        assert!(repo.list(Some(true)).unwrap().is_empty());
        assert_eq!(repo.list(None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_codes_are_unique_violations() {
        let dir = tempdir().unwrap();
        let repo = TenantRepository::new(open_directory(dir.path()).unwrap());

        repo.create(new_tenant("ncr")).await.unwrap();
        let err = repo.create(new_tenant("ncr")).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn update_of_unknown_tenant_is_not_found() {
        let dir = tempdir().unwrap();
        let repo = TenantRepository::new(open_directory(dir.path()).unwrap());
        let err = repo
            .update(
                "ghost",
                TenantUpdate {
                    name: "Ghost".to_string(),
                    base_url: None,
                    is_active: true,
                    logo_url: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn upsert_refreshes_existing_rows() {
        let dir = tempdir().unwrap();
        let repo = TenantRepository::new(open_directory(dir.path()).unwrap());

        repo.upsert(new_tenant("car")).await.unwrap();
        let mut renamed = new_tenant("car");
        renamed.name = "Cordillera".to_string();
        repo.upsert(renamed).await.unwrap();

        let all = repo.list(None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Cordillera");
    }
}
