//! Connection pools, migrations and per-partition database handles.

use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use diesel::connection::{Connection, SimpleConnection};
use diesel::r2d2::{self, ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use snds_core::errors::{DatabaseError, Error, Result};
use snds_core::PartitionHandle;

use crate::errors::{IntoCore, StorageError};

pub mod write_actor;
pub use write_actor::{spawn_writer, WriteHandle};

/// Migrations of the tenant directory database.
pub const DIRECTORY_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/directory");

/// Migrations applied to every tenant partition database.
pub const PARTITION_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/partition");

/// File name of the tenant directory database inside the data directory.
pub const DIRECTORY_DB_FILE: &str = "directory.db";

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Read pool and writer for one SQLite database file.
#[derive(Clone)]
pub struct Database {
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
}

/// Makes sure the database file's directory exists and switches the file to
/// WAL mode. Returns the path to hand to `create_pool`.
pub fn init(db_path: &Path) -> Result<String> {
    if let Some(db_dir) = db_path.parent() {
        if !db_dir.as_os_str().is_empty() && !db_dir.exists() {
            fs::create_dir_all(db_dir)?;
        }
    }
    let db_path = db_path.to_string_lossy().to_string();

    let mut conn = SqliteConnection::establish(&db_path)
        .map_err(|e| Error::from(StorageError::from(e)))?;
    conn.batch_execute(
        "
            PRAGMA journal_mode = WAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 30000;
            PRAGMA synchronous  = NORMAL;
        ",
    )
    .into_core()?;

    Ok(db_path)
}

pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = r2d2::Pool::builder()
        .max_size(8)
        .min_idle(Some(1))
        .connection_timeout(std::time::Duration::from_secs(30))
        .connection_customizer(Box::new(ConnectionCustomizer {}))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::PoolCreationFailed(e.to_string())))?;
    Ok(Arc::new(pool))
}

pub fn run_migrations(pool: &DbPool, migrations: EmbeddedMigrations) -> Result<()> {
    let mut connection = get_connection(pool)?;

    let applied = connection.run_pending_migrations(migrations).map_err(|e| {
        error!("Database migration failed: {}", e);
        Error::from(StorageError::MigrationFailed(e.to_string()))
    })?;

    for migration_version in &applied {
        info!("Applied migration {}", migration_version);
    }

    Ok(())
}

/// Gets a connection from the pool.
pub fn get_connection(pool: &Pool<ConnectionManager<SqliteConnection>>) -> Result<DbConnection> {
    pool.get().into_core()
}

/// Initializes, migrates and starts the writer for one database file.
///
/// Spawns a Tokio task, so it must run inside a runtime.
pub fn open(db_path: &Path, migrations: EmbeddedMigrations) -> Result<Database> {
    if tokio::runtime::Handle::try_current().is_err() {
        return Err(StorageError::PartitionUnavailable(format!(
            "cannot open {} outside a Tokio runtime",
            db_path.display()
        ))
        .into());
    }

    let db_path = init(db_path)?;
    let pool = create_pool(&db_path)?;
    run_migrations(&pool, migrations)?;
    let writer = spawn_writer((*pool).clone(), db_path);
    Ok(Database { pool, writer })
}

/// Opens the tenant directory database in `data_dir`.
pub fn open_directory(data_dir: &Path) -> Result<Database> {
    info!("Opening tenant directory in {}", data_dir.display());
    open(&data_dir.join(DIRECTORY_DB_FILE), DIRECTORY_MIGRATIONS)
}

/// Lazily opened databases, one per tenant partition.
///
/// The physical database of a partition is `<data_dir>/<partition_id>.db`.
/// It is created and migrated the first time a handle for it is used; the
/// resolver never provisions anything.
pub struct PartitionPools {
    data_dir: PathBuf,
    databases: DashMap<String, Database>,
}

impl PartitionPools {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            databases: DashMap::new(),
        }
    }

    pub fn db_path(&self, partition: &PartitionHandle) -> PathBuf {
        self.data_dir
            .join(format!("{}.db", partition.partition_id()))
    }

    /// Pool and writer of the partition, opening it on first use.
    pub fn get(&self, partition: &PartitionHandle) -> Result<Database> {
        if let Some(db) = self.databases.get(partition.partition_id()) {
            return Ok(db.clone());
        }

        // The entry lock keeps two requests from migrating the same file.
        let entry = self
            .databases
            .entry(partition.partition_id().to_string())
            .or_try_insert_with(|| {
                info!("Opening partition {}", partition.partition_id());
                open(&self.db_path(partition), PARTITION_MIGRATIONS)
            })?;
        Ok(entry.value().clone())
    }

    /// Number of partitions opened so far.
    pub fn open_count(&self) -> usize {
        self.databases.len()
    }
}

#[derive(Debug)]
struct ConnectionCustomizer;

impl r2d2::CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), r2d2::Error> {
        conn.batch_execute(
            "
                PRAGMA foreign_keys = ON;
                PRAGMA busy_timeout = 30000;
                PRAGMA synchronous = NORMAL;
            ",
        )
        .map_err(r2d2::Error::QueryError)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn partitions_open_lazily_in_their_own_files() {
        let dir = tempdir().unwrap();
        let pools = PartitionPools::new(dir.path());
        assert_eq!(pools.open_count(), 0);

        let ncr = PartitionHandle::for_tenant("ncr");
        pools.get(&ncr).unwrap();
        pools.get(&ncr).unwrap();
        pools.get(&PartitionHandle::for_tenant("car")).unwrap();

        assert_eq!(pools.open_count(), 2);
        assert!(dir.path().join("snds_ncr.db").exists());
        assert!(dir.path().join("snds_car.db").exists());
    }

    #[test]
    fn unusable_data_directory_is_an_io_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();

        let err = init(&blocker.join("nested").join("directory.db")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn opening_outside_a_runtime_fails_cleanly() {
        let dir = tempdir().unwrap();
        let pools = PartitionPools::new(dir.path());
        assert!(pools.get(&PartitionHandle::for_tenant("ncr")).is_err());
        assert_eq!(pools.open_count(), 0);
    }
}
