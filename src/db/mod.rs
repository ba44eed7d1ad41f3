//! This module is responsible for opening, creating and migrating the SQLite budget file, and for
//! the category and expense stores that read and write it.

mod categories;
mod expenses;
pub(crate) mod migrations;

pub use categories::Categories;
pub use expenses::Expenses;

use crate::{utils, Result};
use anyhow::{bail, Context};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const MAX_CONNECTIONS: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A handle to one open budget database.
///
/// Cloning is cheap and every clone shares the same pool and the same write lock. Reads run
/// concurrently; every mutation takes the write lock for the whole of its check-then-write so
/// that id assignment and existence checks never interleave.
#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
    path: PathBuf,
}

impl Db {
    /// Opens the budget at `path`.
    ///
    /// - If `create_new` is false and a file exists at `path`, it is opened and its schema is
    ///   brought up to date.
    /// - Otherwise a fresh database is created at `path`, replacing any file already there.
    pub async fn open(path: impl AsRef<Path>, create_new: bool) -> Result<Self> {
        let path = path.as_ref();
        if !create_new && path.is_file() {
            Self::load(path).await
        } else {
            Self::init(path).await
        }
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Creates a SQLite client
    /// - Updates the database schema with migrations if it is out-of-date
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The budget database is missing '{}'", path.display());
        }
        let db = Self::connect(path, false).await?;

        let version = migrations::current_version(&db.pool).await?;
        if version > migrations::CURRENT_VERSION {
            bail!(
                "The budget database schema version {version} is newer than this program \
                 supports ({})",
                migrations::CURRENT_VERSION
            );
        }
        migrations::run(&db.pool, version, migrations::CURRENT_VERSION).await?;
        debug!("Loaded budget database {}", path.display());
        Ok(db)
    }

    /// - Removes any file currently at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema, including the category type codes
    ///
    /// Default categories are not seeded here; see `Categories::set_to_defaults`.
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!("Replacing existing budget database {}", path.display());
            utils::remove_file(path).await?;
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            utils::make_dir(parent).await?;
        }
        let db = Self::connect(path, true).await?;
        migrations::bootstrap(&db.pool).await?;
        migrations::run(&db.pool, 0, migrations::CURRENT_VERSION).await?;
        debug!("Created budget database {}", path.display());
        Ok(db)
    }

    async fn connect(path: &Path, create: bool) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open SQLite database {}", path.display()))?;

        Ok(Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
            path: path.to_path_buf(),
        })
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Serializes mutations against this database.
    pub(crate) async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes every pooled connection. Further use of any clone of this handle fails.
    pub async fn close(&self) {
        self.pool.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_then_reopens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("budget.sqlite");

        let db = Db::open(&path, false).await.unwrap();
        assert!(path.is_file());
        sqlx::query("INSERT INTO categories (description, typeId) VALUES ('Rent', 2)")
            .execute(db.pool())
            .await
            .unwrap();
        db.close().await;

        let db = Db::open(&path, false).await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(row.0, 1);
    }

    #[tokio::test]
    async fn test_open_create_new_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("budget.sqlite");

        let db = Db::open(&path, true).await.unwrap();
        sqlx::query("INSERT INTO categories (description, typeId) VALUES ('Rent', 2)")
            .execute(db.pool())
            .await
            .unwrap();
        db.close().await;

        let db = Db::open(&path, true).await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(row.0, 0);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = Db::load(dir.path().join("nope.sqlite")).await;
        assert!(result.unwrap_err().to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let dir = TempDir::new().unwrap();
        let db = Db::open(dir.path().join("b.sqlite"), true).await.unwrap();
        let result = sqlx::query(
            "INSERT INTO expenses (date, description, amount, categoryId) \
             VALUES ('2020-01-01 00:00:00', 'x', 1.0, 999)",
        )
        .execute(db.pool())
        .await;
        assert!(result.is_err());
    }
}
