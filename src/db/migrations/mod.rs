//! Database schema migrations.
//!
//! Migration files are stored in this directory with the naming convention:
//! - `migration_NN_up.sql` - Upgrades schema from version `NN-1` to version `NN`
//! - `migration_NN_down.sql` - Downgrades schema from version `NN` to version `NN-1`
//!
//! The current level is kept in the single-row `schema_version` table.

use anyhow::{bail, Context};
use sqlx::{Connection, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::Result;

/// The schema version this build of the program expects.
pub(crate) const CURRENT_VERSION: i32 = 2;

/// A database migration with up and down SQL.
struct Migration {
    /// The version this migration brings the database to (when going up).
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        up_sql: include_str!("migration_01_up.sql"),
        down_sql: include_str!("migration_01_down.sql"),
    },
    Migration {
        version: 2,
        up_sql: include_str!("migration_02_up.sql"),
        down_sql: include_str!("migration_02_down.sql"),
    },
];

/// Creates the `schema_version` table at version 0 in an empty database.
pub(crate) async fn bootstrap(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin bootstrap transaction")?;
    sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
        .execute(&mut *tx)
        .await
        .context("Failed to create schema_version table")?;
    sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
        .execute(&mut *tx)
        .await
        .context("Failed to insert initial schema version")?;
    tx.commit()
        .await
        .context("Failed to commit bootstrap transaction")
}

/// Returns the schema version of an existing database.
///
/// Budget files written before versioning was introduced have the three tables but no
/// `schema_version` table. Those are stamped as version 1, which has the same tables; migration
/// 2 then rebuilds them with the column constraints and AUTOINCREMENT ids of this program.
pub(crate) async fn current_version(pool: &SqlitePool) -> Result<i32> {
    if table_exists(pool, "schema_version").await? {
        let row: (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await
            .context("Failed to query schema version")?;
        return Ok(row.0.unwrap_or_default());
    }

    if table_exists(pool, "expenses").await? && table_exists(pool, "categories").await? {
        info!("Stamping an unversioned budget database as schema version 1");
        bootstrap(pool).await?;
        sqlx::query("UPDATE schema_version SET version = 1")
            .execute(pool)
            .await
            .context("Failed to stamp schema version")?;
        return Ok(1);
    }

    bail!("The file is not a budget database: no schema_version or expenses table found")
}

/// Returns true if a table named `name` exists.
pub(crate) async fn table_exists(pool: &SqlitePool, name: &str) -> Result<bool> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(name)
            .fetch_one(pool)
            .await
            .with_context(|| format!("Failed to check for table {name}"))?;
    Ok(row.0 > 0)
}

/// Runs migrations to bring the database from `current_ver` to `target_ver`.
///
/// - If `current_ver < target_ver`, runs "up" migrations sequentially.
/// - If `current_ver > target_ver`, runs "down" migrations sequentially.
/// - Each migration is executed within a transaction that includes the schema_version update.
///
/// Validates all required migrations exist before running any of them.
pub(crate) async fn run(pool: &SqlitePool, current_ver: i32, target_ver: i32) -> Result<()> {
    if current_ver == target_ver {
        debug!("Database already at target version {target_ver}, no migrations needed");
        return Ok(());
    }

    validate_migrations(current_ver, target_ver)?;

    if current_ver < target_ver {
        for version in (current_ver + 1)..=target_ver {
            let migration = find(version)?;
            debug!("Running migration {version:02} (up)");
            run_single_migration(pool, migration.up_sql, version).await?;
        }
    } else {
        for version in (target_ver + 1..=current_ver).rev() {
            let migration = find(version)?;
            debug!("Running migration {version:02} (down)");
            run_single_migration(pool, migration.down_sql, version - 1).await?;
        }
    }

    debug!("Migration complete, schema now at version {target_ver}");
    Ok(())
}

fn find(version: i32) -> Result<&'static Migration> {
    MIGRATIONS
        .iter()
        .find(|m| m.version == version)
        .with_context(|| format!("Migration {version} not found"))
}

/// Executes a single migration's SQL and updates schema_version, all within a transaction.
///
/// Foreign key enforcement is switched off on the connection for the duration so that tables can
/// be rebuilt, then restored to its previous setting.
async fn run_single_migration(pool: &SqlitePool, sql: &str, new_version: i32) -> Result<()> {
    let mut conn = pool
        .acquire()
        .await
        .context("Failed to acquire migration connection")?;
    let (foreign_keys,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
        .fetch_one(&mut *conn)
        .await
        .context("Failed to read foreign_keys setting")?;
    // The pragma is a no-op inside a transaction.
    sqlx::query("PRAGMA foreign_keys = OFF")
        .execute(&mut *conn)
        .await
        .context("Failed to disable foreign keys")?;

    let result = apply_migration(&mut conn, sql, new_version).await;

    sqlx::query(&format!("PRAGMA foreign_keys = {foreign_keys}"))
        .execute(&mut *conn)
        .await
        .context("Failed to restore foreign_keys setting")?;
    result
}

async fn apply_migration(conn: &mut SqliteConnection, sql: &str, new_version: i32) -> Result<()> {
    let mut tx = conn
        .begin()
        .await
        .context("Failed to begin migration transaction")?;

    sqlx::raw_sql(sql)
        .execute(&mut *tx)
        .await
        .context("Failed to execute migration SQL")?;

    sqlx::query("UPDATE schema_version SET version = ?")
        .bind(new_version)
        .execute(&mut *tx)
        .await
        .context("Failed to update schema_version")?;

    tx.commit()
        .await
        .context("Failed to commit migration transaction")?;

    Ok(())
}

/// Validates that migrations are available for all versions needed to go from
/// `current_version` to `target_version`.
fn validate_migrations(current_version: i32, target_version: i32) -> Result<()> {
    let (start, end) = if current_version < target_version {
        (current_version + 1, target_version)
    } else {
        (target_version + 1, current_version)
    };

    for version in start..=end {
        if !MIGRATIONS.iter().any(|m| m.version == version) {
            bail!(
                "Migration {version} is missing but required to migrate from version {current_version} to {target_version}"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Executor;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use tempfile::TempDir;

    async fn create_empty_db() -> Result<(TempDir, SqlitePool)> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        let options = SqliteConnectOptions::new()
            .filename(temp_dir.path().join("test.sqlite"))
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to create SQLite database")?;
        Ok((temp_dir, pool))
    }

    #[tokio::test]
    async fn test_migration_up_creates_and_seeds_tables() {
        let (_temp_dir, pool) = create_empty_db().await.unwrap();
        bootstrap(&pool).await.unwrap();
        assert_eq!(current_version(&pool).await.unwrap(), 0);

        run(&pool, 0, CURRENT_VERSION).await.unwrap();

        assert_eq!(current_version(&pool).await.unwrap(), CURRENT_VERSION);
        assert!(table_exists(&pool, "categoryTypes").await.unwrap());
        assert!(table_exists(&pool, "categories").await.unwrap());
        assert!(table_exists(&pool, "expenses").await.unwrap());

        let types: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, description FROM categoryTypes ORDER BY id")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(
            types,
            vec![
                (1, "Income".to_string()),
                (2, "Expense".to_string()),
                (3, "Credit".to_string()),
                (4, "Savings".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_migration_down_drops_tables() {
        let (_temp_dir, pool) = create_empty_db().await.unwrap();
        bootstrap(&pool).await.unwrap();
        run(&pool, 0, 1).await.unwrap();

        run(&pool, 1, 0).await.unwrap();

        assert_eq!(current_version(&pool).await.unwrap(), 0);
        assert!(!table_exists(&pool, "expenses").await.unwrap());
        assert!(!table_exists(&pool, "categories").await.unwrap());
        assert!(!table_exists(&pool, "categoryTypes").await.unwrap());
    }

    #[tokio::test]
    async fn test_migration_no_op_when_already_at_target() {
        let (_temp_dir, pool) = create_empty_db().await.unwrap();
        bootstrap(&pool).await.unwrap();
        run(&pool, 0, 1).await.unwrap();
        run(&pool, 1, 1).await.unwrap();
        assert_eq!(current_version(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unversioned_legacy_database_is_stamped() {
        let (_temp_dir, pool) = create_empty_db().await.unwrap();
        pool.execute(
            "CREATE TABLE categoryTypes(Id INTEGER PRIMARY KEY, Description TEXT);
             CREATE TABLE categories(Id INTEGER PRIMARY KEY, Description TEXT, TypeId INTEGER);
             CREATE TABLE expenses(Id INTEGER PRIMARY KEY, Date TEXT, Description TEXT,
                                   Amount REAL, CategoryId INTEGER);",
        )
        .await
        .unwrap();

        assert_eq!(current_version(&pool).await.unwrap(), 1);
        assert!(table_exists(&pool, "schema_version").await.unwrap());
        assert_eq!(current_version(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unversioned_tables_are_rebuilt_with_autoincrement() {
        let (_temp_dir, pool) = create_empty_db().await.unwrap();
        pool.execute(
            "CREATE TABLE categoryTypes(Id INTEGER PRIMARY KEY, Description TEXT);
             CREATE TABLE categories(Id INTEGER PRIMARY KEY, Description TEXT, TypeId INTEGER,
                                     FOREIGN KEY(TypeId) REFERENCES categoryTypes(Id));
             CREATE TABLE expenses(Id INTEGER PRIMARY KEY, Date TEXT, Description TEXT,
                                   Amount REAL, CategoryId INTEGER,
                                   FOREIGN KEY(CategoryId) REFERENCES categories(Id));
             INSERT INTO categoryTypes VALUES (1, 'Income'), (2, 'Expense');
             INSERT INTO categories VALUES (1, 'Food', 2), (2, NULL, 1);
             INSERT INTO expenses VALUES (1, '2018-01-10 00:00:00', 'bread', -4.5, 1);
             INSERT INTO expenses VALUES (7, '2018-01-12 00:00:00', NULL, 100, 2);",
        )
        .await
        .unwrap();

        let version = current_version(&pool).await.unwrap();
        run(&pool, version, CURRENT_VERSION).await.unwrap();

        assert_eq!(current_version(&pool).await.unwrap(), CURRENT_VERSION);
        for table in ["categories", "expenses"] {
            let (sql,): (String,) =
                sqlx::query_as("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?")
                    .bind(table)
                    .fetch_one(&pool)
                    .await
                    .unwrap();
            assert!(sql.contains("AUTOINCREMENT"), "{table}: {sql}");
        }
        let sequence: Vec<(String, i64)> =
            sqlx::query_as("SELECT name, seq FROM sqlite_sequence ORDER BY name")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(
            sequence,
            vec![("categories".to_string(), 2), ("expenses".to_string(), 7)]
        );
        let expenses: Vec<(i64, String, f64, i64)> = sqlx::query_as(
            "SELECT id, description, amount, categoryId FROM expenses ORDER BY id",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(
            expenses,
            vec![
                (1, "bread".to_string(), -4.5, 1),
                (7, String::new(), 100.0, 2)
            ]
        );
        assert!(table_exists(&pool, "expenses").await.unwrap());
        assert!(!table_exists(&pool, "expenses_new").await.unwrap());
    }

    #[tokio::test]
    async fn test_migration_restores_foreign_keys_setting() {
        let (_temp_dir, pool) = create_empty_db().await.unwrap();
        pool.execute("PRAGMA foreign_keys = ON").await.unwrap();
        bootstrap(&pool).await.unwrap();
        run(&pool, 0, CURRENT_VERSION).await.unwrap();

        let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_foreign_database_is_rejected() {
        let (_temp_dir, pool) = create_empty_db().await.unwrap();
        pool.execute("CREATE TABLE something_else (x INTEGER)")
            .await
            .unwrap();
        let err = current_version(&pool).await.unwrap_err();
        assert!(err.to_string().contains("not a budget database"));
    }

    #[test]
    fn test_validate_migrations_succeeds_for_valid_range() {
        assert!(validate_migrations(0, 2).is_ok());
        assert!(validate_migrations(2, 0).is_ok());
    }

    #[test]
    fn test_validate_migrations_fails_for_missing_migration() {
        assert!(validate_migrations(0, 3).is_err());
        assert!(validate_migrations(2, 4).is_err());
    }
}
