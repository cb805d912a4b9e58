//! Forward-only schema migrations driven by a ledger table.
//!
//! The ledger (`migrations`) records the filename of every script that has
//! ever executed; it is the sole source of truth for "already applied". The
//! runner never creates the ledger itself — its existence is an external
//! precondition, bootstrapped outside this process with:
//!
//! ```sql
//! CREATE TABLE migrations (
//!     migration_name TEXT PRIMARY KEY,
//!     applied_at TEXT NOT NULL DEFAULT (datetime('now'))
//! );
//! ```
//!
//! Scripts are applied in lexicographic filename order, so callers must name
//! them with zero-padded numeric prefixes.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use sqlx::{Pool, Row, Sqlite};

use crate::error::MigrationError;

pub const LEDGER_TABLE: &str = "migrations";

/// One ledger row per executed script. Never updated or deleted by the
/// runner.
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub name: String,
    pub applied_at: NaiveDateTime,
}

/// Discover, check the ledger, and apply pending scripts. Returns the names
/// of the scripts actually executed this run; re-running against a fully
/// migrated store returns an empty list. Any error here is fatal to startup.
pub async fn run_migrations(
    pool: &Pool<Sqlite>,
    dir: &Path,
) -> Result<Vec<String>, MigrationError> {
    let scripts = discover_scripts(dir)?;
    if scripts.is_empty() {
        tracing::info!(dir = %dir.display(), "no migration scripts found");
        return Ok(Vec::new());
    }
    ensure_ledger_exists(pool).await?;
    apply_pending(pool, dir, &scripts).await
}

/// List `.sql` files in `dir`, sorted lexicographically by filename.
pub fn discover_scripts(dir: &Path) -> Result<Vec<String>, MigrationError> {
    let read_err = |source| MigrationError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut scripts = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if !entry.file_type().map_err(read_err)?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.ends_with(".sql") {
            scripts.push(name.to_string());
        }
    }
    scripts.sort();
    Ok(scripts)
}

/// Fail with `LedgerMissing` when the ledger table is absent.
pub async fn ensure_ledger_exists(pool: &Pool<Sqlite>) -> Result<(), MigrationError> {
    let exists: i64 =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)")
            .bind(LEDGER_TABLE)
            .fetch_one(pool)
            .await?;
    if exists == 0 {
        return Err(MigrationError::LedgerMissing);
    }
    Ok(())
}

/// Apply each script not yet recorded in the ledger, in the given order.
/// A script's statements and its ledger insert commit as one database
/// transaction, so a failed script is never recorded and is retried on the
/// next run. Earlier scripts of the same run stay applied.
pub async fn apply_pending(
    pool: &Pool<Sqlite>,
    dir: &Path,
    scripts: &[String],
) -> Result<Vec<String>, MigrationError> {
    let mut applied = Vec::new();

    for name in scripts {
        let recorded: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM migrations WHERE migration_name = ?")
                .bind(name)
                .fetch_one(pool)
                .await?;
        if recorded > 0 {
            tracing::debug!(script = %name, "migration already applied, skipping");
            continue;
        }

        let sql = fs::read_to_string(dir.join(name)).map_err(|source| {
            MigrationError::ScriptUnreadable {
                name: name.clone(),
                source,
            }
        })?;

        tracing::info!(script = %name, "applying migration");
        let mut tx = pool.begin().await?;
        sqlx::raw_sql(&sql)
            .execute(&mut *tx)
            .await
            .map_err(|source| MigrationError::ScriptExecution {
                name: name.clone(),
                source,
            })?;
        sqlx::query("INSERT INTO migrations (migration_name) VALUES (?)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        applied.push(name.clone());
    }

    Ok(applied)
}

/// Read back the ledger, ordered by script name.
pub async fn applied_migrations(
    pool: &Pool<Sqlite>,
) -> Result<Vec<MigrationRecord>, MigrationError> {
    let rows =
        sqlx::query("SELECT migration_name, applied_at FROM migrations ORDER BY migration_name")
            .fetch_all(pool)
            .await?;

    rows.iter()
        .map(|row| {
            Ok(MigrationRecord {
                name: row.try_get("migration_name")?,
                applied_at: row.try_get("applied_at")?,
            })
        })
        .collect()
}
