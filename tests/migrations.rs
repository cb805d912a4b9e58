use std::fs;
use std::path::Path;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use finance_service::database::db::migrate::{applied_migrations, run_migrations};
use finance_service::error::MigrationError;

async fn memory_pool() -> Pool<Sqlite> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool")
}

async fn create_ledger(pool: &Pool<Sqlite>) {
    sqlx::query(
        "CREATE TABLE migrations (
            migration_name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(pool)
    .await
    .expect("create ledger");
}

#[tokio::test]
async fn applies_scripts_in_lexicographic_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    // Written out of filesystem order on purpose; only the name matters.
    fs::write(
        dir.path().join("020_seed.sql"),
        "INSERT INTO things (label) VALUES ('seeded');",
    )
    .expect("write 020");
    fs::write(
        dir.path().join("010_init.sql"),
        "CREATE TABLE things (id INTEGER PRIMARY KEY, label TEXT NOT NULL);",
    )
    .expect("write 010");

    let pool = memory_pool().await;
    create_ledger(&pool).await;

    let applied = run_migrations(&pool, dir.path()).await.expect("first run");
    assert_eq!(applied, vec!["010_init.sql", "020_seed.sql"]);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM things")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(rows, 1);

    let ledger = applied_migrations(&pool).await.expect("ledger");
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].name, "010_init.sql");
    assert_eq!(ledger[1].name, "020_seed.sql");
}

#[tokio::test]
async fn second_run_applies_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("010_init.sql"),
        "CREATE TABLE things (id INTEGER PRIMARY KEY);",
    )
    .expect("write 010");

    let pool = memory_pool().await;
    create_ledger(&pool).await;

    let first = run_migrations(&pool, dir.path()).await.expect("first run");
    assert_eq!(first.len(), 1);

    let second = run_migrations(&pool, dir.path()).await.expect("second run");
    assert!(second.is_empty());
}

#[tokio::test]
async fn missing_ledger_table_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("010_init.sql"),
        "CREATE TABLE things (id INTEGER PRIMARY KEY);",
    )
    .expect("write 010");

    let pool = memory_pool().await;

    let err = run_migrations(&pool, dir.path())
        .await
        .expect_err("runner must refuse to run without a ledger");
    assert!(matches!(err, MigrationError::LedgerMissing));
}

#[tokio::test]
async fn empty_directory_is_a_noop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = memory_pool().await;
    create_ledger(&pool).await;

    let applied = run_migrations(&pool, dir.path()).await.expect("run");
    assert!(applied.is_empty());
}

#[tokio::test]
async fn unreadable_directory_is_fatal() {
    let pool = memory_pool().await;
    create_ledger(&pool).await;

    let err = run_migrations(&pool, Path::new("/no/such/directory"))
        .await
        .expect_err("missing directory must fail");
    assert!(matches!(err, MigrationError::DirectoryUnreadable { .. }));
}

#[tokio::test]
async fn failed_script_is_never_recorded_and_is_retried() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("010_init.sql"),
        "CREATE TABLE things (id INTEGER PRIMARY KEY);",
    )
    .expect("write 010");
    fs::write(dir.path().join("020_broken.sql"), "THIS IS NOT SQL;").expect("write 020");

    let pool = memory_pool().await;
    create_ledger(&pool).await;

    let err = run_migrations(&pool, dir.path())
        .await
        .expect_err("broken script must abort the run");
    match err {
        MigrationError::ScriptExecution { name, .. } => assert_eq!(name, "020_broken.sql"),
        other => panic!("unexpected error: {other}"),
    }

    // 010 stays applied, 020 was never recorded.
    let ledger = applied_migrations(&pool).await.expect("ledger");
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].name, "010_init.sql");

    // Fixing the script makes the next run pick it up again.
    fs::write(
        dir.path().join("020_broken.sql"),
        "INSERT INTO things (id) VALUES (1);",
    )
    .expect("rewrite 020");
    let applied = run_migrations(&pool, dir.path()).await.expect("retry run");
    assert_eq!(applied, vec!["020_broken.sql"]);
}

#[tokio::test]
async fn ledger_not_schema_decides_what_is_applied() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("010_init.sql"),
        "CREATE TABLE things (id INTEGER PRIMARY KEY);",
    )
    .expect("write 010");
    fs::write(
        dir.path().join("020_seed.sql"),
        "INSERT INTO things (id) VALUES (1);",
    )
    .expect("write 020");

    let pool = memory_pool().await;
    create_ledger(&pool).await;
    run_migrations(&pool, dir.path()).await.expect("first run");

    // Dropping the ledger row makes the runner re-attempt the script even
    // though its effect is still in place, so it fails on the existing table.
    sqlx::query("DELETE FROM migrations WHERE migration_name = '010_init.sql'")
        .execute(&pool)
        .await
        .expect("delete ledger row");

    let err = run_migrations(&pool, dir.path())
        .await
        .expect_err("re-running an already-effective script must fail");
    match err {
        MigrationError::ScriptExecution { name, .. } => assert_eq!(name, "010_init.sql"),
        other => panic!("unexpected error: {other}"),
    }
}
