//! Existence checks used by the write paths. Run inside the same database
//! transaction as the insert or update they guard, so the reference cannot
//! disappear between the check and the write.

use sqlx::SqliteConnection;

use crate::error::ServiceError;

pub(crate) async fn ensure_user_exists(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<(), ServiceError> {
    ensure_exists(conn, "SELECT EXISTS (SELECT 1 FROM users WHERE id = ?)", id, "user").await
}

pub(crate) async fn ensure_account_exists(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<(), ServiceError> {
    ensure_exists(conn, "SELECT EXISTS (SELECT 1 FROM accounts WHERE id = ?)", id, "account").await
}

pub(crate) async fn ensure_category_exists(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<(), ServiceError> {
    ensure_exists(conn, "SELECT EXISTS (SELECT 1 FROM categories WHERE id = ?)", id, "category")
        .await
}

async fn ensure_exists(
    conn: &mut SqliteConnection,
    sql: &str,
    id: i64,
    entity: &'static str,
) -> Result<(), ServiceError> {
    let found: i64 = sqlx::query_scalar(sql).bind(id).fetch_one(&mut *conn).await?;
    if found == 0 {
        return Err(ServiceError::Reference(entity));
    }
    Ok(())
}
