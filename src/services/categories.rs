use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use crate::database::models::{Category, CategoryKind, NewCategory, UpdateCategory};
use crate::error::ServiceError;

use super::integrity;

const CATEGORY_COLUMNS: &str = "id, user_id, name, kind, created_at";

#[derive(Clone)]
pub struct CategoryService {
    pool: Pool<Sqlite>,
}

impl CategoryService {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewCategory) -> Result<Category, ServiceError> {
        if new.name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }

        let mut tx = self.pool.begin().await?;
        integrity::ensure_user_exists(&mut tx, new.user_id).await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO categories (user_id, name, kind, created_at)
            VALUES (?, ?, ?, datetime('now'))
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(&new.name)
        .bind(new.kind.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let category = category_from_row(&row)?;
        tx.commit().await?;

        Ok(category)
    }

    pub async fn list(&self) -> Result<Vec<Category>, ServiceError> {
        let rows = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok(category_from_row(row)?))
            .collect()
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Category, ServiceError> {
        let row = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(category_from_row(&row)?),
            None => Err(ServiceError::NotFound("category")),
        }
    }

    pub async fn update(&self, id: i64, update: UpdateCategory) -> Result<Category, ServiceError> {
        if update.name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE categories
            SET name = ?, kind = ?
            WHERE id = ?
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(&update.name)
        .bind(update.kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(category_from_row(&row)?),
            None => Err(ServiceError::NotFound("category")),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("category"));
        }
        Ok(())
    }
}

fn category_from_row(row: &SqliteRow) -> Result<Category, sqlx::Error> {
    let kind_text: String = row.try_get("kind")?;
    let kind = CategoryKind::from_str(&kind_text).map_err(|e| sqlx::Error::Decode(e.into()))?;

    Ok(Category {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        kind,
        created_at: row.try_get("created_at")?,
    })
}
