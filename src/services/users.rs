use sqlx::{Pool, Sqlite};

use crate::database::models::{NewUser, UpdateUser, User};
use crate::error::ServiceError;

const USER_COLUMNS: &str = "id, name, email, password_hash, preferred_currency, created_at";

#[derive(Clone)]
pub struct UserService {
    pool: Pool<Sqlite>,
}

impl UserService {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewUser) -> Result<User, ServiceError> {
        if new.name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }
        if new.email.trim().is_empty() {
            return Err(ServiceError::Validation("email must not be empty".into()));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, preferred_currency, created_at)
            VALUES (?, ?, ?, ?, datetime('now'))
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.preferred_currency)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, ServiceError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User, ServiceError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("user"))
    }

    pub async fn update(&self, id: i64, update: UpdateUser) -> Result<User, ServiceError> {
        if update.email.trim().is_empty() {
            return Err(ServiceError::Validation("email must not be empty".into()));
        }

        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = ?, email = ?, preferred_currency = ?
            WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.preferred_currency)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::NotFound("user"))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("user"));
        }
        Ok(())
    }
}
