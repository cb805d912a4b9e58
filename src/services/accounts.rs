use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use crate::database::models::{Account, NewAccount, UpdateAccount};
use crate::error::ServiceError;

use super::integrity;

const ACCOUNT_COLUMNS: &str = "id, user_id, name, balance, currency, kind, created_at";

#[derive(Clone)]
pub struct AccountService {
    pool: Pool<Sqlite>,
}

impl AccountService {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewAccount) -> Result<Account, ServiceError> {
        if new.name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }
        if new.currency.trim().is_empty() {
            return Err(ServiceError::Validation("currency must not be empty".into()));
        }

        let mut tx = self.pool.begin().await?;
        integrity::ensure_user_exists(&mut tx, new.user_id).await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO accounts (user_id, name, balance, currency, kind, created_at)
            VALUES (?, ?, ?, ?, ?, datetime('now'))
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(&new.name)
        .bind(new.balance.to_string())
        .bind(&new.currency)
        .bind(&new.kind)
        .fetch_one(&mut *tx)
        .await?;
        let account = account_from_row(&row)?;
        tx.commit().await?;

        Ok(account)
    }

    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Account>, ServiceError> {
        let rows = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = ? ORDER BY id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok(account_from_row(row)?))
            .collect()
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Account, ServiceError> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(account_from_row(&row)?),
            None => Err(ServiceError::NotFound("account")),
        }
    }

    pub async fn update(&self, id: i64, update: UpdateAccount) -> Result<Account, ServiceError> {
        if update.name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE accounts
            SET name = ?, balance = ?, currency = ?, kind = ?
            WHERE id = ?
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&update.name)
        .bind(update.balance.to_string())
        .bind(&update.currency)
        .bind(&update.kind)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(account_from_row(&row)?),
            None => Err(ServiceError::NotFound("account")),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("account"));
        }
        Ok(())
    }
}

fn account_from_row(row: &SqliteRow) -> Result<Account, sqlx::Error> {
    let balance_text: String = row.try_get("balance")?;
    let balance = Decimal::from_str(&balance_text)
        .map_err(|e| sqlx::Error::Decode(format!("invalid decimal balance: {e}").into()))?;

    Ok(Account {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        balance,
        currency: row.try_get("currency")?,
        kind: row.try_get("kind")?,
        created_at: row.try_get("created_at")?,
    })
}
