use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};

use crate::cache::{keys, CacheStore};
use crate::database::models::{
    IncomeExpenseSummary, NewTransaction, Transaction, TransactionKind,
};
use crate::error::ServiceError;

use super::integrity;

const TRANSACTION_COLUMNS: &str =
    "id, user_id, account_id, category_id, amount, kind, currency, description, created_at";

#[derive(Clone)]
pub struct TransactionService {
    pool: Pool<Sqlite>,
    cache: CacheStore,
}

impl TransactionService {
    pub fn new(pool: Pool<Sqlite>, cache: CacheStore) -> Self {
        Self { pool, cache }
    }

    /// Insert a transaction. The existence checks for the referenced user,
    /// account, and category run in the same database transaction as the
    /// insert, so a reference cannot vanish between check and write.
    pub async fn create(&self, new: NewTransaction) -> Result<Transaction, ServiceError> {
        validate(&new)?;

        let mut tx = self.pool.begin().await?;
        check_references(&mut tx, &new).await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO transactions
                (user_id, account_id, category_id, amount, kind, currency, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, datetime('now'))
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.account_id)
        .bind(new.category_id)
        .bind(new.amount.to_string())
        .bind(new.kind.as_str())
        .bind(&new.currency)
        .bind(&new.description)
        .fetch_one(&mut *tx)
        .await?;
        let created = transaction_from_row(&row)?;
        tx.commit().await?;

        self.invalidate_listings(&created).await;
        Ok(created)
    }

    /// Replace a transaction's fields, with the same reference checks as
    /// `create`. Listings for both the old and the new references are
    /// invalidated, since the row may have moved between accounts or
    /// categories.
    pub async fn update(&self, id: i64, new: NewTransaction) -> Result<Transaction, ServiceError> {
        validate(&new)?;

        let mut tx = self.pool.begin().await?;
        let before = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(before) = before else {
            return Err(ServiceError::NotFound("transaction"));
        };
        let before = transaction_from_row(&before)?;

        check_references(&mut tx, &new).await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE transactions
            SET user_id = ?, account_id = ?, category_id = ?,
                amount = ?, kind = ?, currency = ?, description = ?
            WHERE id = ?
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.account_id)
        .bind(new.category_id)
        .bind(new.amount.to_string())
        .bind(new.kind.as_str())
        .bind(&new.currency)
        .bind(&new.description)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        let updated = transaction_from_row(&row)?;
        tx.commit().await?;

        self.invalidate_listings(&before).await;
        self.invalidate_listings(&updated).await;
        Ok(updated)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Transaction, ServiceError> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(transaction_from_row(&row)?),
            None => Err(ServiceError::NotFound("transaction")),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let existing = self.get_by_id(id).await?;
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("transaction"));
        }
        self.invalidate_listings(&existing).await;
        Ok(())
    }

    /// Cache-eligible listing: served from the cache when fresh, loaded from
    /// the backing store on miss.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Transaction>, ServiceError> {
        self.cache
            .fetch(&keys::user_transactions(user_id), || {
                self.rows_by_user(user_id)
            })
            .await
    }

    pub async fn list_by_account(&self, account_id: i64) -> Result<Vec<Transaction>, ServiceError> {
        self.cache
            .fetch(&keys::account_transactions(account_id), || {
                self.rows_by_account(account_id)
            })
            .await
    }

    pub async fn list_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<Transaction>, ServiceError> {
        self.cache
            .fetch(&keys::category_transactions(category_id), || {
                self.rows_by_category(category_id)
            })
            .await
    }

    pub async fn compare_income_and_expenses(
        &self,
        user_id: i64,
    ) -> Result<IncomeExpenseSummary, ServiceError> {
        let rows = sqlx::query(
            r#"
            SELECT kind, CAST(COALESCE(SUM(amount), 0) AS REAL) AS total
            FROM transactions
            WHERE user_id = ?
            GROUP BY kind
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut summary = IncomeExpenseSummary {
            income: 0.0,
            expense: 0.0,
        };
        for row in rows {
            let kind: String = row.try_get("kind")?;
            let total: f64 = row.try_get("total")?;
            match kind.as_str() {
                "income" => summary.income = total,
                "expense" => summary.expense = total,
                _ => {}
            }
        }
        Ok(summary)
    }

    async fn rows_by_user(&self, user_id: i64) -> Result<Vec<Transaction>, ServiceError> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|row| Ok(transaction_from_row(row)?)).collect()
    }

    async fn rows_by_account(&self, account_id: i64) -> Result<Vec<Transaction>, ServiceError> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE account_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|row| Ok(transaction_from_row(row)?)).collect()
    }

    async fn rows_by_category(&self, category_id: i64) -> Result<Vec<Transaction>, ServiceError> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE category_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|row| Ok(transaction_from_row(row)?)).collect()
    }

    async fn invalidate_listings(&self, txn: &Transaction) {
        self.cache
            .invalidate(&[
                keys::user_transactions(txn.user_id),
                keys::account_transactions(txn.account_id),
                keys::category_transactions(txn.category_id),
            ])
            .await;
    }
}

fn validate(new: &NewTransaction) -> Result<(), ServiceError> {
    if new.amount <= Decimal::ZERO {
        return Err(ServiceError::Validation("amount must be positive".into()));
    }
    if new.currency.trim().is_empty() {
        return Err(ServiceError::Validation("currency must not be empty".into()));
    }
    Ok(())
}

async fn check_references(
    conn: &mut SqliteConnection,
    new: &NewTransaction,
) -> Result<(), ServiceError> {
    integrity::ensure_user_exists(conn, new.user_id).await?;
    integrity::ensure_account_exists(conn, new.account_id).await?;
    integrity::ensure_category_exists(conn, new.category_id).await?;
    Ok(())
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction, sqlx::Error> {
    let amount_text: String = row.try_get("amount")?;
    let amount = Decimal::from_str(&amount_text)
        .map_err(|e| sqlx::Error::Decode(format!("invalid decimal amount: {e}").into()))?;
    let kind_text: String = row.try_get("kind")?;
    let kind = TransactionKind::from_str(&kind_text).map_err(|e| sqlx::Error::Decode(e.into()))?;

    Ok(Transaction {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        account_id: row.try_get("account_id")?,
        category_id: row.try_get("category_id")?,
        amount,
        kind,
        currency: row.try_get("currency")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}
