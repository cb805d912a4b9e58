use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use crate::database::models::{FinancialGoal, GoalProgress, NewFinancialGoal, UpdateFinancialGoal};
use crate::error::ServiceError;

use super::integrity;

const GOAL_COLUMNS: &str =
    "id, user_id, name, target_amount, saved_amount, deadline, priority, description, created_at";

#[derive(Clone)]
pub struct GoalService {
    pool: Pool<Sqlite>,
}

impl GoalService {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewFinancialGoal) -> Result<FinancialGoal, ServiceError> {
        if new.name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }
        if new.target_amount <= Decimal::ZERO {
            return Err(ServiceError::Validation(
                "target_amount must be positive".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        integrity::ensure_user_exists(&mut tx, new.user_id).await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO financial_goals
                (user_id, name, target_amount, saved_amount, deadline, priority, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, datetime('now'))
            RETURNING {GOAL_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(&new.name)
        .bind(new.target_amount.to_string())
        .bind(new.saved_amount.to_string())
        .bind(new.deadline)
        .bind(new.priority)
        .bind(&new.description)
        .fetch_one(&mut *tx)
        .await?;
        let goal = goal_from_row(&row)?;
        tx.commit().await?;

        Ok(goal)
    }

    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<FinancialGoal>, ServiceError> {
        let rows = sqlx::query(&format!(
            "SELECT {GOAL_COLUMNS} FROM financial_goals WHERE user_id = ? ORDER BY priority DESC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| Ok(goal_from_row(row)?)).collect()
    }

    pub async fn update(
        &self,
        id: i64,
        update: UpdateFinancialGoal,
    ) -> Result<FinancialGoal, ServiceError> {
        if update.target_amount <= Decimal::ZERO {
            return Err(ServiceError::Validation(
                "target_amount must be positive".into(),
            ));
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE financial_goals
            SET name = ?, target_amount = ?, saved_amount = ?,
                deadline = ?, priority = ?, description = ?
            WHERE id = ?
            RETURNING {GOAL_COLUMNS}
            "#
        ))
        .bind(&update.name)
        .bind(update.target_amount.to_string())
        .bind(update.saved_amount.to_string())
        .bind(update.deadline)
        .bind(update.priority)
        .bind(&update.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(goal_from_row(&row)?),
            None => Err(ServiceError::NotFound("goal")),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM financial_goals WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("goal"));
        }
        Ok(())
    }

    /// Completion percentage per goal, computed in SQL. `target_amount` is
    /// validated positive on every write, so the division is safe.
    pub async fn progress(&self, user_id: i64) -> Result<Vec<GoalProgress>, ServiceError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name,
                   CAST(target_amount AS REAL) AS target_amount,
                   CAST(saved_amount AS REAL) AS saved_amount,
                   CAST(saved_amount * 100.0 / target_amount AS REAL) AS progress
            FROM financial_goals
            WHERE user_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut progress = Vec::with_capacity(rows.len());
        for row in rows {
            progress.push(GoalProgress {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                target_amount: row.try_get("target_amount")?,
                saved_amount: row.try_get("saved_amount")?,
                progress: row.try_get("progress")?,
            });
        }
        Ok(progress)
    }
}

fn goal_from_row(row: &SqliteRow) -> Result<FinancialGoal, sqlx::Error> {
    let target_text: String = row.try_get("target_amount")?;
    let target_amount = Decimal::from_str(&target_text)
        .map_err(|e| sqlx::Error::Decode(format!("invalid decimal target_amount: {e}").into()))?;
    let saved_text: String = row.try_get("saved_amount")?;
    let saved_amount = Decimal::from_str(&saved_text)
        .map_err(|e| sqlx::Error::Decode(format!("invalid decimal saved_amount: {e}").into()))?;

    Ok(FinancialGoal {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        target_amount,
        saved_amount,
        deadline: row.try_get("deadline")?,
        priority: row.try_get("priority")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}
