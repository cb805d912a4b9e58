use chrono::NaiveDate;
use sqlx::{Pool, Row, Sqlite};

use crate::database::models::{CategoryExpense, Report, ReportContent};
use crate::error::ServiceError;

#[derive(Clone)]
pub struct ReportService {
    pool: Pool<Sqlite>,
}

impl ReportService {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Return the latest stored summary report for the user, or generate,
    /// persist, and return a fresh one when none exists. A stored blob that
    /// fails schema validation is rejected rather than passed through.
    pub async fn summary(&self, user_id: i64) -> Result<ReportContent, ServiceError> {
        let stored: Option<String> = sqlx::query_scalar(
            r#"
            SELECT content FROM reports
            WHERE user_id = ? AND report_name = 'summary'
            ORDER BY generated_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(raw) = stored {
            return serde_json::from_str(&raw).map_err(|e| {
                ServiceError::Validation(format!("stored summary report is malformed: {e}"))
            });
        }

        let report = self.generate_summary(user_id).await?;
        let raw = serde_json::to_string(&report)
            .map_err(|e| ServiceError::Validation(format!("failed to encode report: {e}")))?;
        sqlx::query(
            r#"
            INSERT INTO reports (user_id, report_name, generated_at, content)
            VALUES (?, 'summary', datetime('now'), ?)
            "#,
        )
        .bind(user_id)
        .bind(raw)
        .execute(&self.pool)
        .await?;

        Ok(report)
    }

    /// Three aggregates: overall account balance, current-month expenses,
    /// and goals already reached before their deadline.
    pub async fn generate_summary(&self, user_id: i64) -> Result<ReportContent, ServiceError> {
        let total_balance: f64 = sqlx::query_scalar(
            "SELECT CAST(COALESCE(SUM(balance), 0) AS REAL) FROM accounts WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let total_expenses_this_month: f64 = sqlx::query_scalar(
            r#"
            SELECT CAST(COALESCE(SUM(amount), 0) AS REAL)
            FROM transactions
            WHERE user_id = ? AND kind = 'expense'
              AND strftime('%Y-%m', created_at) = strftime('%Y-%m', 'now')
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let completed_goals: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM financial_goals
            WHERE user_id = ?
              AND CAST(saved_amount AS REAL) >= CAST(target_amount AS REAL)
              AND deadline >= date('now')
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ReportContent::Summary {
            total_balance,
            total_expenses_this_month,
            completed_goals,
        })
    }

    pub async fn expenses_by_category(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CategoryExpense>, ServiceError> {
        let rows = sqlx::query(
            r#"
            SELECT c.name AS category, CAST(COALESCE(SUM(t.amount), 0) AS REAL) AS total
            FROM transactions t
            JOIN categories c ON t.category_id = c.id
            WHERE t.user_id = ? AND t.kind = 'expense'
              AND date(t.created_at) BETWEEN ? AND ?
            GROUP BY c.name
            ORDER BY c.name ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut expenses = Vec::with_capacity(rows.len());
        for row in rows {
            expenses.push(CategoryExpense {
                category: row.try_get("category")?,
                total: row.try_get("total")?,
            });
        }
        Ok(expenses)
    }

    /// Every stored report for the user, newest first. Contents are decoded
    /// through the same tagged schema as `summary`.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Report>, ServiceError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, report_name, generated_at, content
            FROM reports
            WHERE user_id = ?
            ORDER BY generated_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut reports = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row.try_get("content")?;
            let content = serde_json::from_str(&raw).map_err(|e| {
                ServiceError::Validation(format!("stored report is malformed: {e}"))
            })?;
            reports.push(Report {
                id: row.try_get("id")?,
                user_id: row.try_get("user_id")?,
                report_name: row.try_get("report_name")?,
                generated_at: row.try_get("generated_at")?,
                content,
            });
        }
        Ok(reports)
    }
}
