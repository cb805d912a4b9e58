use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Report payloads are stored as JSON but decoded into a tagged variant per
/// report kind, so a malformed blob is rejected instead of passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum ReportContent {
    Summary {
        total_balance: f64,
        total_expenses_this_month: f64,
        completed_goals: i64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: i64,
    pub user_id: i64,
    pub report_name: String,
    pub generated_at: NaiveDateTime,
    pub content: ReportContent,
}

/// One row of the expenses-by-category aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryExpense {
    pub category: String,
    pub total: f64,
}
