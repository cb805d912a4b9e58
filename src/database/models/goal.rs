use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialGoal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub saved_amount: Decimal,
    pub deadline: NaiveDate,
    pub priority: i64,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFinancialGoal {
    pub user_id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub saved_amount: Decimal,
    pub deadline: NaiveDate,
    pub priority: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFinancialGoal {
    pub name: String,
    pub target_amount: Decimal,
    pub saved_amount: Decimal,
    pub deadline: NaiveDate,
    pub priority: i64,
    pub description: Option<String>,
}

/// Per-goal completion percentage, computed in SQL.
#[derive(Debug, Clone, Serialize)]
pub struct GoalProgress {
    pub id: i64,
    pub name: String,
    pub target_amount: f64,
    pub saved_amount: f64,
    pub progress: f64,
}
