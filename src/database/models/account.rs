use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub balance: Decimal,
    pub currency: String,
    /// cash/debit/credit/other, free-form.
    pub kind: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub user_id: i64,
    pub name: String,
    pub balance: Decimal,
    pub currency: String,
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAccount {
    pub name: String,
    pub balance: Decimal,
    pub currency: String,
    pub kind: String,
}
