use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::database::models::{
    NewAccount, NewCategory, NewFinancialGoal, NewTransaction, NewUser, UpdateAccount,
    UpdateCategory, UpdateFinancialGoal, UpdateUser,
};
use crate::error::ServiceError;

use super::AppState;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServiceError::Reference(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServiceError::Store(err) => {
                tracing::error!(%err, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[derive(Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

// Users

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.users.list().await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok((StatusCode::CREATED, Json(state.users.create(payload).await?)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.users.get_by_id(id).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUser>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.users.update(id, payload).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Accounts

pub async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<NewAccount>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok((
        StatusCode::CREATED,
        Json(state.accounts.create(payload).await?),
    ))
}

pub async fn list_user_accounts(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.accounts.list_by_user(user_id).await?))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.accounts.get_by_id(id).await?))
}

pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAccount>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.accounts.update(id, payload).await?))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.accounts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Categories

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.categories.list().await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<NewCategory>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok((
        StatusCode::CREATED,
        Json(state.categories.create(payload).await?),
    ))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.categories.get_by_id(id).await?))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCategory>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.categories.update(id, payload).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.categories.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Transactions

pub async fn create_transaction(
    State(state): State<AppState>,
    Json(payload): Json<NewTransaction>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok((
        StatusCode::CREATED,
        Json(state.transactions.create(payload).await?),
    ))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.transactions.get_by_id(id).await?))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<NewTransaction>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.transactions.update(id, payload).await?))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.transactions.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_user_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.transactions.list_by_user(user_id).await?))
}

pub async fn list_account_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.transactions.list_by_account(account_id).await?))
}

pub async fn list_category_transactions(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        state.transactions.list_by_category(category_id).await?,
    ))
}

pub async fn compare_income_and_expenses(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        state.transactions.compare_income_and_expenses(user_id).await?,
    ))
}

// Financial goals

pub async fn create_goal(
    State(state): State<AppState>,
    Json(payload): Json<NewFinancialGoal>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok((StatusCode::CREATED, Json(state.goals.create(payload).await?)))
}

pub async fn list_user_goals(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.goals.list_by_user(user_id).await?))
}

pub async fn update_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateFinancialGoal>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.goals.update(id, payload).await?))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    state.goals.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn goal_progress(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.goals.progress(user_id).await?))
}

// Reports

pub async fn list_user_reports(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.reports.list_by_user(user_id).await?))
}

pub async fn summary_report(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(state.reports.summary(user_id).await?))
}

pub async fn expenses_by_category(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(range): Query<DateRange>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(
        state
            .reports
            .expenses_by_category(user_id, range.start, range.end)
            .await?,
    ))
}
