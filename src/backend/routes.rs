use axum::routing::{get, post, put};
use axum::Router;

use super::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/users/{id}/accounts", get(handlers::list_user_accounts))
        .route(
            "/users/{id}/transactions",
            get(handlers::list_user_transactions),
        )
        .route(
            "/users/{id}/transactions/compare",
            get(handlers::compare_income_and_expenses),
        )
        .route("/users/{id}/goals", get(handlers::list_user_goals))
        .route("/users/{id}/goals/progress", get(handlers::goal_progress))
        .route("/users/{id}/reports", get(handlers::list_user_reports))
        .route("/users/{id}/reports/summary", get(handlers::summary_report))
        .route(
            "/users/{id}/reports/by-category",
            get(handlers::expenses_by_category),
        )
        .route("/accounts", post(handlers::create_account))
        .route(
            "/accounts/{id}",
            get(handlers::get_account)
                .put(handlers::update_account)
                .delete(handlers::delete_account),
        )
        .route(
            "/accounts/{id}/transactions",
            get(handlers::list_account_transactions),
        )
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/{id}",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route(
            "/categories/{id}/transactions",
            get(handlers::list_category_transactions),
        )
        .route("/transactions", post(handlers::create_transaction))
        .route(
            "/transactions/{id}",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        .route("/goals", post(handlers::create_goal))
        .route(
            "/goals/{id}",
            put(handlers::update_goal).delete(handlers::delete_goal),
        )
}
