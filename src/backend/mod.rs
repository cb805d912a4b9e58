//! HTTP plumbing: routes, handlers, and the mapping from service failures
//! to status codes. No business logic lives here.

mod handlers;
mod routes;

use axum::routing::get;
use axum::Router;
use sqlx::{Pool, Sqlite};

use crate::cache::CacheStore;
use crate::config::AppConfig;
use crate::services::{
    AccountService, CategoryService, GoalService, ReportService, TransactionService, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub accounts: AccountService,
    pub categories: CategoryService,
    pub transactions: TransactionService,
    pub goals: GoalService,
    pub reports: ReportService,
}

impl AppState {
    pub fn new(pool: Pool<Sqlite>, cache: CacheStore) -> Self {
        Self {
            users: UserService::new(pool.clone()),
            accounts: AccountService::new(pool.clone()),
            categories: CategoryService::new(pool.clone()),
            transactions: TransactionService::new(pool.clone(), cache),
            goals: GoalService::new(pool.clone()),
            reports: ReportService::new(pool),
        }
    }
}

pub async fn run_server(config: &AppConfig, state: AppState) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(routes::api_routes())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.address()).await?;
    tracing::info!(addr = %config.address(), "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
