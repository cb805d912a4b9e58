use tracing_subscriber::EnvFilter;

use finance_service::backend::{self, AppState};
use finance_service::cache::{CacheStore, MemoryCache};
use finance_service::config::AppConfig;
use finance_service::database::db::{connection, migrate};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let pool = connection::get_db_pool(&config).await?;

    // Migrations must finish before any service is reachable; any failure
    // here aborts startup.
    let applied = migrate::run_migrations(&pool, &config.migrations_dir).await?;
    if applied.is_empty() {
        tracing::info!("no new migrations were applied");
    } else {
        for name in &applied {
            tracing::info!(script = %name, "applied migration");
        }
    }

    let cache = CacheStore::new(MemoryCache::new(config.cache_capacity));
    let state = AppState::new(pool, cache);
    backend::run_server(&config, state).await
}
