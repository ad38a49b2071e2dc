//! Example consumer: a separate Rust project that uses tenant-crud as a dependency.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Without DATABASE_URL the in-memory store is used.

mod resources;

use std::sync::Arc;
use tenant_crud::{
    api_router, ensure_database_exists, ensure_tables, load_descriptors, resolve, AppConfig, AppState,
    HeaderIdentityProvider, IdentityProvider, MemoryStore, PgStore, RecordStore,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.env_filter_directive())),
        )
        .init();

    let descriptors = match &config.resources_path {
        Some(path) => load_descriptors(path)?,
        None => resources::builtin(),
    };
    let registry = resolve(descriptors)?;

    let store: Arc<dyn RecordStore> = match &config.database_url {
        Some(url) => {
            ensure_database_exists(url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await?;
            ensure_tables(&pool, &registry).await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let port = config.port;
    let environment = config.environment;
    let state = AppState::new(store, registry, config);
    let identity: Arc<dyn IdentityProvider> = Arc::new(HeaderIdentityProvider);
    let app = api_router(state.clone(), identity);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(
        env = environment.as_str(),
        resources = state.registry.len(),
        "listening on http://{}{}",
        listener.local_addr()?,
        state.config.base_path
    );
    axum::serve(listener, app).await?;
    Ok(())
}
