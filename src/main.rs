//! Viewset server: loads config from env, connects the store (Postgres or in-memory), applies
//! migrations, seeds sample users and serves the common routes plus `/api/users`.

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use viewset_sdk::{
    app_router, apply_migrations, handlers, AppState, Entity, MemoryStore, PgStore, ServerConfig,
    Store,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("viewset_sdk=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let store: Arc<dyn Store> = if config.uses_memory_store() {
        tracing::info!("using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await?;
        tracing::info!("database connection pool created");
        apply_migrations(&pool, &[viewset_sdk::models::User::descriptor()]).await?;
        tracing::info!("database migrations applied");
        Arc::new(PgStore::new(pool))
    };

    if config.seed_sample_data {
        let users = handlers::user_viewset(store.clone())?;
        handlers::seed_sample_users(&users).await?;
    }

    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };
    let app = app_router(state)?
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    for route in [
        "GET    /health",
        "GET    /ready",
        "GET    /version",
        "GET    {api}/users/",
        "POST   {api}/users/",
        "GET    {api}/users/:id",
        "PUT    {api}/users/:id",
        "DELETE {api}/users/:id",
        "POST   {api}/users/:id/activate",
        "POST   {api}/users/:id/deactivate",
        "POST   {api}/users/:id/reset_password",
        "GET    {api}/users/stats",
    ] {
        tracing::info!("route {}", route.replace("{api}", config.api_prefix.trim_end_matches('/')));
    }

    let listener = TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
