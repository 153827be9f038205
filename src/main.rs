//! Blog API
//!
//! CRUD backend for users, their categories and the blogs filed under them.
//! Every mutation runs behind a chain of existence and uniqueness checks
//! against the entity repository.
//!
//! Postgres is used when a database is configured (`DATABASE_URL` or
//! `DB_HOST`/`DB_USER`/...); otherwise the server runs on an in-memory store.

mod config;
mod error;
mod ids;
mod models;
mod repository;
mod routes;
mod state;
mod store;
mod validation;

use crate::config::Settings;
use crate::repository::FailurePolicy;
use crate::routes::create_router;
use crate::state::AppState;
use crate::store::{InMemoryStore, PostgresStore, Store};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("Starting Blog API...");

    // Load configuration
    let settings = Settings::load()?;
    info!("Configuration loaded successfully");

    let store: Arc<dyn Store> = match &settings.database {
        Some(db_config) => {
            let store = PostgresStore::connect(db_config).await.map_err(|e| {
                error!("Failed to connect to database: {}", e);
                e
            })?;

            if db_config.init_schema {
                store.ensure_schema().await?;
                info!("Database schema initialized");
            }

            Arc::new(store)
        }
        None => {
            warn!("No database configured, using in-memory store (data is lost on shutdown)");
            Arc::new(InMemoryStore::new())
        }
    };

    let lookup_failures = if settings.escalate_lookup_failures {
        FailurePolicy::Escalate
    } else {
        FailurePolicy::TreatAsMissing
    };
    let state = Arc::new(AppState::new(store, lookup_failures));

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("Server listening on http://{}", addr);
    info!("API Endpoints:");
    info!("   GET    /health");
    info!("   GET    /api/users");
    info!("   POST   /api/users");
    info!("   PATCH  /api/users");
    info!("   DELETE /api/users?id=");
    info!("   GET    /api/categories?userId=");
    info!("   POST   /api/categories?userId=");
    info!("   PATCH  /api/categories/{{category}}?userId=");
    info!("   GET    /api/blogs?userId=&categoryId=");
    info!("   POST   /api/blogs?userId=&categoryId=");
    info!("   GET    /api/blogs/{{blog}}?userId=&categoryId=");
    info!("   PATCH  /api/blogs/{{blog}}?userId=");
    info!("   DELETE /api/blogs/{{blog}}?userId=");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,blog_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
