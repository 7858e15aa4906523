//! services/web/src/bin/web.rs

use std::sync::Arc;
use std::time::Duration;

use parlor_core::ports::UserStore;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use web_lib::{
    adapters::{Argon2Hasher, InMemorySessionStore, InMemoryUserStore, PgUserStore},
    config::{Config, UserStoreKind},
    error::ServerError,
    web::{create_router, AppState},
};

/// How often lapsed sessions are purged from the in-memory store.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");
    if config.debug {
        info!("Debug mode: templates are re-read on every request");
    }

    // --- 2. Connect the User Store ---
    let users: Arc<dyn UserStore> = match config.user_store {
        UserStoreKind::Postgres => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&config.database_url)
                .await?;
            let store = PgUserStore::new(db_pool);
            info!("Running database migrations...");
            store.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(store)
        }
        UserStoreKind::Memory => {
            warn!("Using the in-memory user store; accounts are lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
    };

    // --- 3. Session Store & Expiry Sweeper ---
    let sessions = Arc::new(InMemorySessionStore::new(config.session_max_age));
    let sweeper_sessions = sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sweeper_sessions.sweep_expired().await;
            if removed > 0 {
                debug!("Swept {} expired sessions", removed);
            }
        }
    });

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        users,
        sessions,
        Arc::new(Argon2Hasher::new()),
    ));

    // --- 5. Create the Router & Start the Server ---
    let app = create_router(app_state);
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
