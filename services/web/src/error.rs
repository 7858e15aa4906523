//! services/web/src/error.rs
//!
//! Defines the primary error type for the entire web service.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parlor_core::ports::PortError;
use tracing::error;

use crate::config::ConfigError;
use crate::templates::TemplateError;

/// The primary error type for the `web` service.
///
/// Everything that reaches a handler as a `ServerError` is a fault, not a user
/// mistake: validation and credential failures never take this path.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A template could not be loaded or parsed.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error from running the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
