//! services/web/src/web/router.rs
//!
//! Builds the request dispatcher: routes, the session middleware every request
//! passes through, the login guard on protected pages, and static media.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{any, get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::web::auth::{login_page, login_submit, logout, register};
use crate::web::home::home;
use crate::web::middleware::require_login;
use crate::web::session::attach_session;
use crate::web::state::AppState;

/// Mount point for files under `Config::media_root`.
pub const MEDIA_PATH: &str = "/media";

/// Create the main application router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no login required)
    let public_routes = Router::new()
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", any(logout))
        .route("/register", post(register));

    // Protected routes (login required)
    let protected_routes = Router::new()
        .route("/", get(home))
        .route_layer(middleware::from_fn(require_login));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service(MEDIA_PATH, ServeDir::new(&app_state.config.media_root))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            attach_session,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
