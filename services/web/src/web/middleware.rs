//! services/web/src/web/middleware.rs
//!
//! Route guard for pages that need a logged-in user.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};

use crate::web::session::Session;

pub const LOGIN_PATH: &str = "/login";

/// The login URL that brings the user back to `path` afterwards.
pub fn login_redirect_for(path: &str) -> String {
    format!("{}?next={}", LOGIN_PATH, path)
}

/// Middleware that lets requests with an authenticated session through.
///
/// Anonymous requests are redirected to the login page with `next` set to the
/// path they asked for.
pub async fn require_login(
    Extension(session): Extension<Session>,
    req: Request,
    next: Next,
) -> Response {
    if session.is_authenticated().await {
        return next.run(req).await;
    }
    Redirect::to(&login_redirect_for(req.uri().path())).into_response()
}
