//! services/web/src/web/home.rs
//!
//! The chat page, served to logged-in users only.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Extension,
};
use serde_json::json;

use crate::error::ServerError;
use crate::web::middleware::login_redirect_for;
use crate::web::session::Session;
use crate::web::state::AppState;

pub const CHAT_TEMPLATE: &str = "chat.html";
pub const HEADER_TEMPLATE: &str = "header.html";
pub const FOOTER_TEMPLATE: &str = "footer.html";
pub const JS_TEMPLATES: &str = "js-templates.html";

/// GET / - Render the chat page with the connection parameters the client needs
pub async fn home(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Response, ServerError> {
    // The guard already checked, but a concurrent logout can empty the session.
    let Some(user) = session.user().await else {
        return Ok(Redirect::to(&login_redirect_for("/")).into_response());
    };

    let js_templates = state.templates.get(JS_TEMPLATES).await?;
    let config = &state.config;
    let context = json!({
        "host": config.public_host,
        "port": config.port,
        "media_url": config.media_url,
        "sitename": config.site_name,
        "page_title": config.page_title,
        "js_templates": &*js_templates,
        "user": user.display_name,
    });

    let html = state
        .templates
        .render(
            CHAT_TEMPLATE,
            &context,
            &[("header", HEADER_TEMPLATE), ("footer", FOOTER_TEMPLATE)],
        )
        .await?;
    Ok(Html(html).into_response())
}
