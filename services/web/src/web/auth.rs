//! services/web/src/web/auth.rs
//!
//! Login, registration and logout handlers.
//!
//! Credential failures are not errors: an unknown username and a wrong
//! password both re-render the login page without saying which one it was.

use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use parlor_core::domain::NewUser;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::ServerError;
use crate::web::forms::{
    bind, pick_next, redirect_target, FieldError, FormOutcome, LoginForm, RegistrationForm,
};
use crate::web::middleware::LOGIN_PATH;
use crate::web::session::Session;
use crate::web::state::AppState;

pub const LOGIN_TEMPLATE: &str = "login.html";

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /login - Show the empty login form
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NextQuery>,
) -> Result<Html<String>, ServerError> {
    render_login_page(&state, &query.next.unwrap_or_default(), None).await
}

/// POST /login - Check credentials and authenticate the session
pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(query): Query<NextQuery>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, ServerError> {
    let mut submission = form.map(|Form(f)| f).unwrap_or_else(|rejection| {
        warn!("Unreadable login submission: {}", rejection);
        LoginForm::default()
    });
    let next = pick_next(submission.next.take(), query.next);

    // 1. Validate the submission
    let form = match bind(submission) {
        FormOutcome::Valid(form) => form,
        FormOutcome::Invalid(errors) => {
            return Ok(render_login_page(&state, &next, Some(errors.as_slice()))
                .await?
                .into_response());
        }
    };

    // 2. Look up the user and verify the password
    let user = state
        .users
        .find_by_username(&form.username)
        .await?
        .filter(|user| state.hasher.verify(&form.password, &user.password_hash));

    let Some(user) = user else {
        info!("Failed login for username '{}'", form.username);
        return Ok(render_login_page(&state, &next, None).await?.into_response());
    };

    // 3. Authenticate the session
    session.set_user(user).await?;
    info!("User '{}' logged in", form.username);

    Ok(Redirect::to(redirect_target(&next)).into_response())
}

/// POST /register - Create an account and log it in
///
/// No check is made for an existing account with the same username; a second
/// registration creates a second record.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(query): Query<NextQuery>,
    form: Result<Form<RegistrationForm>, FormRejection>,
) -> Result<Response, ServerError> {
    let mut submission = form.map(|Form(f)| f).unwrap_or_else(|rejection| {
        warn!("Unreadable registration submission: {}", rejection);
        RegistrationForm::default()
    });
    let next = pick_next(submission.next.take(), query.next);

    // 1. Validate the submission
    let form = match bind(submission) {
        FormOutcome::Valid(form) => form,
        FormOutcome::Invalid(errors) => {
            return Ok(render_login_page(&state, &next, Some(errors.as_slice()))
                .await?
                .into_response());
        }
    };

    // 2. Hash the password and create the user
    let password_hash = state.hasher.generate(&form.password)?;
    let user = state
        .users
        .create(NewUser::new(
            form.username,
            password_hash,
            form.first_name,
            form.last_name,
        ))
        .await?;
    info!("Registered user '{}' ({})", user.username, user.id);

    // 3. Authenticate the session as the new user
    session.set_user(user).await?;

    Ok(Redirect::to(redirect_target(&next)).into_response())
}

/// ANY /logout - Destroy the session
pub async fn logout(Extension(session): Extension<Session>) -> Result<Redirect, ServerError> {
    session.destroy().await?;
    Ok(Redirect::to(LOGIN_PATH))
}

//=========================================================================================
// Rendering
//=========================================================================================

async fn render_login_page(
    state: &AppState,
    next: &str,
    errors: Option<&[FieldError]>,
) -> Result<Html<String>, ServerError> {
    let context = json!({
        "sitename": state.config.site_name,
        "media_url": state.config.media_url,
        "next": next,
        "errors": errors,
    });
    let html = state.templates.render(LOGIN_TEMPLATE, &context, &[]).await?;
    Ok(Html(html))
}
