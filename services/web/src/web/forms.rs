//! services/web/src/web/forms.rs
//!
//! Form schemas for the login and registration pages and the binding step
//! that turns a raw submission into `Valid` data or a list of field errors.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// Where to go after authenticating when no usable `next` was given.
pub const DEFAULT_NEXT: &str = "/";

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegistrationForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[serde(default, alias = "firstName")]
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// A single rejected field, shaped for the `errors` list in page templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Result of binding a submission against its schema.
#[derive(Debug)]
pub enum FormOutcome<T> {
    Valid(T),
    Invalid(Vec<FieldError>),
}

/// Validates `submission`, collecting every failure sorted by field name.
pub fn bind<T: Validate>(submission: T) -> FormOutcome<T> {
    match submission.validate() {
        Ok(()) => FormOutcome::Valid(submission),
        Err(errors) => FormOutcome::Invalid(field_errors(&errors)),
    }
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| FieldError {
                field: field.clone(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

/// Picks the submitted `next`, falling back to the query string's.
pub fn pick_next(body: Option<String>, query: Option<String>) -> String {
    body.filter(|n| !n.is_empty())
        .or(query)
        .unwrap_or_default()
}

/// Restricts post-login redirects to paths on this site.
///
/// Paths with control characters fall back as well; browsers strip tabs and
/// newlines from URLs, so `/\t/host` would land on `//host`.
pub fn redirect_target(next: &str) -> &str {
    let local = next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\");
    if local && !next.chars().any(char::is_control) {
        next
    } else {
        DEFAULT_NEXT
    }
}
