//! crates/parlor_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database, cookie or template format.

use std::fmt;

use uuid::Uuid;

/// A registered chat user.
///
/// `username` is the login identifier. Nothing at this layer guarantees it is
/// unique; lookups return the first match the store finds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
}

/// The insert payload for a user; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
}

impl NewUser {
    /// Builds a registration payload. The display name starts out as the first name.
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let first_name = first_name.into();
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            display_name: first_name.clone(),
            first_name,
            last_name: last_name.into(),
        }
    }

    pub fn into_user(self, id: Uuid) -> User {
        User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            display_name: self.display_name,
        }
    }
}

/// Opaque identifier of a browser session, carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh, unguessable session id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side state of one browser session.
///
/// `user` is a snapshot of the record taken at login time, not a live link to
/// the user store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub user: Option<User>,
}

impl SessionData {
    pub fn authenticated(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}
