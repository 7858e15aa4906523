//! crates/parlor_core/src/ports.rs
//!
//! Defines the service contracts (traits) the front controller depends on.
//! These traits form the boundary of the hexagonal architecture: the web layer
//! only sees these contracts, and the chat transport consumes the same
//! `SessionStore` contract without sharing any implementation.

use async_trait::async_trait;

use crate::domain::{NewUser, SessionData, SessionId, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Credential hashing failed: {0}")]
    Hashing(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistent user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup. When several records share a username the first
    /// one the store holds is returned.
    async fn find_by_username(&self, username: &str) -> PortResult<Option<User>>;

    /// Inserts a user. No uniqueness check is made on `username`.
    async fn create(&self, new_user: NewUser) -> PortResult<User>;
}

/// Server-side session state keyed by the cookie-carried session id.
///
/// Each call is atomic for its key; callers never hold locks across calls,
/// so concurrent writers to one id are last-write-wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns `None` for unknown or expired ids.
    async fn get(&self, session_id: &SessionId) -> PortResult<Option<SessionData>>;

    async fn set(&self, session_id: &SessionId, data: SessionData) -> PortResult<()>;

    /// Removes the session. Destroying an unknown id is not an error.
    async fn destroy(&self, session_id: &SessionId) -> PortResult<()>;
}

/// One-way credential transform and its matching check.
pub trait CredentialHasher: Send + Sync {
    /// Produces a self-describing hash of `password`.
    fn generate(&self, password: &str) -> PortResult<String>;

    /// Checks `password` against a hash produced by `generate`. Never
    /// recovers the plaintext; an unparseable hash simply fails to verify.
    fn verify(&self, password: &str, password_hash: &str) -> bool;
}
