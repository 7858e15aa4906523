//! services/web/src/adapters/db.rs
//!
//! This module contains the database adapter, the Postgres implementation of
//! the `UserStore` port from the `core` crate. It handles all interactions
//! with the database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parlor_core::domain::{NewUser, User};
use parlor_core::ports::{PortError, PortResult, UserStore};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `UserStore` port.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Creates a new `PgUserStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[allow(dead_code)]
#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    display_name: String,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            display_name: self.display_name,
        }
    }
}

fn port_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            PortError::Unavailable(e.to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash, first_name, last_name, display_name, created_at \
             FROM users WHERE username = $1 ORDER BY created_at ASC LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(port_error)?;

        Ok(record.map(UserRecord::to_domain))
    }

    async fn create(&self, new_user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, username, password_hash, first_name, last_name, display_name) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, username, password_hash, first_name, last_name, display_name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.display_name)
        .fetch_one(&self.pool)
        .await
        .map_err(port_error)?;

        Ok(record.to_domain())
    }
}
