//! services/web/src/adapters/memory.rs
//!
//! Process-local implementations of the `UserStore` and `SessionStore` ports.
//! The session store is the default for the server; the user store backs
//! development runs and the tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parlor_core::domain::{NewUser, SessionData, SessionId, User};
use parlor_core::ports::{PortResult, SessionStore, UserStore};
use tokio::sync::RwLock;
use uuid::Uuid;

//=========================================================================================
// Users
//=========================================================================================

/// Users kept in insertion order, so lookups return the oldest match.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records carrying `username`, oldest first.
    pub async fn all_with_username(&self, username: &str) -> Vec<User> {
        self.users
            .read()
            .await
            .iter()
            .filter(|u| u.username == username)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> PortResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> PortResult<User> {
        let user = new_user.into_user(Uuid::new_v4());
        self.users.write().await.push(user.clone());
        Ok(user)
    }
}

//=========================================================================================
// Sessions
//=========================================================================================

struct StoredSession {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

/// Sessions with a rolling idle lifetime: every `set` pushes expiry out by
/// `max_age`, and `get` drops entries that have lapsed.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, StoredSession>>,
    max_age: Duration,
}

impl InMemorySessionStore {
    pub fn new(max_age: std::time::Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_age: Duration::from_std(max_age).unwrap_or_else(|_| Duration::days(36_500)),
        }
    }

    /// Number of live (possibly expired but not yet swept) sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every expired session; returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| stored.expires_at > now);
        before - sessions.len()
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.max_age)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &SessionId) -> PortResult<Option<SessionData>> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                None => return Ok(None),
                Some(stored) if stored.expires_at > now => return Ok(Some(stored.data.clone())),
                Some(_) => {}
            }
        }
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(session_id)
            .is_some_and(|stored| stored.expires_at <= now)
        {
            sessions.remove(session_id);
        }
        Ok(None)
    }

    async fn set(&self, session_id: &SessionId, data: SessionData) -> PortResult<()> {
        let expires_at = self.expiry_from(Utc::now());
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), StoredSession { data, expires_at });
        Ok(())
    }

    async fn destroy(&self, session_id: &SessionId) -> PortResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}
