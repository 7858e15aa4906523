//! services/web/src/web/session.rs
//!
//! Attaches a server-side session to every request.
//!
//! The session id travels in a signed cookie. A request without a valid
//! cookie, or whose id the store no longer knows, gets a fresh anonymous
//! session that is written to the store straight away.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use parlor_core::domain::{SessionData, SessionId, User};
use parlor_core::ports::{PortResult, SessionStore};
use sha2::{Digest, Sha512};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::ServerError;
use crate::web::state::AppState;

/// Name of the session cookie. It is deliberately not HttpOnly: the chat
/// transport's client script hands it to the socket connection.
pub const SESSION_COOKIE_NAME: &str = "chat.sid";

/// Stretches an arbitrary-length secret into a 64-byte signing key.
pub fn cookie_key_from_secret(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// Handle to the current request's session, placed in request extensions.
///
/// Mutations go to the store first and are mirrored locally, so later reads
/// within the same request see them.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    id: RwLock<SessionId>,
    data: RwLock<SessionData>,
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(id: SessionId, data: SessionData, store: Arc<dyn SessionStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id: RwLock::new(id),
                data: RwLock::new(data),
                store,
            }),
        }
    }

    /// The id the session is currently stored under.
    pub async fn id(&self) -> SessionId {
        self.inner.id.read().await.clone()
    }

    /// The user snapshot stored at login, if any.
    pub async fn user(&self) -> Option<User> {
        self.inner.data.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.data.read().await.is_authenticated()
    }

    /// Marks the session as belonging to `user` and persists it under a new
    /// id. The anonymous id the browser held before login stops resolving.
    pub async fn set_user(&self, user: User) -> PortResult<()> {
        let data = SessionData::authenticated(user);
        let new_id = SessionId::generate();
        self.inner.store.set(&new_id, data.clone()).await?;

        let mut id = self.inner.id.write().await;
        self.inner.store.destroy(&id).await?;
        *id = new_id;
        *self.inner.data.write().await = data;
        Ok(())
    }

    /// Removes the session from the store. Safe to call on anonymous sessions.
    pub async fn destroy(&self) -> PortResult<()> {
        let id = self.inner.id.read().await;
        self.inner.store.destroy(&id).await?;
        *self.inner.data.write().await = SessionData::default();
        Ok(())
    }
}

/// Middleware that resolves the session cookie into a [`Session`] extension.
pub async fn attach_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let jar = SignedCookieJar::from_headers(req.headers(), state.cookie_key.clone());

    let existing = match jar.get(SESSION_COOKIE_NAME) {
        Some(cookie) => {
            let id = SessionId::from(cookie.value());
            state.sessions.get(&id).await?.map(|data| (id, data))
        }
        None => None,
    };

    let (session, announced) = match existing {
        Some((id, data)) => (Session::new(id.clone(), data, state.sessions.clone()), Some(id)),
        None => {
            let id = SessionId::generate();
            let data = SessionData::default();
            state.sessions.set(&id, data.clone()).await?;
            debug!("Started anonymous session for {}", req.uri().path());
            (Session::new(id, data, state.sessions.clone()), None)
        }
    };

    req.extensions_mut().insert(session.clone());
    let response = next.run(req).await;

    // The cookie goes out for new sessions and for ids rotated at login.
    let current = session.id().await;
    if announced.as_ref() == Some(&current) {
        return Ok(response);
    }
    let cookie = Cookie::build((SESSION_COOKIE_NAME, current.to_string()))
        .path("/")
        .http_only(false)
        .same_site(SameSite::Lax);
    Ok((jar.add(cookie), response).into_response())
}
