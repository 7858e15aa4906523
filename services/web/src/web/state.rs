//! services/web/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use axum_extra::extract::cookie::Key;
use parlor_core::ports::{CredentialHasher, SessionStore, UserStore};

use crate::config::Config;
use crate::templates::TemplateCache;
use crate::web::session::cookie_key_from_secret;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// `sessions` is the same store the chat transport reads to authorize its own
/// connections; nothing here locks it.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub templates: Arc<TemplateCache>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        let templates = Arc::new(TemplateCache::new(
            config.template_root.clone(),
            config.debug,
        ));
        let cookie_key = cookie_key_from_secret(&config.cookie_secret);
        Self {
            config,
            users,
            sessions,
            hasher,
            templates,
            cookie_key,
        }
    }
}
