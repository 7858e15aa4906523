pub mod auth;
pub mod forms;
pub mod home;
pub mod middleware;
pub mod router;
pub mod session;
pub mod state;

// Re-export what the binary and the tests need to assemble the server.
pub use middleware::require_login;
pub use router::create_router;
pub use session::{attach_session, Session, SESSION_COOKIE_NAME};
pub use state::AppState;
