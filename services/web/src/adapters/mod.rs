pub mod db;
pub mod memory;
pub mod password;

pub use db::PgUserStore;
pub use memory::{InMemorySessionStore, InMemoryUserStore};
pub use password::Argon2Hasher;
