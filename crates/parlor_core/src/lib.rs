pub mod domain;
pub mod ports;

pub use domain::{NewUser, SessionData, SessionId, User};
pub use ports::{CredentialHasher, PortError, PortResult, SessionStore, UserStore};
