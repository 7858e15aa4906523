//! services/web/src/adapters/password.rs
//!
//! Argon2 implementation of the `CredentialHasher` port.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use parlor_core::ports::{CredentialHasher, PortError, PortResult};
use tracing::warn;

/// Produces PHC-formatted Argon2id hashes with a random salt per call.
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn generate(&self, password: &str) -> PortResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PortError::Hashing(e.to_string()))
    }

    fn verify(&self, password: &str, password_hash: &str) -> bool {
        // Parameters come from the stored hash, not from `self.argon2`.
        let parsed_hash = match PasswordHash::new(password_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash could not be parsed: {}", e);
                return false;
            }
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
