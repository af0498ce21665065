//! services/api/src/adapters/password.rs
//!
//! Argon2id implementation of the `CredentialHasher` port.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use streaming_catalog_core::ports::{CredentialHasher, PortError, PortResult};
use tracing::error;

/// Produces salted PHC strings; verification reads the parameters back from the digest.
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
    fn hash(&self, secret: &str) -> PortResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                PortError::Unexpected(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, digest: &str, secret: &str) -> PortResult<bool> {
        let parsed = PasswordHash::new(digest).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            PortError::Unexpected(e.to_string())
        })?;
        Ok(self
            .argon2
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok())
    }
}
