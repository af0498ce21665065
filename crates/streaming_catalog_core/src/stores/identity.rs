//! crates/streaming_catalog_core/src/stores/identity.rs
//!
//! Owns user records: registration with unique emails, password checks and lookups.

use std::sync::Arc;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};
use uuid::Uuid;

use crate::bounded::bounded;
use crate::domain::{NewUser, User};
use crate::error::{CatalogError, CatalogResult};
use crate::ports::{CredentialHasher, PortError, PortResult, UserRepository};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Clone)]
pub struct IdentityStore {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    timeout: Duration,
}

impl IdentityStore {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        timeout: Duration,
    ) -> Self {
        Self {
            users,
            hasher,
            timeout,
        }
    }

    /// Creates a user and returns its identifier.
    ///
    /// The raw password is consumed: it is hashed off the async runtime and dropped
    /// (and zeroized) as soon as the digest exists.
    pub async fn register(
        &self,
        full_name: &str,
        age: u8,
        email: &str,
        raw_password: SecretString,
    ) -> CatalogResult<Uuid> {
        let email = normalize_email(email);
        let full_name = full_name.trim().to_string();

        let existing = bounded("users.find_by_email", self.timeout, self.users.find_by_email(&email)).await?;
        if existing.is_some() {
            warn!(email = %email, "email already registered");
            return Err(CatalogError::DuplicateEmail);
        }

        let password_hash = self.hash(raw_password).await?;

        let new_user = NewUser {
            full_name,
            age,
            email,
            password_hash,
        };
        let user = match tokio::time::timeout(self.timeout, self.users.insert(new_user)).await {
            Ok(Ok(user)) => user,
            // Lost a race with a concurrent registration of the same email.
            Ok(Err(PortError::Conflict(_))) => return Err(CatalogError::DuplicateEmail),
            Ok(Err(err)) => return Err(CatalogError::from_port("users.insert", err)),
            Err(_) => return Err(CatalogError::Timeout { op: "users.insert" }),
        };

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user.id)
    }

    /// Checks an email/password pair and returns the matching user's identifier.
    pub async fn authenticate(&self, email: &str, raw_password: &SecretString) -> CatalogResult<Uuid> {
        let email = normalize_email(email);
        let credentials = bounded("users.find_by_email", self.timeout, self.users.find_by_email(&email))
            .await?
            .ok_or(CatalogError::NotFound("user"))?;
        let user_id = credentials.user.id;

        let hasher = Arc::clone(&self.hasher);
        let digest = credentials.password_hash;
        let candidate = SecretString::from(raw_password.expose_secret().to_owned());
        let valid = off_runtime("users.verify_password", move || {
            hasher.verify(&digest, candidate.expose_secret())
        })
        .await?;
        if !valid {
            warn!(user_id = %user_id, "login invalid password");
            return Err(CatalogError::InvalidCredentials);
        }
        Ok(user_id)
    }

    pub async fn resolve(&self, user_id: Uuid) -> CatalogResult<User> {
        bounded("users.find_by_id", self.timeout, self.users.find_by_id(user_id))
            .await?
            .ok_or(CatalogError::NotFound("user"))
    }

    /// Looks a user up by email, normalizing it first.
    pub async fn find_by_email(&self, email: &str) -> CatalogResult<Option<User>> {
        let email = normalize_email(email);
        let credentials =
            bounded("users.find_by_email", self.timeout, self.users.find_by_email(&email)).await?;
        Ok(credentials.map(|c| c.user))
    }

    async fn hash(&self, raw_password: SecretString) -> CatalogResult<String> {
        let hasher = Arc::clone(&self.hasher);
        off_runtime("users.hash_password", move || {
            let digest = hasher.hash(raw_password.expose_secret());
            drop(raw_password);
            digest
        })
        .await
    }
}

/// Runs a deliberately slow credential computation on the blocking pool.
async fn off_runtime<T, F>(op: &'static str, work: F) -> CatalogResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> PortResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| CatalogError::StorageFailure {
            op,
            message: e.to_string(),
        })?
        .map_err(|e| CatalogError::from_port(op, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ada@Example.COM \n"), "ada@example.com");
    }

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example@x.io"));
        assert!(!is_valid_email(""));
    }
}
