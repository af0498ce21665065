//! services/api/src/adapters/tokens.rs
//!
//! HS256 JWT implementation of the `TokenService` port. The token carries the
//! normalized email, the issuer and the issue/expiry instants.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use streaming_catalog_core::ports::{PortError, PortResult, TokenError, TokenService};
use tracing::debug;

use crate::config::JwtConfig;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    email: String,
    iat: i64,
    exp: i64,
    iss: String,
}

#[derive(Clone)]
pub struct JwtTokenAdapter {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
}

impl JwtTokenAdapter {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(std::slice::from_ref(&config.issuer));
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            issuer: config.issuer.clone(),
            ttl: config.ttl,
        }
    }

    fn issue_at(&self, email: &str, issued_at: i64) -> PortResult<String> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| issued_at.checked_add(ttl))
            .ok_or_else(|| PortError::Unexpected("token lifetime out of range".to_string()))?;
        let claims = Claims {
            email: email.to_string(),
            iat: issued_at,
            exp,
            iss: self.issuer.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

impl TokenService for JwtTokenAdapter {
    fn issue(&self, email: &str) -> PortResult<String> {
        let token = self.issue_at(email, Utc::now().timestamp())?;
        debug!("jwt signed");
        Ok(token)
    }

    fn validate(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        Ok(data.claims.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn adapter(secret: &str, issuer: &str) -> JwtTokenAdapter {
        JwtTokenAdapter::new(&JwtConfig {
            secret: SecretString::from(secret),
            issuer: issuer.to_string(),
            ttl: Duration::from_secs(3600),
        })
    }

    #[test]
    fn issue_and_validate() {
        let tokens = adapter("dev-secret", "streaming-catalog");
        let token = tokens.issue("ada@example.com").unwrap();
        assert_eq!(tokens.validate(&token).unwrap(), "ada@example.com");
    }

    #[test]
    fn expired_tokens_are_distinguishable() {
        let tokens = adapter("dev-secret", "streaming-catalog");
        let two_hours_ago = Utc::now().timestamp() - 7200;
        let token = tokens.issue_at("ada@example.com", two_hours_ago).unwrap();
        assert_eq!(tokens.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn out_of_range_lifetime_fails_to_issue() {
        let tokens = JwtTokenAdapter::new(&JwtConfig {
            secret: SecretString::from("dev-secret"),
            issuer: "streaming-catalog".to_string(),
            ttl: Duration::from_secs(u64::MAX),
        });
        assert!(matches!(tokens.issue("ada@example.com"), Err(PortError::Unexpected(_))));
    }

    #[test]
    fn foreign_or_garbled_tokens_are_invalid() {
        let ours = adapter("dev-secret", "streaming-catalog");
        let other_secret = adapter("another-secret", "streaming-catalog");
        let other_issuer = adapter("dev-secret", "someone-else");

        let token = other_secret.issue("ada@example.com").unwrap();
        assert_eq!(ours.validate(&token), Err(TokenError::Invalid));

        let token = other_issuer.issue("ada@example.com").unwrap();
        assert_eq!(ours.validate(&token), Err(TokenError::Invalid));

        assert_eq!(ours.validate("not.a.jwt"), Err(TokenError::Invalid));
    }
}
