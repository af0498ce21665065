//! crates/streaming_catalog_core/src/ports.rs
//!
//! Defines the capability contracts (traits) the catalog core consumes.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the backing store, the password hash and the token format.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Movie, MovieChanges, NewMovie, NewReview, NewUser, RatingRollup, ReviewEntry, User,
    UserCredentials, WatchedEntry,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, disk).
///
/// Absence is not an error here: lookups return `Option`, so a failing store can never
/// be mistaken for a missing record.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Conflicting record: {0}")]
    Conflict(String),
    #[error("Backing service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Ports
//=========================================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Looks a user up by an already-normalized email.
    async fn find_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>>;

    /// Persists a new user. Fails with `PortError::Conflict` if the email is taken.
    async fn insert(&self, user: NewUser) -> PortResult<User>;

    async fn find_by_id(&self, user_id: Uuid) -> PortResult<Option<User>>;
}

#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn insert(&self, movie: NewMovie) -> PortResult<Movie>;

    async fn find_by_id(&self, movie_id: Uuid) -> PortResult<Option<Movie>>;

    /// Applies a partial update. Returns `None` if the movie does not exist.
    async fn update(&self, movie_id: Uuid, changes: &MovieChanges) -> PortResult<Option<Movie>>;

    /// Records the blob key of the movie's cover. Returns `None` if the movie does not exist.
    async fn set_cover(&self, movie_id: Uuid, cover_key: &str) -> PortResult<Option<Movie>>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, movie_id: Uuid) -> PortResult<bool>;
}

#[async_trait]
pub trait EngagementRepository: Send + Sync {
    /// Inserts the (user, movie) watched mark, or refreshes its timestamp if present.
    /// Must be a single atomic operation against the store.
    async fn upsert_watched(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        watched_at: DateTime<Utc>,
    ) -> PortResult<WatchedEntry>;

    async fn find_watched(&self, user_id: Uuid, movie_id: Uuid) -> PortResult<Option<WatchedEntry>>;

    /// All watched marks of a user, most recent first.
    async fn list_watched(&self, user_id: Uuid) -> PortResult<Vec<WatchedEntry>>;

    /// Inserts the (user, movie) review, or replaces rating, text and timestamp if present.
    /// Must be a single atomic operation against the store.
    async fn upsert_review(&self, review: NewReview) -> PortResult<ReviewEntry>;

    /// All reviews of a movie, most recent first.
    async fn list_reviews(&self, movie_id: Uuid) -> PortResult<Vec<ReviewEntry>>;
}

#[async_trait]
pub trait RatingAggregator: Send + Sync {
    /// Joins movies to their reviews and reduces each group to a sum and a count.
    ///
    /// With `Some(id)` only that movie is considered. Rows come back in movie creation
    /// order, oldest first.
    async fn rollup(&self, movie_id: Option<Uuid>) -> PortResult<Vec<RatingRollup>>;
}

//=========================================================================================
// Credential, Token and Blob Ports
//=========================================================================================

pub trait CredentialHasher: Send + Sync {
    /// Produces a salted, deliberately slow one-way digest of `secret`.
    fn hash(&self, secret: &str) -> PortResult<String>;

    fn verify(&self, digest: &str, secret: &str) -> PortResult<bool>;
}

/// Why a bearer token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed or has a bad signature")]
    Invalid,
    #[error("token is expired")]
    Expired,
}

pub trait TokenService: Send + Sync {
    /// Issues an opaque bearer token encoding the normalized email.
    fn issue(&self, email: &str) -> PortResult<String>;

    /// Returns the email encoded in a valid, unexpired token.
    fn validate(&self, token: &str) -> Result<String, TokenError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `body` under `key`, replacing any previous object. Returns the stored key.
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> PortResult<String>;

    /// Removes the object under `key`. A missing object is not an error.
    async fn delete(&self, key: &str) -> PortResult<()>;
}
