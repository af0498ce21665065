//! crates/streaming_catalog_core/src/domain.rs
//!
//! Defines the pure, core data structures for the catalog.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};

/// A registered account, as seen by everything except the credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub age: u8,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/registration - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// A user record ready to be persisted. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub age: u8,
    pub email: String,
    pub password_hash: String,
}

/// A movie in the catalog. `added_by` never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub release_date: Option<NaiveDate>,
    pub cover_key: Option<String>,
    pub added_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub description: String,
    pub release_date: Option<NaiveDate>,
    pub added_by: Uuid,
}

/// Caller-supplied fields for a new movie, before normalization.
#[derive(Debug, Clone, Default)]
pub struct MovieDraft {
    pub title: String,
    pub description: String,
    pub release_date: Option<NaiveDate>,
}

impl MovieDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        release_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            release_date,
        }
    }
}

/// A partial update as received from a caller.
///
/// `id` and `added_by` exist only so that a caller attempting to change them
/// can be rejected; they are never applied.
#[derive(Debug, Clone, Default)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub id: Option<Uuid>,
    pub added_by: Option<Uuid>,
}

/// The validated subset of a [`MoviePatch`] that repositories apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
}

impl MovieChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.release_date.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub watched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub rating: Rating,
    pub review: String,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub rating: Rating,
    pub review: String,
    pub reviewed_at: DateTime<Utc>,
}

/// A star rating, always within `Rating::MIN..=Rating::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    pub fn new(value: i64) -> CatalogResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(CatalogError::InvalidRating(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Output of the join/reduce step: one movie with the sum and count of its ratings.
#[derive(Debug, Clone)]
pub struct RatingRollup {
    pub movie: Movie,
    pub rating_sum: i64,
    pub rating_count: i64,
}

/// A movie enriched with rating statistics computed at read time. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieInfo {
    pub movie: Movie,
    pub rating_average: f64,
    pub rating_count: i64,
}
