//! crates/streaming_catalog_core/src/stores/engagement.rs
//!
//! Owns "watched" marks and reviews. Both are keyed by (user, movie) and hold at most
//! one record per pair: repeated calls refresh or replace, never append.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::bounded::bounded;
use crate::domain::{NewReview, Rating, ReviewEntry, WatchedEntry};
use crate::error::{CatalogError, CatalogResult};
use crate::ports::EngagementRepository;

#[derive(Clone)]
pub struct EngagementStore {
    entries: Arc<dyn EngagementRepository>,
    timeout: Duration,
}

impl EngagementStore {
    pub fn new(entries: Arc<dyn EngagementRepository>, timeout: Duration) -> Self {
        Self { entries, timeout }
    }

    pub async fn mark_watched(&self, user_id: Uuid, movie_id: Uuid) -> CatalogResult<WatchedEntry> {
        let entry = bounded(
            "watched.upsert",
            self.timeout,
            self.entries.upsert_watched(user_id, movie_id, Utc::now()),
        )
        .await?;
        debug!(%user_id, %movie_id, watched_at = %entry.watched_at, "watched mark upserted");
        Ok(entry)
    }

    pub async fn has_watched(&self, user_id: Uuid, movie_id: Uuid) -> CatalogResult<bool> {
        let entry = bounded(
            "watched.find",
            self.timeout,
            self.entries.find_watched(user_id, movie_id),
        )
        .await?;
        Ok(entry.is_some())
    }

    pub async fn list_watched(&self, user_id: Uuid) -> CatalogResult<Vec<WatchedEntry>> {
        bounded("watched.list", self.timeout, self.entries.list_watched(user_id)).await
    }

    /// Creates or replaces the user's review of a movie.
    ///
    /// The rating is validated before anything touches storage, and the pair must
    /// already carry a watched mark.
    pub async fn submit_review(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        rating: i64,
        text: &str,
    ) -> CatalogResult<ReviewEntry> {
        let rating = Rating::new(rating)?;
        if !self.has_watched(user_id, movie_id).await? {
            return Err(CatalogError::NotWatched);
        }

        let review = NewReview {
            user_id,
            movie_id,
            rating,
            review: text.trim().to_string(),
            reviewed_at: Utc::now(),
        };
        let entry = bounded("reviews.upsert", self.timeout, self.entries.upsert_review(review)).await?;
        info!(%user_id, %movie_id, rating = entry.rating.value(), "movie reviewed");
        Ok(entry)
    }

    pub async fn list_reviews(&self, movie_id: Uuid) -> CatalogResult<Vec<ReviewEntry>> {
        bounded("reviews.list", self.timeout, self.entries.list_reviews(movie_id)).await
    }
}
