//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of every persistence port. All collections sit behind
//! one `RwLock`, so each upsert is a single find-or-create under the write lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use streaming_catalog_core::domain::{
    Movie, MovieChanges, NewMovie, NewReview, NewUser, RatingRollup, ReviewEntry, User,
    UserCredentials, WatchedEntry,
};
use streaming_catalog_core::ports::{
    EngagementRepository, MovieRepository, PortError, PortResult, RatingAggregator,
    UserRepository,
};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    users: Vec<UserCredentials>,
    // Insertion order is creation order.
    movies: Vec<Movie>,
    watched: Vec<WatchedEntry>,
    reviews: Vec<ReviewEntry>,
}

#[derive(Clone, Default)]
pub struct MemoryAdapter {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of watched marks held for the pair. Used to observe upsert behavior.
    pub async fn watched_count(&self, user_id: Uuid, movie_id: Uuid) -> usize {
        let state = self.inner.read().await;
        state
            .watched
            .iter()
            .filter(|w| w.user_id == user_id && w.movie_id == movie_id)
            .count()
    }

    /// Number of reviews held for the pair.
    pub async fn review_count(&self, user_id: Uuid, movie_id: Uuid) -> usize {
        let state = self.inner.read().await;
        state
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id && r.movie_id == movie_id)
            .count()
    }
}

fn newest_first<T, F>(mut items: Vec<T>, at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by(|a, b| at(b).cmp(&at(a)));
    items
}

//=========================================================================================
// Users
//=========================================================================================

#[async_trait]
impl UserRepository for MemoryAdapter {
    async fn find_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let state = self.inner.read().await;
        Ok(state.users.iter().find(|c| c.user.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> PortResult<User> {
        let mut state = self.inner.write().await;
        if state.users.iter().any(|c| c.user.email == user.email) {
            return Err(PortError::Conflict(format!("email {} already exists", user.email)));
        }
        let record = User {
            id: Uuid::new_v4(),
            full_name: user.full_name,
            age: user.age,
            email: user.email,
            created_at: Utc::now(),
        };
        state.users.push(UserCredentials {
            user: record.clone(),
            password_hash: user.password_hash,
        });
        Ok(record)
    }

    async fn find_by_id(&self, user_id: Uuid) -> PortResult<Option<User>> {
        let state = self.inner.read().await;
        Ok(state
            .users
            .iter()
            .find(|c| c.user.id == user_id)
            .map(|c| c.user.clone()))
    }
}

//=========================================================================================
// Movies
//=========================================================================================

#[async_trait]
impl MovieRepository for MemoryAdapter {
    async fn insert(&self, movie: NewMovie) -> PortResult<Movie> {
        let record = Movie {
            id: Uuid::new_v4(),
            title: movie.title,
            description: movie.description,
            release_date: movie.release_date,
            cover_key: None,
            added_by: movie.added_by,
            created_at: Utc::now(),
        };
        self.inner.write().await.movies.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, movie_id: Uuid) -> PortResult<Option<Movie>> {
        let state = self.inner.read().await;
        Ok(state.movies.iter().find(|m| m.id == movie_id).cloned())
    }

    async fn update(&self, movie_id: Uuid, changes: &MovieChanges) -> PortResult<Option<Movie>> {
        let mut state = self.inner.write().await;
        let Some(movie) = state.movies.iter_mut().find(|m| m.id == movie_id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            movie.title = title.clone();
        }
        if let Some(description) = &changes.description {
            movie.description = description.clone();
        }
        if let Some(release_date) = changes.release_date {
            movie.release_date = Some(release_date);
        }
        Ok(Some(movie.clone()))
    }

    async fn set_cover(&self, movie_id: Uuid, cover_key: &str) -> PortResult<Option<Movie>> {
        let mut state = self.inner.write().await;
        Ok(state.movies.iter_mut().find(|m| m.id == movie_id).map(|movie| {
            movie.cover_key = Some(cover_key.to_string());
            movie.clone()
        }))
    }

    async fn delete(&self, movie_id: Uuid) -> PortResult<bool> {
        let mut state = self.inner.write().await;
        let before = state.movies.len();
        state.movies.retain(|m| m.id != movie_id);
        if state.movies.len() == before {
            return Ok(false);
        }
        state.watched.retain(|w| w.movie_id != movie_id);
        state.reviews.retain(|r| r.movie_id != movie_id);
        Ok(true)
    }
}

//=========================================================================================
// Engagement
//=========================================================================================

#[async_trait]
impl EngagementRepository for MemoryAdapter {
    async fn upsert_watched(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        watched_at: DateTime<Utc>,
    ) -> PortResult<WatchedEntry> {
        let mut state = self.inner.write().await;
        if let Some(entry) = state
            .watched
            .iter_mut()
            .find(|w| w.user_id == user_id && w.movie_id == movie_id)
        {
            entry.watched_at = watched_at;
            return Ok(entry.clone());
        }
        let entry = WatchedEntry {
            id: Uuid::new_v4(),
            user_id,
            movie_id,
            watched_at,
        };
        state.watched.push(entry.clone());
        Ok(entry)
    }

    async fn find_watched(&self, user_id: Uuid, movie_id: Uuid) -> PortResult<Option<WatchedEntry>> {
        let state = self.inner.read().await;
        Ok(state
            .watched
            .iter()
            .find(|w| w.user_id == user_id && w.movie_id == movie_id)
            .cloned())
    }

    async fn list_watched(&self, user_id: Uuid) -> PortResult<Vec<WatchedEntry>> {
        let state = self.inner.read().await;
        let entries = state
            .watched
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(entries, |w| w.watched_at))
    }

    async fn upsert_review(&self, review: NewReview) -> PortResult<ReviewEntry> {
        let mut state = self.inner.write().await;
        if let Some(entry) = state
            .reviews
            .iter_mut()
            .find(|r| r.user_id == review.user_id && r.movie_id == review.movie_id)
        {
            entry.rating = review.rating;
            entry.review = review.review;
            entry.reviewed_at = review.reviewed_at;
            return Ok(entry.clone());
        }
        let entry = ReviewEntry {
            id: Uuid::new_v4(),
            user_id: review.user_id,
            movie_id: review.movie_id,
            rating: review.rating,
            review: review.review,
            reviewed_at: review.reviewed_at,
        };
        state.reviews.push(entry.clone());
        Ok(entry)
    }

    async fn list_reviews(&self, movie_id: Uuid) -> PortResult<Vec<ReviewEntry>> {
        let state = self.inner.read().await;
        let entries = state
            .reviews
            .iter()
            .filter(|r| r.movie_id == movie_id)
            .cloned()
            .collect();
        Ok(newest_first(entries, |r| r.reviewed_at))
    }
}

//=========================================================================================
// Aggregation
//=========================================================================================

#[async_trait]
impl RatingAggregator for MemoryAdapter {
    async fn rollup(&self, movie_id: Option<Uuid>) -> PortResult<Vec<RatingRollup>> {
        let state = self.inner.read().await;
        let rows = state
            .movies
            .iter()
            .filter(|m| movie_id.map_or(true, |id| m.id == id))
            .map(|movie| {
                let (rating_sum, rating_count) = state
                    .reviews
                    .iter()
                    .filter(|r| r.movie_id == movie.id)
                    .fold((0i64, 0i64), |(sum, count), r| {
                        (sum + i64::from(r.rating.value()), count + 1)
                    });
                RatingRollup {
                    movie: movie.clone(),
                    rating_sum,
                    rating_count,
                }
            })
            .collect();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streaming_catalog_core::domain::Rating;

    fn new_movie(owner: Uuid, title: &str) -> NewMovie {
        NewMovie {
            title: title.into(),
            description: "d".into(),
            release_date: None,
            added_by: owner,
        }
    }

    #[tokio::test]
    async fn duplicate_emails_conflict() {
        let store = MemoryAdapter::new();
        let user = NewUser {
            full_name: "Ada".into(),
            age: 36,
            email: "ada@example.com".into(),
            password_hash: "h".into(),
        };
        UserRepository::insert(&store, user.clone()).await.unwrap();
        let err = UserRepository::insert(&store, user).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_a_movie_drops_its_engagement() {
        let store = MemoryAdapter::new();
        let owner = Uuid::new_v4();
        let movie = MovieRepository::insert(&store, new_movie(owner, "Heat")).await.unwrap();
        store.upsert_watched(owner, movie.id, Utc::now()).await.unwrap();
        store
            .upsert_review(NewReview {
                user_id: owner,
                movie_id: movie.id,
                rating: Rating::new(4).unwrap(),
                review: "tense".into(),
                reviewed_at: Utc::now(),
            })
            .await
            .unwrap();

        assert!(MovieRepository::delete(&store, movie.id).await.unwrap());
        assert_eq!(store.watched_count(owner, movie.id).await, 0);
        assert_eq!(store.review_count(owner, movie.id).await, 0);
        assert!(!MovieRepository::delete(&store, movie.id).await.unwrap());
    }

    #[tokio::test]
    async fn rollup_keeps_creation_order_and_counts_zero_reviews() {
        let store = MemoryAdapter::new();
        let owner = Uuid::new_v4();
        let first = MovieRepository::insert(&store, new_movie(owner, "B")).await.unwrap();
        let second = MovieRepository::insert(&store, new_movie(owner, "A")).await.unwrap();

        let rows = store.rollup(None).await.unwrap();
        let ids: Vec<Uuid> = rows.iter().map(|r| r.movie.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert!(rows.iter().all(|r| r.rating_count == 0 && r.rating_sum == 0));

        let only = store.rollup(Some(second.id)).await.unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].movie.id, second.id);
    }
}
