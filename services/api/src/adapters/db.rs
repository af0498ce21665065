//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete Postgres implementation of
//! the persistence ports from the core crate. It handles all interactions with the
//! database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use streaming_catalog_core::domain::{
    Movie, MovieChanges, NewMovie, NewReview, NewUser, Rating, RatingRollup, ReviewEntry, User,
    UserCredentials, WatchedEntry,
};
use streaming_catalog_core::ports::{
    EngagementRepository, MovieRepository, PortError, PortResult, RatingAggregator,
    UserRepository,
};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every persistence port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Maps driver errors onto the port's error kinds.
fn port_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => PortError::Conflict(db.to_string()),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            PortError::Unavailable(e.to_string())
        }
        other => PortError::Unexpected(other.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    full_name: String,
    age: i16,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<UserCredentials> {
        let age = u8::try_from(self.age)
            .map_err(|_| PortError::Unexpected(format!("user {} has age {}", self.id, self.age)))?;
        Ok(UserCredentials {
            user: User {
                id: self.id,
                full_name: self.full_name,
                age,
                email: self.email,
                created_at: self.created_at,
            },
            password_hash: self.password_hash,
        })
    }
}

#[derive(FromRow)]
struct MovieRecord {
    id: Uuid,
    title: String,
    description: String,
    release_date: Option<NaiveDate>,
    cover_key: Option<String>,
    added_by: Uuid,
    created_at: DateTime<Utc>,
}
impl MovieRecord {
    fn to_domain(self) -> Movie {
        Movie {
            id: self.id,
            title: self.title,
            description: self.description,
            release_date: self.release_date,
            cover_key: self.cover_key,
            added_by: self.added_by,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct WatchedRecord {
    id: Uuid,
    user_id: Uuid,
    movie_id: Uuid,
    watched_at: DateTime<Utc>,
}
impl WatchedRecord {
    fn to_domain(self) -> WatchedEntry {
        WatchedEntry {
            id: self.id,
            user_id: self.user_id,
            movie_id: self.movie_id,
            watched_at: self.watched_at,
        }
    }
}

#[derive(FromRow)]
struct ReviewRecord {
    id: Uuid,
    user_id: Uuid,
    movie_id: Uuid,
    rating: i16,
    review: String,
    reviewed_at: DateTime<Utc>,
}
impl ReviewRecord {
    fn to_domain(self) -> PortResult<ReviewEntry> {
        let rating = Rating::new(i64::from(self.rating))
            .map_err(|e| PortError::Unexpected(format!("review {}: {}", self.id, e)))?;
        Ok(ReviewEntry {
            id: self.id,
            user_id: self.user_id,
            movie_id: self.movie_id,
            rating,
            review: self.review,
            reviewed_at: self.reviewed_at,
        })
    }
}

#[derive(FromRow)]
struct RollupRecord {
    #[sqlx(flatten)]
    movie: MovieRecord,
    rating_sum: i64,
    rating_count: i64,
}

const USER_COLUMNS: &str = "id, full_name, age, email, password_hash, created_at";
const MOVIE_COLUMNS: &str = "id, title, description, release_date, cover_key, added_by, created_at";
const WATCHED_COLUMNS: &str = "id, user_id, movie_id, watched_at";
const REVIEW_COLUMNS: &str = "id, user_id, movie_id, rating, review, reviewed_at";

//=========================================================================================
// `UserRepository` Implementation
//=========================================================================================

#[async_trait]
impl UserRepository for DbAdapter {
    async fn find_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(port_error)?;
        record.map(UserRecord::to_domain).transpose()
    }

    async fn insert(&self, user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, full_name, age, email, password_hash) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.full_name)
        .bind(i16::from(user.age))
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(port_error)?;
        Ok(record.to_domain()?.user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(port_error)?;
        Ok(record.map(UserRecord::to_domain).transpose()?.map(|c| c.user))
    }
}

//=========================================================================================
// `MovieRepository` Implementation
//=========================================================================================

#[async_trait]
impl MovieRepository for DbAdapter {
    async fn insert(&self, movie: NewMovie) -> PortResult<Movie> {
        let record = sqlx::query_as::<_, MovieRecord>(&format!(
            "INSERT INTO movies (id, title, description, release_date, added_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {MOVIE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(movie.release_date)
        .bind(movie.added_by)
        .fetch_one(&self.pool)
        .await
        .map_err(port_error)?;
        Ok(record.to_domain())
    }

    async fn find_by_id(&self, movie_id: Uuid) -> PortResult<Option<Movie>> {
        let record = sqlx::query_as::<_, MovieRecord>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"
        ))
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(port_error)?;
        Ok(record.map(MovieRecord::to_domain))
    }

    async fn update(&self, movie_id: Uuid, changes: &MovieChanges) -> PortResult<Option<Movie>> {
        // Absent fields keep their stored value.
        let record = sqlx::query_as::<_, MovieRecord>(&format!(
            "UPDATE movies SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 release_date = COALESCE($4, release_date) \
             WHERE id = $1 RETURNING {MOVIE_COLUMNS}"
        ))
        .bind(movie_id)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.release_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(port_error)?;
        Ok(record.map(MovieRecord::to_domain))
    }

    async fn set_cover(&self, movie_id: Uuid, cover_key: &str) -> PortResult<Option<Movie>> {
        let record = sqlx::query_as::<_, MovieRecord>(&format!(
            "UPDATE movies SET cover_key = $2 WHERE id = $1 RETURNING {MOVIE_COLUMNS}"
        ))
        .bind(movie_id)
        .bind(cover_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(port_error)?;
        Ok(record.map(MovieRecord::to_domain))
    }

    async fn delete(&self, movie_id: Uuid) -> PortResult<bool> {
        // Watched marks and reviews go with it (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(movie_id)
            .execute(&self.pool)
            .await
            .map_err(port_error)?;
        Ok(result.rows_affected() > 0)
    }
}

//=========================================================================================
// `EngagementRepository` Implementation
//=========================================================================================

#[async_trait]
impl EngagementRepository for DbAdapter {
    async fn upsert_watched(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        watched_at: DateTime<Utc>,
    ) -> PortResult<WatchedEntry> {
        let record = sqlx::query_as::<_, WatchedRecord>(&format!(
            "INSERT INTO watched (id, user_id, movie_id, watched_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, movie_id) DO UPDATE SET watched_at = EXCLUDED.watched_at \
             RETURNING {WATCHED_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(movie_id)
        .bind(watched_at)
        .fetch_one(&self.pool)
        .await
        .map_err(port_error)?;
        Ok(record.to_domain())
    }

    async fn find_watched(&self, user_id: Uuid, movie_id: Uuid) -> PortResult<Option<WatchedEntry>> {
        let record = sqlx::query_as::<_, WatchedRecord>(&format!(
            "SELECT {WATCHED_COLUMNS} FROM watched WHERE user_id = $1 AND movie_id = $2"
        ))
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(port_error)?;
        Ok(record.map(WatchedRecord::to_domain))
    }

    async fn list_watched(&self, user_id: Uuid) -> PortResult<Vec<WatchedEntry>> {
        let records = sqlx::query_as::<_, WatchedRecord>(&format!(
            "SELECT {WATCHED_COLUMNS} FROM watched WHERE user_id = $1 ORDER BY watched_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(port_error)?;
        Ok(records.into_iter().map(WatchedRecord::to_domain).collect())
    }

    async fn upsert_review(&self, review: NewReview) -> PortResult<ReviewEntry> {
        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "INSERT INTO reviews (id, user_id, movie_id, rating, review, reviewed_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, movie_id) DO UPDATE SET \
                 rating = EXCLUDED.rating, \
                 review = EXCLUDED.review, \
                 reviewed_at = EXCLUDED.reviewed_at \
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(review.user_id)
        .bind(review.movie_id)
        .bind(i16::from(review.rating.value()))
        .bind(&review.review)
        .bind(review.reviewed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(port_error)?;
        record.to_domain()
    }

    async fn list_reviews(&self, movie_id: Uuid) -> PortResult<Vec<ReviewEntry>> {
        let records = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE movie_id = $1 ORDER BY reviewed_at DESC"
        ))
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await
        .map_err(port_error)?;
        records.into_iter().map(ReviewRecord::to_domain).collect()
    }
}

//=========================================================================================
// `RatingAggregator` Implementation
//=========================================================================================

#[async_trait]
impl RatingAggregator for DbAdapter {
    async fn rollup(&self, movie_id: Option<Uuid>) -> PortResult<Vec<RatingRollup>> {
        let records = sqlx::query_as::<_, RollupRecord>(
            "SELECT m.id, m.title, m.description, m.release_date, m.cover_key, m.added_by, \
                    m.created_at, \
                    COALESCE(SUM(r.rating), 0)::BIGINT AS rating_sum, \
                    COUNT(r.id) AS rating_count \
             FROM movies m \
             LEFT JOIN reviews r ON r.movie_id = m.id \
             WHERE $1::UUID IS NULL OR m.id = $1 \
             GROUP BY m.id \
             ORDER BY m.created_at, m.id",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await
        .map_err(port_error)?;

        Ok(records
            .into_iter()
            .map(|r| RatingRollup {
                movie: r.movie.to_domain(),
                rating_sum: r.rating_sum,
                rating_count: r.rating_count,
            })
            .collect())
    }
}
