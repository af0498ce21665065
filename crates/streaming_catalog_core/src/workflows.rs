//! crates/streaming_catalog_core/src/workflows.rs
//!
//! The facade the transport layer talks to. Each workflow takes the acting user as an
//! explicit parameter, validates input, fetches what the guard needs, evaluates the
//! guard, and only then calls the mutating store operation.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::aggregation::AggregationEngine;
use crate::bounded::DEFAULT_STORE_TIMEOUT;
use crate::domain::{Movie, MovieDraft, MovieInfo, MoviePatch, Rating, ReviewEntry, User, WatchedEntry};
use crate::error::{CatalogError, CatalogResult};
use crate::guard;
use crate::ports::{
    BlobStore, CredentialHasher, EngagementRepository, MovieRepository, RatingAggregator,
    TokenError, TokenService, UserRepository,
};
use crate::stores::identity::is_valid_email;
use crate::stores::{normalize_email, CatalogStore, EngagementStore, IdentityStore};

/// The concrete adapters a [`CatalogService`] is assembled from.
#[derive(Clone)]
pub struct CatalogPorts {
    pub users: Arc<dyn UserRepository>,
    pub movies: Arc<dyn MovieRepository>,
    pub engagement: Arc<dyn EngagementRepository>,
    pub ratings: Arc<dyn RatingAggregator>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub tokens: Arc<dyn TokenService>,
    pub blobs: Arc<dyn BlobStore>,
}

/// Registration input as received from a caller.
pub struct Registration {
    pub full_name: String,
    pub age: i64,
    pub email: String,
    pub password: SecretString,
    pub password_confirmation: SecretString,
}

impl Registration {
    /// Accepted ages, exclusive of both ends of the 0..100 range.
    pub const AGE_RANGE: std::ops::RangeInclusive<i64> = 1..=99;

    fn validate(&self) -> CatalogResult<u8> {
        if self.full_name.trim().is_empty() {
            return Err(CatalogError::Validation("full_name must not be empty".into()));
        }
        if !Self::AGE_RANGE.contains(&self.age) {
            return Err(CatalogError::Validation("age must be between 1 and 99".into()));
        }
        if !is_valid_email(&normalize_email(&self.email)) {
            return Err(CatalogError::Validation("email is not valid".into()));
        }
        if self.password.expose_secret().is_empty() {
            return Err(CatalogError::Validation("password must not be empty".into()));
        }
        if self.password.expose_secret() != self.password_confirmation.expose_secret() {
            return Err(CatalogError::Validation(
                "password and password_confirmation do not match".into(),
            ));
        }
        Ok(self.age as u8)
    }
}

#[derive(Clone)]
pub struct CatalogService {
    identity: IdentityStore,
    catalog: CatalogStore,
    engagement: EngagementStore,
    aggregation: AggregationEngine,
    tokens: Arc<dyn TokenService>,
}

impl CatalogService {
    pub fn new(ports: CatalogPorts) -> Self {
        Self::with_timeout(ports, DEFAULT_STORE_TIMEOUT)
    }

    /// Builds the service with `store_timeout` bounding every individual store call.
    pub fn with_timeout(ports: CatalogPorts, store_timeout: Duration) -> Self {
        Self {
            identity: IdentityStore::new(ports.users, ports.hasher, store_timeout),
            catalog: CatalogStore::new(ports.movies, ports.blobs, store_timeout),
            engagement: EngagementStore::new(ports.engagement, store_timeout),
            aggregation: AggregationEngine::new(ports.ratings, store_timeout),
            tokens: ports.tokens,
        }
    }

    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn engagement(&self) -> &EngagementStore {
        &self.engagement
    }

    pub fn aggregation(&self) -> &AggregationEngine {
        &self.aggregation
    }

    //=====================================================================================
    // Identity
    //=====================================================================================

    pub async fn register(&self, registration: Registration) -> CatalogResult<uuid::Uuid> {
        let age = registration.validate()?;
        let Registration {
            full_name,
            email,
            password,
            ..
        } = registration;
        self.identity.register(&full_name, age, &email, password).await
    }

    /// Checks credentials and issues a bearer token for the user.
    pub async fn login(&self, email: &str, password: &SecretString) -> CatalogResult<(User, String)> {
        let user_id = self.identity.authenticate(email, password).await?;
        let user = self.identity.resolve(user_id).await?;
        let token = self
            .tokens
            .issue(&user.email)
            .map_err(|e| CatalogError::from_port("tokens.issue", e))?;
        info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }

    /// Resolves the user a bearer token was issued to.
    pub async fn authenticate_bearer(&self, token: &str) -> CatalogResult<User> {
        let email = self.tokens.validate(token).map_err(|e| match e {
            TokenError::Expired => CatalogError::TokenExpired,
            TokenError::Invalid => CatalogError::TokenInvalid,
        })?;
        // A valid token for an account that no longer resolves is as good as forged.
        self.identity
            .find_by_email(&email)
            .await?
            .ok_or(CatalogError::TokenInvalid)
    }

    //=====================================================================================
    // Catalog mutations (owner only)
    //=====================================================================================

    pub async fn add_movie(&self, actor: &User, draft: MovieDraft) -> CatalogResult<Movie> {
        self.catalog
            .add_movie(actor.id, &draft.title, &draft.description, draft.release_date)
            .await
    }

    pub async fn update_movie(&self, actor: &User, raw_id: &str, patch: MoviePatch) -> CatalogResult<Movie> {
        let changes = patch.into_changes()?;
        let movie = self.owned_movie(actor, raw_id).await?;
        self.catalog.apply_changes(movie.id, changes).await
    }

    pub async fn delete_movie(&self, actor: &User, raw_id: &str) -> CatalogResult<()> {
        let movie = self.owned_movie(actor, raw_id).await?;
        self.catalog.remove(movie.id).await
    }

    pub async fn upload_cover(
        &self,
        actor: &User,
        raw_id: &str,
        image: Vec<u8>,
        content_type: &str,
    ) -> CatalogResult<Movie> {
        let movie = self.owned_movie(actor, raw_id).await?;
        self.catalog.store_cover(movie.id, image, content_type).await
    }

    async fn owned_movie(&self, actor: &User, raw_id: &str) -> CatalogResult<Movie> {
        let movie = self.catalog.get_movie(raw_id).await?;
        if !guard::can_modify(&movie, actor.id) {
            warn!(movie_id = %movie.id, user_id = %actor.id, "movie is not owned by acting user");
            return Err(CatalogError::Forbidden);
        }
        Ok(movie)
    }

    //=====================================================================================
    // Engagement
    //=====================================================================================

    pub async fn watch_movie(&self, actor: &User, raw_id: &str) -> CatalogResult<WatchedEntry> {
        let movie = self.catalog.get_movie(raw_id).await?;
        self.engagement.mark_watched(actor.id, movie.id).await
    }

    pub async fn review_movie(
        &self,
        actor: &User,
        raw_id: &str,
        rating: i64,
        text: &str,
    ) -> CatalogResult<ReviewEntry> {
        Rating::new(rating)?;
        let movie = self.catalog.get_movie(raw_id).await?;
        let watched = self.engagement.has_watched(actor.id, movie.id).await?;
        if !guard::can_review(watched) {
            warn!(movie_id = %movie.id, user_id = %actor.id, "review refused: movie not watched");
            return Err(CatalogError::NotWatched);
        }
        self.engagement.submit_review(actor.id, movie.id, rating, text).await
    }

    pub async fn list_watched(&self, actor: &User) -> CatalogResult<Vec<WatchedEntry>> {
        self.engagement.list_watched(actor.id).await
    }

    pub async fn list_reviews(&self, raw_id: &str) -> CatalogResult<Vec<ReviewEntry>> {
        let movie = self.catalog.get_movie(raw_id).await?;
        self.engagement.list_reviews(movie.id).await
    }

    //=====================================================================================
    // Read paths
    //=====================================================================================

    pub async fn list_movies(
        &self,
        sort_by: Option<&str>,
        direction: Option<&str>,
    ) -> CatalogResult<Vec<MovieInfo>> {
        self.aggregation.list_movies(sort_by, direction).await
    }

    pub async fn movie_info(&self, raw_id: &str) -> CatalogResult<MovieInfo> {
        self.aggregation.get_movie_info(raw_id).await
    }
}
