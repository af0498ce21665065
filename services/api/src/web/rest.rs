//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the movie endpoints and the master definition for
//! the OpenAPI specification.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use streaming_catalog_core::{Movie, MovieDraft, MovieInfo, MoviePatch, ReviewEntry, WatchedEntry};
use tracing::instrument;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::auth::{
    LoginRequest, LoginResponse, RegisterRequest, RegisteredResponse, UserResponse,
};
use crate::web::envelope::Reply;
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        crate::web::auth::register_handler,
        crate::web::auth::login_handler,
        crate::web::auth::me_handler,
        list_movies_handler,
        list_movies_sorted_handler,
        list_watched_handler,
        add_movie_handler,
        movie_info_handler,
        update_movie_handler,
        delete_movie_handler,
        upload_cover_handler,
        watch_movie_handler,
        list_reviews_handler,
        review_movie_handler,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        RegisteredResponse,
        LoginResponse,
        UserResponse,
        MovieRequest,
        MoviePatchRequest,
        MovieResponse,
        MovieInfoResponse,
        WatchedResponse,
        ReviewRequest,
        ReviewResponse,
    )),
    tags(
        (name = "users", description = "Registration and bearer-token login."),
        (name = "movies", description = "The movie catalog, watched marks and reviews.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct MovieRequest {
    pub title: String,
    pub description: String,
    pub release_date: Option<NaiveDate>,
}

/// A partial update. `id` and `added_by` are accepted only to be refused.
#[derive(Deserialize, ToSchema)]
pub struct MoviePatchRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub id: Option<Uuid>,
    pub added_by: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
pub struct MovieResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub release_date: Option<NaiveDate>,
    pub cover_key: Option<String>,
    pub added_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Movie> for MovieResponse {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            description: movie.description,
            release_date: movie.release_date,
            cover_key: movie.cover_key,
            added_by: movie.added_by,
            created_at: movie.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MovieInfoResponse {
    #[serde(flatten)]
    pub movie: MovieResponse,
    pub rating_average: f64,
    pub rating_count: i64,
}

impl From<MovieInfo> for MovieInfoResponse {
    fn from(info: MovieInfo) -> Self {
        Self {
            movie: info.movie.into(),
            rating_average: info.rating_average,
            rating_count: info.rating_count,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct WatchedResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub watched_at: DateTime<Utc>,
}

impl From<WatchedEntry> for WatchedResponse {
    fn from(entry: WatchedEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            movie_id: entry.movie_id,
            watched_at: entry.watched_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub rating: i64,
    #[serde(default)]
    pub review: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub rating: u8,
    pub review: String,
    pub reviewed_at: DateTime<Utc>,
}

impl From<ReviewEntry> for ReviewResponse {
    fn from(entry: ReviewEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            movie_id: entry.movie_id,
            rating: entry.rating.value(),
            review: entry.review,
            reviewed_at: entry.reviewed_at,
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct SortQuery {
    /// One of `name`, `date`, `rating`.
    pub sort_by: Option<String>,
    /// One of `asc`, `desc`.
    pub direction: Option<String>,
}

fn infos(list: Vec<MovieInfo>) -> Vec<MovieInfoResponse> {
    list.into_iter().map(MovieInfoResponse::from).collect()
}

//=========================================================================================
// Read Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")))]
pub async fn health_handler() -> Reply<&'static str> {
    Reply::ok("OK", "healthy")
}

/// List every movie with its rating statistics.
///
/// Without parameters the list is sorted by name, descending.
#[utoipa::path(
    get,
    path = "/movies",
    params(SortQuery),
    responses(
        (status = 200, description = "Movies with rating statistics", body = [MovieInfoResponse]),
        (status = 400, description = "Unknown sort key or direction")
    ),
    tag = "movies"
)]
#[instrument(skip_all)]
pub async fn list_movies_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SortQuery>, QueryRejection>,
) -> Result<Reply<Vec<MovieInfoResponse>>, ApiError> {
    let Query(query) = query?;
    let list = state
        .catalog
        .list_movies(query.sort_by.as_deref(), query.direction.as_deref())
        .await?;
    Ok(Reply::ok("Movies", infos(list)))
}

/// List every movie, sorted by the key and direction given in the path.
#[utoipa::path(
    get,
    path = "/movies/sort/{by}/{direction}",
    params(
        ("by" = String, Path, description = "name, date or rating"),
        ("direction" = String, Path, description = "asc or desc")
    ),
    responses(
        (status = 200, description = "Movies with rating statistics", body = [MovieInfoResponse]),
        (status = 400, description = "Unknown sort key or direction")
    ),
    tag = "movies"
)]
#[instrument(skip(state))]
pub async fn list_movies_sorted_handler(
    State(state): State<Arc<AppState>>,
    Path((by, direction)): Path<(String, String)>,
) -> Result<Reply<Vec<MovieInfoResponse>>, ApiError> {
    let list = state.catalog.list_movies(Some(&by), Some(&direction)).await?;
    Ok(Reply::ok("Movies", infos(list)))
}

/// One movie with its rating statistics.
#[utoipa::path(
    get,
    path = "/movies/{id}",
    params(("id" = String, Path, description = "Movie id")),
    responses(
        (status = 200, description = "The movie", body = MovieInfoResponse),
        (status = 404, description = "Unknown or malformed id")
    ),
    tag = "movies"
)]
#[instrument(skip(state))]
pub async fn movie_info_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Reply<MovieInfoResponse>, ApiError> {
    let info = state.catalog.movie_info(&id).await?;
    Ok(Reply::ok("Movie", info.into()))
}

/// Reviews of one movie, most recent first.
#[utoipa::path(
    get,
    path = "/movies/{id}/reviews",
    params(("id" = String, Path, description = "Movie id")),
    responses(
        (status = 200, description = "Reviews of the movie", body = [ReviewResponse]),
        (status = 404, description = "Unknown or malformed id")
    ),
    tag = "movies"
)]
#[instrument(skip(state))]
pub async fn list_reviews_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Reply<Vec<ReviewResponse>>, ApiError> {
    let reviews = state.catalog.list_reviews(&id).await?;
    Ok(Reply::ok(
        "Reviews",
        reviews.into_iter().map(ReviewResponse::from).collect(),
    ))
}

/// Movies the current user has watched, most recent first.
#[utoipa::path(
    get,
    path = "/movies/watched",
    responses(
        (status = 200, description = "Watched marks of the current user", body = [WatchedResponse]),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    tag = "movies"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_watched_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Reply<Vec<WatchedResponse>>, ApiError> {
    let entries = state.catalog.list_watched(&user).await?;
    Ok(Reply::ok(
        "Watched movies",
        entries.into_iter().map(WatchedResponse::from).collect(),
    ))
}

//=========================================================================================
// Mutating Handlers
//=========================================================================================

/// Add a movie owned by the current user.
#[utoipa::path(
    post,
    path = "/movies",
    request_body = MovieRequest,
    responses(
        (status = 201, description = "Movie created", body = MovieResponse),
        (status = 400, description = "Empty title or description"),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    tag = "movies"
)]
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add_movie_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<MovieRequest>, JsonRejection>,
) -> Result<Reply<MovieResponse>, ApiError> {
    let Json(req) = payload?;
    let draft = MovieDraft::new(req.title, req.description, req.release_date);
    let movie = state.catalog.add_movie(&user, draft).await?;
    Ok(Reply::created("Movie added", movie.into()))
}

/// Change title, description or release date. Owner only.
#[utoipa::path(
    patch,
    path = "/movies/{id}",
    params(("id" = String, Path, description = "Movie id")),
    request_body = MoviePatchRequest,
    responses(
        (status = 200, description = "Movie updated", body = MovieResponse),
        (status = 400, description = "Invalid or immutable field"),
        (status = 403, description = "Movie is not owned by current user"),
        (status = 404, description = "Unknown or malformed id")
    ),
    tag = "movies"
)]
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_movie_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<MoviePatchRequest>, JsonRejection>,
) -> Result<Reply<MovieResponse>, ApiError> {
    let Json(req) = payload?;
    let patch = MoviePatch {
        title: req.title,
        description: req.description,
        release_date: req.release_date,
        id: req.id,
        added_by: req.added_by,
    };
    let movie = state.catalog.update_movie(&user, &id, patch).await?;
    Ok(Reply::ok("Movie updated", movie.into()))
}

/// Delete a movie with its watched marks and reviews. Owner only.
#[utoipa::path(
    delete,
    path = "/movies/{id}",
    params(("id" = String, Path, description = "Movie id")),
    responses(
        (status = 200, description = "Movie deleted"),
        (status = 403, description = "Movie is not owned by current user"),
        (status = 404, description = "Unknown or malformed id")
    ),
    tag = "movies"
)]
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_movie_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Reply<String>, ApiError> {
    state.catalog.delete_movie(&user, &id).await?;
    Ok(Reply::ok("Movie deleted", id))
}

/// Upload the cover image as the multipart field `cover`. Owner only.
#[utoipa::path(
    put,
    path = "/movies/{id}/cover",
    params(("id" = String, Path, description = "Movie id")),
    request_body(content_type = "multipart/form-data", description = "Field `cover` holding the image."),
    responses(
        (status = 200, description = "Cover stored", body = MovieResponse),
        (status = 400, description = "Missing or empty `cover` field"),
        (status = 403, description = "Movie is not owned by current user"),
        (status = 404, description = "Unknown or malformed id")
    ),
    tag = "movies"
)]
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn upload_cover_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Reply<MovieResponse>, ApiError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("cover") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let image = field.bytes().await?.to_vec();
        let movie = state
            .catalog
            .upload_cover(&user, &id, image, &content_type)
            .await?;
        return Ok(Reply::ok("Cover uploaded", movie.into()));
    }
    Err(ApiError::BadRequest(
        "Multipart form must include a 'cover' field".to_string(),
    ))
}

/// Mark the movie watched by the current user. Repeating the call refreshes the mark.
#[utoipa::path(
    post,
    path = "/movies/{id}/watch",
    params(("id" = String, Path, description = "Movie id")),
    responses(
        (status = 200, description = "Watched mark stored", body = WatchedResponse),
        (status = 404, description = "Unknown or malformed id")
    ),
    tag = "movies"
)]
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn watch_movie_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Reply<WatchedResponse>, ApiError> {
    let entry = state.catalog.watch_movie(&user, &id).await?;
    Ok(Reply::ok("Movie marked as watched", entry.into()))
}

/// Rate and review a watched movie. A second review replaces the first.
#[utoipa::path(
    post,
    path = "/movies/{id}/reviews",
    params(("id" = String, Path, description = "Movie id")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review stored", body = ReviewResponse),
        (status = 400, description = "Rating outside 1..=5"),
        (status = 403, description = "User hasn't watched the movie yet"),
        (status = 404, description = "Unknown or malformed id")
    ),
    tag = "movies"
)]
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn review_movie_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Reply<ReviewResponse>, ApiError> {
    let Json(req) = payload?;
    let entry = state
        .catalog
        .review_movie(&user, &id, req.rating, &req.review)
        .await?;
    Ok(Reply::ok("Movie reviewed", entry.into()))
}
