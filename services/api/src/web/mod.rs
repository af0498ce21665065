pub mod auth;
pub mod envelope;
pub mod middleware;
pub mod rest;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use self::auth::{login_handler, me_handler, register_handler};
use self::rest::{
    add_movie_handler, delete_movie_handler, health_handler, list_movies_handler,
    list_movies_sorted_handler, list_reviews_handler, list_watched_handler, movie_info_handler,
    review_movie_handler, update_movie_handler, upload_cover_handler, watch_movie_handler,
};
use self::state::AppState;

pub use middleware::CurrentUser;

/// Builds the HTTP surface over a ready `AppState`.
///
/// Authentication is per handler (the `CurrentUser` extractor), so public and
/// protected routes share one router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_cover_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route("/users/register", post(register_handler))
        .route("/users/login", post(login_handler))
        .route("/users/me", get(me_handler))
        .route("/movies", get(list_movies_handler).post(add_movie_handler))
        .route("/movies/sort/{by}/{direction}", get(list_movies_sorted_handler))
        .route("/movies/watched", get(list_watched_handler))
        .route(
            "/movies/{id}",
            get(movie_info_handler)
                .patch(update_movie_handler)
                .delete(delete_movie_handler),
        )
        .route("/movies/{id}/cover", put(upload_cover_handler))
        .route("/movies/{id}/watch", post(watch_movie_handler))
        .route(
            "/movies/{id}/reviews",
            get(list_reviews_handler).post(review_movie_handler),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
