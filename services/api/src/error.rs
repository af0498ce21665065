//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and how it is rendered
//! to HTTP clients.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use streaming_catalog_core::CatalogError;
use tracing::error;

use crate::config::ConfigError;
use crate::web::envelope::Envelope;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error reported by a catalog workflow.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error while running the startup migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request itself could not be understood (bad JSON, missing multipart field).
    #[error("{0}")]
    BadRequest(String),

    /// The request carried no usable bearer credential.
    #[error("{0}")]
    Unauthorized(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Catalog(err) => catalog_status(err),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Migration(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

fn catalog_status(err: &CatalogError) -> StatusCode {
    match err {
        CatalogError::DuplicateEmail => StatusCode::CONFLICT,
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::InvalidCredentials
        | CatalogError::TokenInvalid
        | CatalogError::TokenExpired => StatusCode::UNAUTHORIZED,
        CatalogError::Forbidden | CatalogError::NotWatched => StatusCode::FORBIDDEN,
        CatalogError::InvalidRating(_)
        | CatalogError::InvalidQuery(_)
        | CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
        CatalogError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        CatalogError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        CatalogError::StorageFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = if status.is_server_error() {
            // Store details stay in the log, not in the response.
            error!(error = %self, "request failed");
            match &self {
                ApiError::Catalog(CatalogError::Timeout { .. }) => "Storage timed out".to_string(),
                ApiError::Catalog(CatalogError::Unavailable { .. }) => {
                    "Storage unavailable".to_string()
                }
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };
        (status, Json(Envelope::<()>::failure(status, msg))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_kinds_map_to_statuses() {
        let cases = [
            (CatalogError::DuplicateEmail, StatusCode::CONFLICT),
            (CatalogError::NotFound("movie"), StatusCode::NOT_FOUND),
            (CatalogError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (CatalogError::TokenExpired, StatusCode::UNAUTHORIZED),
            (CatalogError::Forbidden, StatusCode::FORBIDDEN),
            (CatalogError::NotWatched, StatusCode::FORBIDDEN),
            (CatalogError::InvalidRating(7), StatusCode::BAD_REQUEST),
            (CatalogError::InvalidQuery("x".into()), StatusCode::BAD_REQUEST),
            (CatalogError::Timeout { op: "movies.insert" }, StatusCode::GATEWAY_TIMEOUT),
            (CatalogError::Unavailable { op: "movies.insert" }, StatusCode::SERVICE_UNAVAILABLE),
            (
                CatalogError::StorageFailure { op: "movies.insert", message: "x".into() },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
