//! services/api/src/web/auth.rs
//!
//! Account endpoints: registration, login and the current user.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use streaming_catalog_core::{Registration, User};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::envelope::Reply;
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub full_name: String,
    pub age: i64,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct RegisteredResponse {
    pub user_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub full_name: String,
    pub age: u8,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            age: user.age,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /users/register - Create a new user account
#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = RegisteredResponse),
        (status = 400, description = "Invalid registration data"),
        (status = 409, description = "Email is already used by another user")
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Reply<RegisteredResponse>, ApiError> {
    let Json(req) = payload?;
    let user_id = state
        .catalog
        .register(Registration {
            full_name: req.full_name,
            age: req.age,
            email: req.email,
            password: SecretString::from(req.password),
            password_confirmation: SecretString::from(req.password_confirmation),
        })
        .await?;
    Ok(Reply::created("User registered", RegisteredResponse { user_id }))
}

/// POST /users/login - Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Email and password combination is incorrect"),
        (status = 404, description = "No user with this email")
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Reply<LoginResponse>, ApiError> {
    let Json(req) = payload?;
    let password = SecretString::from(req.password);
    let (user, token) = state.catalog.login(&req.email, &password).await?;
    Ok(Reply::ok(
        "Login successful",
        LoginResponse {
            token,
            user: user.into(),
        },
    ))
}

/// GET /users/me - The user the bearer token belongs to
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    tag = "users"
)]
pub async fn me_handler(CurrentUser(user): CurrentUser) -> Reply<UserResponse> {
    Reply::ok("Current user", user.into())
}
