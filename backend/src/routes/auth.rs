//! Authentication routes
//!
//! Registration and login are public; `/me` requires a bearer token.
//! Password hashing runs on the blocking thread pool.

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::services::{AuthService, UserService};
use crate::state::AppState;
use axum::{
    extract::{OriginalUri, State},
    routing::{get, post},
    Json, Router,
};
use yoga_studio_shared::types::{
    JwtResponse, LoginRequest, MessageResponse, SignupRequest, UserDto,
};

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let message = AuthService::register(state.repos.users.as_ref(), req).await?;
    Ok(Json(message))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<JwtResponse>> {
    let response =
        AuthService::login(state.repos.users.as_ref(), state.jwt(), req, uri.path()).await?;
    Ok(Json(response))
}

/// GET /api/auth/me
async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<UserDto>> {
    let user = UserService::get(state.repos.users.as_ref(), auth.principal.id).await?;
    Ok(Json(user.to_dto()))
}
