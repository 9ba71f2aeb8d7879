//! User account routes

use crate::auth::{ensure_owner, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use yoga_studio_shared::types::UserDto;
use yoga_studio_shared::validation::parse_id;

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/:id", get(find_by_id).delete(delete))
}

/// GET /api/user/:id
async fn find_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<UserDto>> {
    let id = parse_id(&id).map_err(ApiError::BadRequest)?;
    let user = UserService::get(state.repos.users.as_ref(), id).await?;
    Ok(Json(user.to_dto()))
}

/// DELETE /api/user/:id
///
/// Only the account owner may delete it.
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id).map_err(ApiError::BadRequest)?;
    let user = UserService::get(state.repos.users.as_ref(), id).await?;
    ensure_owner(&auth.principal, user.id)?;

    UserService::delete(state.repos.users.as_ref(), user.id).await
}
