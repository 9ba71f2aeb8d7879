//! Session routes: CRUD for administrators and self-service enrollment

use crate::auth::{ensure_owner, require_admin, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::extract::JsonBody;
use crate::repositories::NewSession;
use crate::services::{TeacherService, UserService};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use validator::Validate;
use yoga_studio_shared::types::SessionDto;
use yoga_studio_shared::validation::{describe_errors, parse_id};

/// Create session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(find_all).post(create))
        .route("/:id", get(find_by_id).put(update).delete(delete))
        .route(
            "/:id/participate/:user_id",
            post(participate).delete(no_longer_participate),
        )
}

fn path_id(raw: &str) -> ApiResult<i64> {
    parse_id(raw).map_err(ApiError::BadRequest)
}

/// Validate a submitted session and resolve its references
///
/// The teacher must exist. Roster ids that match no user are dropped.
async fn prepare(state: &AppState, dto: SessionDto) -> ApiResult<NewSession> {
    dto.validate()
        .map_err(|e| ApiError::Validation(describe_errors(&e)))?;

    if TeacherService::find_by_id(state.repos.teachers.as_ref(), dto.teacher_id)
        .await?
        .is_none()
    {
        return Err(ApiError::BadRequest(format!(
            "Teacher {} not found",
            dto.teacher_id
        )));
    }

    let mut session = NewSession::from(dto);
    let mut known = Vec::with_capacity(session.users.len());
    for user_id in session.users {
        if UserService::find_by_id(state.repos.users.as_ref(), user_id)
            .await?
            .is_some()
        {
            known.push(user_id);
        }
    }
    session.users = known;
    Ok(session)
}

async fn ensure_session_exists(state: &AppState, id: i64) -> ApiResult<()> {
    match state.sessions.get_by_id(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound(format!("Session {} not found", id))),
    }
}

/// GET /api/session
async fn find_all(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<Vec<SessionDto>>> {
    let sessions = state.sessions.find_all().await?;
    Ok(Json(sessions.iter().map(|s| s.to_dto()).collect()))
}

/// GET /api/session/:id
async fn find_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionDto>> {
    let id = path_id(&id)?;
    let session = state
        .sessions
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session {} not found", id)))?;
    Ok(Json(session.to_dto()))
}

/// POST /api/session (admin)
async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(dto): JsonBody<SessionDto>,
) -> ApiResult<Json<SessionDto>> {
    require_admin(&auth.principal)?;
    let session = prepare(&state, dto).await?;
    let created = state.sessions.create(session).await?;
    Ok(Json(created.to_dto()))
}

/// PUT /api/session/:id (admin)
async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(dto): JsonBody<SessionDto>,
) -> ApiResult<Json<SessionDto>> {
    let id = path_id(&id)?;
    require_admin(&auth.principal)?;
    ensure_session_exists(&state, id).await?;

    let session = prepare(&state, dto).await?;
    let updated = state.sessions.update(id, session).await?;
    Ok(Json(updated.to_dto()))
}

/// DELETE /api/session/:id (admin)
async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = path_id(&id)?;
    require_admin(&auth.principal)?;
    ensure_session_exists(&state, id).await?;

    state.sessions.delete(id).await?;
    Ok(())
}

/// POST /api/session/:id/participate/:user_id
async fn participate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<()> {
    let id = path_id(&id)?;
    let user_id = path_id(&user_id)?;
    ensure_owner(&auth.principal, user_id)?;

    state.sessions.participate(id, user_id).await?;
    Ok(())
}

/// DELETE /api/session/:id/participate/:user_id
async fn no_longer_participate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<()> {
    let id = path_id(&id)?;
    let user_id = path_id(&user_id)?;
    ensure_owner(&auth.principal, user_id)?;

    state.sessions.no_longer_participate(id, user_id).await?;
    Ok(())
}
