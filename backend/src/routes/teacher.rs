//! Teacher directory routes

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::services::TeacherService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use yoga_studio_shared::types::TeacherDto;
use yoga_studio_shared::validation::parse_id;

pub fn teacher_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(find_all))
        .route("/:id", get(find_by_id))
}

/// GET /api/teacher
async fn find_all(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<Vec<TeacherDto>>> {
    let teachers = TeacherService::find_all(state.repos.teachers.as_ref()).await?;
    Ok(Json(teachers.iter().map(|t| t.to_dto()).collect()))
}

/// GET /api/teacher/:id
async fn find_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<TeacherDto>> {
    let id = parse_id(&id).map_err(ApiError::BadRequest)?;
    let teacher = TeacherService::find_by_id(state.repos.teachers.as_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Teacher {} not found", id)))?;
    Ok(Json(teacher.to_dto()))
}
