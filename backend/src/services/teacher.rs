//! Teacher directory (read only)

use crate::error::ApiError;
use crate::repositories::{TeacherRecord, TeacherRepository};

pub struct TeacherService;

impl TeacherService {
    pub async fn find_all(teachers: &dyn TeacherRepository) -> Result<Vec<TeacherRecord>, ApiError> {
        teachers.find_all().await.map_err(ApiError::Internal)
    }

    pub async fn find_by_id(
        teachers: &dyn TeacherRepository,
        id: i64,
    ) -> Result<Option<TeacherRecord>, ApiError> {
        teachers.find_by_id(id).await.map_err(ApiError::Internal)
    }
}
