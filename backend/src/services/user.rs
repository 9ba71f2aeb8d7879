//! User account lookup and deletion

use crate::error::ApiError;
use crate::repositories::{UserRecord, UserRepository};
use tracing::info;

pub struct UserService;

impl UserService {
    pub async fn find_by_id(
        users: &dyn UserRepository,
        id: i64,
    ) -> Result<Option<UserRecord>, ApiError> {
        users.find_by_id(id).await.map_err(ApiError::Internal)
    }

    /// Fetch a user that must exist
    pub async fn get(users: &dyn UserRepository, id: i64) -> Result<UserRecord, ApiError> {
        Self::find_by_id(users, id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))
    }

    /// Delete a user account; the account's enrollments go with it
    pub async fn delete(users: &dyn UserRepository, id: i64) -> Result<(), ApiError> {
        users.delete_by_id(id).await.map_err(ApiError::Internal)?;
        info!(user_id = id, "User deleted");
        Ok(())
    }
}
