//! User repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use yoga_studio_shared::{Principal, Role, UserDto};

/// User record from database
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// The principal this account authenticates as
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.email.clone(), Role::from_admin_flag(self.admin))
    }

    pub fn to_dto(&self) -> UserDto {
        UserDto {
            id: self.id,
            email: self.email.clone(),
            last_name: self.last_name.clone(),
            first_name: self.first_name.clone(),
            admin: self.admin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub admin: bool,
}

/// Credential store and account persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn exists_by_email(&self, email: &str) -> Result<bool>;

    /// Persist a new user. Fails if the email is already taken.
    async fn create(&self, user: NewUser) -> Result<UserRecord>;

    /// Delete a user and their roster memberships. No-op if absent.
    async fn delete_by_id(&self, id: i64) -> Result<()>;
}

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, first_name, last_name, password AS password_hash,
                   admin, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, email, first_name, last_name, password AS password_hash,
                   admin, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (email, first_name, last_name, password, admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, first_name, last_name, password AS password_hash,
                      admin, created_at, updated_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.admin)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        // Roster rows go with the user (ON DELETE CASCADE)
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(admin: bool) -> UserRecord {
        UserRecord {
            id: 1,
            email: "user1@mail.com".to_string(),
            first_name: "User".to_string(),
            last_name: "USER".to_string(),
            password_hash: "hash".to_string(),
            admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_principal_projection() {
        let principal = record(true).principal();
        assert_eq!(principal.id, 1);
        assert_eq!(principal.username, "user1@mail.com");
        assert_eq!(principal.role, Role::Admin);
        assert_eq!(record(false).principal().role, Role::User);
    }

    #[test]
    fn test_dto_omits_password() {
        let dto = record(false).to_dto();
        let json = serde_json::to_string(&dto).unwrap();
        assert!(!json.contains("hash"));
        assert_eq!(dto.email, "user1@mail.com");
    }
}
