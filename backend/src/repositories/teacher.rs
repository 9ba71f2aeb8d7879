//! Teacher repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use yoga_studio_shared::TeacherDto;

/// Teacher record from database
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TeacherRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeacherRecord {
    pub fn to_dto(&self) -> TeacherDto {
        TeacherDto {
            id: self.id,
            last_name: self.last_name.clone(),
            first_name: self.first_name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Read access to the teacher directory
#[async_trait]
pub trait TeacherRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<TeacherRecord>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<TeacherRecord>>;
}

/// PostgreSQL teacher repository
#[derive(Clone)]
pub struct PgTeacherRepository {
    pool: PgPool,
}

impl PgTeacherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeacherRepository for PgTeacherRepository {
    async fn find_all(&self) -> Result<Vec<TeacherRecord>> {
        let teachers = sqlx::query_as::<_, TeacherRecord>(
            r#"
            SELECT id, first_name, last_name, created_at, updated_at
            FROM teachers
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(teachers)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<TeacherRecord>> {
        let teacher = sqlx::query_as::<_, TeacherRecord>(
            r#"
            SELECT id, first_name, last_name, created_at, updated_at
            FROM teachers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(teacher)
    }
}
