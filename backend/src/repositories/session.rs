//! Session repository for database operations
//!
//! A session's roster is stored as `participate` rows. Row ids record
//! enrollment order, so rosters are always read back `ORDER BY id`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use yoga_studio_shared::SessionDto;

/// Session record, roster included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    pub description: String,
    pub teacher_id: i64,
    /// Enrolled user ids in enrollment order, without duplicates
    pub users: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_enrolled(&self, user_id: i64) -> bool {
        self.users.contains(&user_id)
    }

    pub fn to_dto(&self) -> SessionDto {
        SessionDto {
            id: Some(self.id),
            name: self.name.clone(),
            date: self.date,
            teacher_id: self.teacher_id,
            description: self.description.clone(),
            users: self.users.clone(),
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }
}

/// Input for creating or overwriting a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub name: String,
    pub date: NaiveDate,
    pub description: String,
    pub teacher_id: i64,
    pub users: Vec<i64>,
}

impl From<SessionDto> for NewSession {
    fn from(dto: SessionDto) -> Self {
        Self {
            name: dto.name,
            date: dto.date,
            description: dto.description,
            teacher_id: dto.teacher_id,
            users: dto.users,
        }
    }
}

/// Session persistence
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// All sessions in id order
    async fn find_all(&self) -> Result<Vec<SessionRecord>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<SessionRecord>>;

    async fn create(&self, session: NewSession) -> Result<SessionRecord>;

    /// Overwrite an existing session, roster included
    ///
    /// `updated_at` is refreshed and `created_at` is kept. Fails if no
    /// session with `session.id` exists.
    async fn save(&self, session: &SessionRecord) -> Result<SessionRecord>;

    /// Delete a session and its roster. No-op if absent.
    async fn delete_by_id(&self, id: i64) -> Result<()>;

    /// Append one user to a roster
    ///
    /// Returns `false` if the user was already on it. Fails if the session
    /// or the user does not exist. Other members are never rewritten.
    async fn add_participant(&self, session_id: i64, user_id: i64) -> Result<bool>;

    /// Remove one user from a roster
    ///
    /// Returns `false` if the user was not on it. Fails if the session does
    /// not exist.
    async fn remove_participant(&self, session_id: i64, user_id: i64) -> Result<bool>;
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: i64,
    name: String,
    date: NaiveDate,
    description: String,
    teacher_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn with_users(self, users: Vec<i64>) -> SessionRecord {
        SessionRecord {
            id: self.id,
            name: self.name,
            date: self.date,
            description: self.description,
            teacher_id: self.teacher_id,
            users,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// PostgreSQL session repository
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn roster(&self, session_id: i64) -> Result<Vec<i64>> {
        let users = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT user_id FROM participate
            WHERE session_id = $1
            ORDER BY id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn replace_roster(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        session_id: i64,
        users: &[i64],
    ) -> Result<()> {
        sqlx::query("DELETE FROM participate WHERE session_id = $1")
            .bind(session_id)
            .execute(&mut **tx)
            .await?;

        // One insert per member keeps row ids in roster order
        for user_id in users {
            sqlx::query("INSERT INTO participate (session_id, user_id) VALUES ($1, $2)")
                .bind(session_id)
                .bind(user_id)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    /// Lock the session row for the rest of the transaction
    ///
    /// Concurrent roster writers and `save` on the same session queue here,
    /// across processes.
    async fn lock_session(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        session_id: i64,
    ) -> Result<()> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM sessions WHERE id = $1 FOR UPDATE")
            .bind(session_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Session {} does not exist", session_id))?;

        Ok(())
    }

    async fn touch(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        session_id: i64,
    ) -> Result<()> {
        sqlx::query("UPDATE sessions SET updated_at = NOW() WHERE id = $1")
            .bind(session_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn find_all(&self) -> Result<Vec<SessionRecord>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, name, date, description, teacher_id, created_at, updated_at
            FROM sessions
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let memberships = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT session_id, user_id FROM participate
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut rosters: HashMap<i64, Vec<i64>> = HashMap::new();
        for (session_id, user_id) in memberships {
            rosters.entry(session_id).or_default().push(user_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let users = rosters.remove(&row.id).unwrap_or_default();
                row.with_users(users)
            })
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, name, date, description, teacher_id, created_at, updated_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let users = self.roster(row.id).await?;
                Ok(Some(row.with_users(users)))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, session: NewSession) -> Result<SessionRecord> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO sessions (name, date, description, teacher_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, date, description, teacher_id, created_at, updated_at
            "#,
        )
        .bind(&session.name)
        .bind(session.date)
        .bind(&session.description)
        .bind(session.teacher_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_roster(&mut tx, row.id, &session.users).await?;
        tx.commit().await?;

        Ok(row.with_users(session.users))
    }

    async fn save(&self, session: &SessionRecord) -> Result<SessionRecord> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            UPDATE sessions SET
                name = $2,
                date = $3,
                description = $4,
                teacher_id = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, date, description, teacher_id, created_at, updated_at
            "#,
        )
        .bind(session.id)
        .bind(&session.name)
        .bind(session.date)
        .bind(&session.description)
        .bind(session.teacher_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Session {} does not exist", session.id))?;

        Self::replace_roster(&mut tx, row.id, &session.users).await?;
        tx.commit().await?;

        Ok(row.with_users(session.users.clone()))
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn add_participant(&self, session_id: i64, user_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        Self::lock_session(&mut tx, session_id).await?;

        // A missing user fails on the foreign key
        let inserted = sqlx::query(
            r#"
            INSERT INTO participate (session_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (session_id, user_id) DO NOTHING
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted {
            Self::touch(&mut tx, session_id).await?;
        }
        tx.commit().await?;

        Ok(inserted)
    }

    async fn remove_participant(&self, session_id: i64, user_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        Self::lock_session(&mut tx, session_id).await?;

        let removed = sqlx::query("DELETE FROM participate WHERE session_id = $1 AND user_id = $2")
            .bind(session_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            == 1;

        if removed {
            Self::touch(&mut tx, session_id).await?;
        }
        tx.commit().await?;

        Ok(removed)
    }
}
