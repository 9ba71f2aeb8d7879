//! In-memory repository adapter
//!
//! Backs all three repository traits with one set of tables behind a
//! `tokio::sync::RwLock`, enforcing the same constraints as the PostgreSQL
//! schema (unique emails, existing teachers and users, cascading deletes).
//! Used by tests and by `storage.backend = "memory"`.

use super::{
    NewSession, NewUser, SessionRecord, SessionRepository, TeacherRecord, TeacherRepository,
    UserRecord, UserRepository,
};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Email of the administrator account created by [`MemoryStore::seed`]
pub const SEED_ADMIN_EMAIL: &str = "yoga@studio.com";

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, UserRecord>,
    teachers: BTreeMap<i64, TeacherRecord>,
    sessions: BTreeMap<i64, SessionRecord>,
    last_user_id: i64,
    last_teacher_id: i64,
    last_session_id: i64,
}

impl Tables {
    fn check_references(&self, teacher_id: i64, users: &[i64]) -> Result<()> {
        if !self.teachers.contains_key(&teacher_id) {
            bail!("Teacher {} does not exist", teacher_id);
        }
        if let Some(missing) = users.iter().find(|id| !self.users.contains_key(*id)) {
            bail!("User {} does not exist", missing);
        }
        Ok(())
    }
}

/// Process-local storage shared by clones
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a teacher to the directory
    pub async fn add_teacher(&self, first_name: &str, last_name: &str) -> TeacherRecord {
        let mut tables = self.tables.write().await;
        tables.last_teacher_id += 1;
        let now = Utc::now();
        let teacher = TeacherRecord {
            id: tables.last_teacher_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.teachers.insert(teacher.id, teacher.clone());
        teacher
    }

    /// Load the studio's default data: two teachers and the admin account
    pub async fn seed(&self, admin_password_hash: String) -> Result<()> {
        self.add_teacher("Margot", "DELAHAYE").await;
        self.add_teacher("Hélène", "THIERCELIN").await;
        UserRepository::create(self, NewUser {
            email: SEED_ADMIN_EMAIL.to_string(),
            first_name: "Admin".to_string(),
            last_name: "Admin".to_string(),
            password_hash: admin_password_hash,
            admin: true,
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().any(|u| u.email == email))
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            bail!("Email {} already exists", user.email);
        }

        tables.last_user_id += 1;
        let now = Utc::now();
        let record = UserRecord {
            id: tables.last_user_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            password_hash: user.password_hash,
            admin: user.admin,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_some() {
            for session in tables.sessions.values_mut() {
                session.users.retain(|user_id| *user_id != id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TeacherRepository for MemoryStore {
    async fn find_all(&self) -> Result<Vec<TeacherRecord>> {
        Ok(self.tables.read().await.teachers.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<TeacherRecord>> {
        Ok(self.tables.read().await.teachers.get(&id).cloned())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn find_all(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.tables.read().await.sessions.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<SessionRecord>> {
        Ok(self.tables.read().await.sessions.get(&id).cloned())
    }

    async fn create(&self, session: NewSession) -> Result<SessionRecord> {
        let mut tables = self.tables.write().await;
        tables.check_references(session.teacher_id, &session.users)?;

        tables.last_session_id += 1;
        let now = Utc::now();
        let record = SessionRecord {
            id: tables.last_session_id,
            name: session.name,
            date: session.date,
            description: session.description,
            teacher_id: session.teacher_id,
            users: session.users,
            created_at: now,
            updated_at: now,
        };
        tables.sessions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn save(&self, session: &SessionRecord) -> Result<SessionRecord> {
        let mut tables = self.tables.write().await;
        tables.check_references(session.teacher_id, &session.users)?;

        let Some(stored) = tables.sessions.get_mut(&session.id) else {
            bail!("Session {} does not exist", session.id);
        };
        *stored = SessionRecord {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..session.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.tables.write().await.sessions.remove(&id);
        Ok(())
    }

    async fn add_participant(&self, session_id: i64, user_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            bail!("User {} does not exist", user_id);
        }
        let Some(session) = tables.sessions.get_mut(&session_id) else {
            bail!("Session {} does not exist", session_id);
        };

        if session.is_enrolled(user_id) {
            return Ok(false);
        }
        session.users.push(user_id);
        session.updated_at = Utc::now();
        Ok(true)
    }

    async fn remove_participant(&self, session_id: i64, user_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(session) = tables.sessions.get_mut(&session_id) else {
            bail!("Session {} does not exist", session_id);
        };

        if !session.is_enrolled(user_id) {
            return Ok(false);
        }
        session.users.retain(|id| *id != user_id);
        session.updated_at = Utc::now();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            first_name: "User".to_string(),
            last_name: "USER".to_string(),
            password_hash: "hash".to_string(),
            admin: false,
        }
    }

    fn new_session(teacher_id: i64, users: Vec<i64>) -> NewSession {
        NewSession {
            name: "Session 1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 9, 15).unwrap(),
            description: "description 1".to_string(),
            teacher_id,
            users,
        }
    }

    #[tokio::test]
    async fn test_user_ids_are_sequential_and_emails_unique() {
        let store = MemoryStore::new();
        let first = UserRepository::create(&store, new_user("user1@mail.com")).await.unwrap();
        let second = UserRepository::create(&store, new_user("user2@mail.com")).await.unwrap();

        assert_eq!((first.id, second.id), (1, 2));
        assert!(UserRepository::create(&store, new_user("user1@mail.com")).await.is_err());
        assert!(store.exists_by_email("user2@mail.com").await.unwrap());
        assert!(!store.exists_by_email("other@mail.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_session_requires_existing_teacher_and_users() {
        let store = MemoryStore::new();
        let teacher = store.add_teacher("Toto", "TOTO").await;

        assert!(SessionRepository::create(&store, new_session(99, vec![])).await.is_err());
        assert!(SessionRepository::create(&store, new_session(teacher.id, vec![5])).await.is_err());
        assert!(SessionRepository::create(&store, new_session(teacher.id, vec![])).await.is_ok());
    }

    #[tokio::test]
    async fn test_save_keeps_created_at_and_rejects_unknown_session() {
        let store = MemoryStore::new();
        let teacher = store.add_teacher("Toto", "TOTO").await;
        let user = UserRepository::create(&store, new_user("user1@mail.com")).await.unwrap();
        let session = SessionRepository::create(&store, new_session(teacher.id, vec![]))
            .await
            .unwrap();

        let mut changed = session.clone();
        changed.users.push(user.id);
        changed.description = "New description".to_string();
        let saved = store.save(&changed).await.unwrap();

        assert_eq!(saved.users, vec![user.id]);
        assert_eq!(saved.description, "New description");
        assert_eq!(saved.created_at, session.created_at);

        changed.id = 42;
        assert!(store.save(&changed).await.is_err());
    }

    #[tokio::test]
    async fn test_deleting_user_removes_roster_membership() {
        let store = MemoryStore::new();
        let teacher = store.add_teacher("Toto", "TOTO").await;
        let first = UserRepository::create(&store, new_user("user1@mail.com")).await.unwrap();
        let second = UserRepository::create(&store, new_user("user2@mail.com")).await.unwrap();
        let session =
            SessionRepository::create(&store, new_session(teacher.id, vec![first.id, second.id]))
                .await
                .unwrap();

        UserRepository::delete_by_id(&store, first.id).await.unwrap();

        let session = SessionRepository::find_by_id(&store, session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.users, vec![second.id]);
    }

    #[tokio::test]
    async fn test_single_participant_writes() {
        let store = MemoryStore::new();
        let teacher = store.add_teacher("Toto", "TOTO").await;
        let first = UserRepository::create(&store, new_user("user1@mail.com")).await.unwrap();
        let second = UserRepository::create(&store, new_user("user2@mail.com")).await.unwrap();
        let session = SessionRepository::create(&store, new_session(teacher.id, vec![first.id]))
            .await
            .unwrap();

        assert!(store.add_participant(session.id, second.id).await.unwrap());
        assert!(!store.add_participant(session.id, second.id).await.unwrap());
        assert!(store.add_participant(session.id, 99).await.is_err());
        assert!(store.add_participant(99, first.id).await.is_err());

        assert!(store.remove_participant(session.id, first.id).await.unwrap());
        assert!(!store.remove_participant(session.id, first.id).await.unwrap());
        assert!(store.remove_participant(99, first.id).await.is_err());

        let session = SessionRepository::find_by_id(&store, session.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.users, vec![second.id]);
    }

    #[tokio::test]
    async fn test_seed_creates_teachers_and_admin() {
        let store = MemoryStore::new();
        store.seed("hash".to_string()).await.unwrap();

        assert_eq!(TeacherRepository::find_all(&store).await.unwrap().len(), 2);
        let admin = store.find_by_email(SEED_ADMIN_EMAIL).await.unwrap().unwrap();
        assert!(admin.admin);
    }
}
