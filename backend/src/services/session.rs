//! Session service: session CRUD and the participation state machine
//!
//! Enroll and withdraw check the roster, then write a single membership
//! row. Checks are serialized per session with an async mutex in this
//! process. The write itself never rewrites other members, so a concurrent
//! writer elsewhere is reported as a duplicate or missing member rather
//! than overwritten.

use crate::error::ApiError;
use crate::repositories::{NewSession, SessionRecord, SessionRepository, UserRepository};
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

/// Session operation failures
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session {0} not found")]
    SessionNotFound(i64),

    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("User {user_id} already participates in session {session_id}")]
    AlreadyEnrolled { session_id: i64, user_id: i64 },

    #[error("User {user_id} does not participate in session {session_id}")]
    NotEnrolled { session_id: i64, user_id: i64 },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::SessionNotFound(_) | SessionError::UserNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            SessionError::AlreadyEnrolled { .. } | SessionError::NotEnrolled { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            SessionError::Storage(e) => ApiError::Internal(e),
        }
    }
}

/// One mutex per existing session id
///
/// Entries are only created for sessions that were found in storage and
/// are dropped when the session is deleted.
#[derive(Clone, Default)]
pub struct RosterLocks {
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl RosterLocks {
    fn lock_for(&self, session_id: i64) -> Arc<Mutex<()>> {
        self.locks.entry(session_id).or_default().clone()
    }

    fn forget(&self, session_id: i64) {
        self.locks.remove(&session_id);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}

/// Drop repeated ids, keeping the first occurrence
fn dedupe_roster(users: Vec<i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    users.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Session roster manager
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
    users: Arc<dyn UserRepository>,
    locks: RosterLocks,
}

impl SessionService {
    pub fn new(sessions: Arc<dyn SessionRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self {
            sessions,
            users,
            locks: RosterLocks::default(),
        }
    }

    pub async fn create(&self, mut session: NewSession) -> Result<SessionRecord, SessionError> {
        session.users = dedupe_roster(session.users);
        let created = self.sessions.create(session).await?;
        info!(session_id = created.id, "Session created");
        Ok(created)
    }

    pub async fn find_all(&self) -> Result<Vec<SessionRecord>, SessionError> {
        Ok(self.sessions.find_all().await?)
    }

    /// Look up a session; absence is not an error
    pub async fn get_by_id(&self, id: i64) -> Result<Option<SessionRecord>, SessionError> {
        Ok(self.sessions.find_by_id(id).await?)
    }

    /// Overwrite the session stored under `id`, roster included
    pub async fn update(
        &self,
        id: i64,
        session: NewSession,
    ) -> Result<SessionRecord, SessionError> {
        let _guard = self.lock_existing(id).await?;
        self.load_locked(id).await?;

        let now = Utc::now();
        let record = SessionRecord {
            id,
            name: session.name,
            date: session.date,
            description: session.description,
            teacher_id: session.teacher_id,
            users: dedupe_roster(session.users),
            created_at: now,
            updated_at: now,
        };

        let saved = self.sessions.save(&record).await?;
        info!(session_id = id, "Session updated");
        Ok(saved)
    }

    pub async fn delete(&self, id: i64) -> Result<(), SessionError> {
        {
            let lock = self.locks.lock_for(id);
            let _guard = lock.lock().await;
            self.sessions.delete_by_id(id).await?;
        }
        self.locks.forget(id);
        info!(session_id = id, "Session deleted");
        Ok(())
    }

    /// Take the roster lock of a session that exists in storage
    ///
    /// Unknown ids fail before any lock entry is created.
    async fn lock_existing(&self, session_id: i64) -> Result<OwnedMutexGuard<()>, SessionError> {
        if self.sessions.find_by_id(session_id).await?.is_none() {
            return Err(SessionError::SessionNotFound(session_id));
        }
        Ok(self.locks.lock_for(session_id).lock_owned().await)
    }

    /// Load a session while holding its lock
    ///
    /// A session deleted since [`Self::lock_existing`] loses its entry again.
    async fn load_locked(&self, session_id: i64) -> Result<SessionRecord, SessionError> {
        match self.sessions.find_by_id(session_id).await? {
            Some(session) => Ok(session),
            None => {
                self.locks.forget(session_id);
                Err(SessionError::SessionNotFound(session_id))
            }
        }
    }

    /// Explain a failed roster write by what disappeared meanwhile
    async fn classify_write_failure(
        &self,
        session_id: i64,
        user_id: i64,
        cause: anyhow::Error,
    ) -> SessionError {
        match self.sessions.find_by_id(session_id).await {
            Ok(None) => {
                self.locks.forget(session_id);
                return SessionError::SessionNotFound(session_id);
            }
            Err(e) => return SessionError::Storage(e),
            Ok(Some(_)) => {}
        }
        match self.users.find_by_id(user_id).await {
            Ok(None) => SessionError::UserNotFound(user_id),
            Ok(Some(_)) => SessionError::Storage(cause),
            Err(e) => SessionError::Storage(e),
        }
    }

    /// Enroll a user in a session
    ///
    /// Fails with `SessionNotFound`/`UserNotFound` if either is missing and
    /// with `AlreadyEnrolled` if the user is on the roster. Nothing is
    /// written on failure.
    pub async fn participate(&self, session_id: i64, user_id: i64) -> Result<(), SessionError> {
        let _guard = self.lock_existing(session_id).await?;

        let session = self.load_locked(session_id).await?;
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(SessionError::UserNotFound(user_id));
        }
        if session.is_enrolled(user_id) {
            debug!(session_id, user_id, "Rejected duplicate enrollment");
            return Err(SessionError::AlreadyEnrolled {
                session_id,
                user_id,
            });
        }

        let added = match self.sessions.add_participant(session_id, user_id).await {
            Ok(added) => added,
            Err(e) => return Err(self.classify_write_failure(session_id, user_id, e).await),
        };
        // Another process got there first
        if !added {
            return Err(SessionError::AlreadyEnrolled {
                session_id,
                user_id,
            });
        }

        info!(session_id, user_id, "User enrolled in session");
        Ok(())
    }

    /// Withdraw a user from a session
    ///
    /// Fails with `SessionNotFound` if the session is missing and with
    /// `NotEnrolled` if the user is not on the roster. Nothing is written
    /// on failure.
    pub async fn no_longer_participate(
        &self,
        session_id: i64,
        user_id: i64,
    ) -> Result<(), SessionError> {
        let _guard = self.lock_existing(session_id).await?;

        let session = self.load_locked(session_id).await?;
        if !session.is_enrolled(user_id) {
            debug!(session_id, user_id, "Rejected withdrawal of non-member");
            return Err(SessionError::NotEnrolled {
                session_id,
                user_id,
            });
        }

        let removed = match self.sessions.remove_participant(session_id, user_id).await {
            Ok(removed) => removed,
            Err(e) => return Err(self.classify_write_failure(session_id, user_id, e).await),
        };
        if !removed {
            return Err(SessionError::NotEnrolled {
                session_id,
                user_id,
            });
        }

        info!(session_id, user_id, "User withdrawn from session");
        Ok(())
    }
}
