//! Database repositories
//!
//! Each entity has a repository trait with two adapters: PostgreSQL
//! (`Pg*Repository`) and the process-local [`MemoryStore`].

pub mod memory;
pub mod session;
pub mod teacher;
pub mod user;

use sqlx::PgPool;
use std::sync::Arc;

pub use memory::MemoryStore;
pub use session::{NewSession, PgSessionRepository, SessionRecord, SessionRepository};
pub use teacher::{PgTeacherRepository, TeacherRecord, TeacherRepository};
pub use user::{NewUser, PgUserRepository, UserRecord, UserRepository};

/// The repositories a running application works against
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub teachers: Arc<dyn TeacherRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl Repositories {
    /// Repositories backed by a PostgreSQL pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            teachers: Arc::new(PgTeacherRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool)),
        }
    }

    /// Repositories sharing one in-memory store
    pub fn memory(store: MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            teachers: Arc::new(store.clone()),
            sessions: Arc::new(store),
        }
    }
}
