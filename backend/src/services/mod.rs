//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories and the token service.

pub mod auth;
pub mod session;
pub mod teacher;
pub mod user;

pub use auth::AuthService;
pub use session::{SessionError, SessionService};
pub use teacher::TeacherService;
pub use user::UserService;
