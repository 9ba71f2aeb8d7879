//! Authentication and authorization
//!
//! JWT issuance and verification, bearer-token identity resolution,
//! argon2 password hashing, and ownership-based access decisions.

pub mod access;
mod jwt;
mod middleware;
mod password;
mod resolver;

pub use access::{authorize, ensure_owner, require_admin, Decision};
pub use jwt::{Claims, JwtService};
pub use middleware::AuthUser;
pub use password::PasswordService;
pub use resolver::{bearer_token, IdentityResolver, UNAUTHORIZED_MESSAGE};
