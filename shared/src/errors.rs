//! Error types for the Yoga Studio application

use thiserror::Error;

/// Authentication error types
///
/// The variants exist for logging. Clients always see the same
/// unauthorized response regardless of which one occurred.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Missing token")]
    MissingToken,
}
