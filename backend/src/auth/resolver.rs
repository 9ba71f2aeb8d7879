//! Identity resolution for bearer tokens
//!
//! Every failure, whatever its cause, is reported with the same
//! unauthorized body. The cause is only logged.

use super::JwtService;
use crate::error::ApiError;
use tracing::debug;
use yoga_studio_shared::{AuthError, Principal};

/// Message returned for every rejected token
pub const UNAUTHORIZED_MESSAGE: &str = "Full authentication is required to access this resource";

/// Extract the token from an `Authorization` header value
///
/// Returns `None` unless the value uses the `Bearer` scheme.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Recovers the authenticated principal from a raw token
#[derive(Clone)]
pub struct IdentityResolver {
    jwt: JwtService,
}

impl IdentityResolver {
    pub fn new(jwt: JwtService) -> Self {
        Self { jwt }
    }

    /// Resolve a principal, or fail with the uniform unauthorized error
    ///
    /// `raw_token` is `None` for anonymous requests.
    pub fn resolve(&self, raw_token: Option<&str>, path: &str) -> Result<Principal, ApiError> {
        self.verify(raw_token).map_err(|cause| {
            debug!(%cause, path, "Authentication failed");
            ApiError::unauthenticated(UNAUTHORIZED_MESSAGE, path)
        })
    }

    fn verify(&self, raw_token: Option<&str>) -> Result<Principal, AuthError> {
        let token = raw_token.ok_or(AuthError::MissingToken)?;
        self.jwt.verify(token)
    }
}
