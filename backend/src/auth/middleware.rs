//! Authentication extractor
//!
//! Resolves the bearer token of a request into a [`Principal`] using the
//! identity resolver held in AppState.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{FromRef, OriginalUri},
    http::{header::AUTHORIZATION, request::Parts},
};
use yoga_studio_shared::Principal;

use super::resolver::bearer_token;

/// Authenticated principal extracted from the JWT
///
/// Handlers that take this extractor reject anonymous requests with the
/// uniform 401 body.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal: Principal,
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // Nested routers see a stripped uri
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let principal = app_state
            .identity()
            .resolve(bearer_token(header), &path)?;

        Ok(AuthUser { principal })
    }
}
