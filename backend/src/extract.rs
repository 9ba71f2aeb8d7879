//! Request extractors
//!
//! `JsonBody` replaces `axum::Json` for request bodies so that syntax and
//! shape errors come back as a 400 in the API error format.

use crate::error::ApiError;
use axum::extract::{rejection::JsonRejection, FromRequest};

/// JSON request body; rejections render as [`ApiError::BadRequest`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
