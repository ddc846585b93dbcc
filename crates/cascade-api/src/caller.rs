//! The [`Caller`] extractor, which hands the authenticated caller to handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use cascade_core::CallerContext;

use crate::ApiError;

/// The caller of the current request.
///
/// Present only when an upstream layer attached a [`CallerContext`] to the
/// request extensions; otherwise the request is rejected as unauthenticated.
pub struct Caller(pub CallerContext);

impl<S> FromRequestParts<S> for Caller
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<CallerContext>()
      .cloned()
      .map(Caller)
      .ok_or_else(|| ApiError::unauthenticated("no authenticated caller"))
  }
}
