//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use cascade_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub cascade_core::Error);

impl ApiError {
  pub fn unauthenticated(message: impl Into<String>) -> Self {
    Self(cascade_core::Error::Unauthenticated(message.into()))
  }

  pub fn kind(&self) -> ErrorKind { self.0.kind() }
}

/// HTTP status carrying each error kind.
pub fn status_of(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
    ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::AlreadyExists => StatusCode::CONFLICT,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    if kind == ErrorKind::Internal {
      tracing::error!(error = %self.0, "request failed");
    } else {
      tracing::debug!(code = kind.code(), error = %self.0, "request rejected");
    }

    let message = match kind {
      ErrorKind::Internal => "internal error".to_owned(),
      _ => self.0.to_string(),
    };
    (status_of(kind), Json(json!({ "code": kind.code(), "message": message }))).into_response()
  }
}
