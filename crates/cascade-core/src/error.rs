//! Error types for `cascade-core`.
//!
//! Every failure the service can report falls into one of the closed
//! [`ErrorKind`]s; transports map a kind to their own status codes.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("parameter not found: {0}")]
  NotFound(String),

  #[error("parameter already exists: {0}")]
  AlreadyExists(String),

  #[error("unauthenticated: {0}")]
  Unauthenticated(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a backend error raised by a [`ParameterStore`](crate::store::ParameterStore).
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  /// The closed failure kind this error belongs to.
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
      Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
      Self::Store(_) | Self::Serialization(_) => ErrorKind::Internal,
    }
  }
}

/// The closed set of failure kinds, each with a stable wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  InvalidArgument,
  NotFound,
  AlreadyExists,
  Unauthenticated,
  Internal,
}

impl ErrorKind {
  pub fn code(self) -> &'static str {
    match self {
      Self::InvalidArgument => "invalid-argument",
      Self::NotFound => "not-found",
      Self::AlreadyExists => "already-exists",
      Self::Unauthenticated => "unauthenticated",
      Self::Internal => "internal",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
