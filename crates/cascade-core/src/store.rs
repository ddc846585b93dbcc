//! The `ParameterStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `cascade-store-sqlite`).
//! Each method is one round trip to the backend and is atomic on its own; no
//! two calls compose into a transaction.

use std::future::Future;

use crate::parameter::{NewParameter, Parameter};

/// Abstraction over the persistent parameter table keyed by `(org_id, path)`.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ParameterStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the parameters of `org_id` whose path is one of `paths`.
  ///
  /// Missing keys are simply absent from the result; the order of the
  /// returned rows is unspecified.
  fn find_by_keys<'a>(
    &'a self,
    org_id: &'a str,
    paths: &'a [String],
  ) -> impl Future<Output = Result<Vec<Parameter>, Self::Error>> + Send + 'a;

  /// Return every parameter of `org_id` whose path matches `pattern`.
  ///
  /// The first `*` in `pattern` matches any run of characters; everything else
  /// in the pattern is matched literally and case-sensitively.
  fn find_by_pattern<'a>(
    &'a self,
    org_id: &'a str,
    pattern: &'a str,
  ) -> impl Future<Output = Result<Vec<Parameter>, Self::Error>> + Send + 'a;

  /// Insert new rows or replace `value` and `updated_at` of existing ones.
  /// Returns the stored representations, in input order.
  fn upsert_many(
    &self,
    parameters: Vec<NewParameter>,
  ) -> impl Future<Output = Result<Vec<Parameter>, Self::Error>> + Send + '_;

  /// Remove the parameters of `org_id` whose path is one of `paths`.
  /// Returns the number of rows actually removed.
  fn delete_by_keys<'a>(
    &'a self,
    org_id: &'a str,
    paths: &'a [String],
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}
