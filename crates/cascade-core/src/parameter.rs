//! Parameter: the single domain entity of the store.
//!
//! A parameter is identified by `(org_id, path)`. Its `value` is an opaque JSON
//! document: the store never looks inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
  pub path:       String,
  pub org_id:     String,
  pub value:      Value,
  /// Set by the store on insert.
  pub created_at: DateTime<Utc>,
  /// Set by the store on every write.
  pub updated_at: DateTime<Utc>,
}

impl Parameter {
  /// Whether this record lives under `(org_id, path)`.
  pub fn is_keyed(&self, org_id: &str, path: &str) -> bool {
    self.org_id == org_id && self.path == path
  }
}

/// Input to [`ParameterStore::upsert_many`](crate::store::ParameterStore::upsert_many).
/// Timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewParameter {
  pub path:   String,
  pub org_id: String,
  pub value:  Value,
}

impl NewParameter {
  pub fn new(org_id: impl Into<String>, path: impl Into<String>, value: Value) -> Self {
    Self { path: path.into(), org_id: org_id.into(), value }
  }
}
