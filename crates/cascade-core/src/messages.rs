//! Request and response messages of the five parameter operations.
//!
//! These are the wire shapes: timestamps and organization ids never leave the
//! service. Every list field defaults to empty so that a missing field is
//! reported as an invalid argument by the service rather than as a framing
//! error.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::Parameter;

/// A `{path, value}` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEntry {
  pub path:  String,
  /// Omitted values are stored as an empty object.
  #[serde(default = "empty_object")]
  pub value: Value,
}

impl ParameterEntry {
  pub fn new(path: impl Into<String>, value: Value) -> Self {
    Self { path: path.into(), value }
  }
}

impl From<Parameter> for ParameterEntry {
  fn from(p: Parameter) -> Self { Self { path: p.path, value: p.value } }
}

fn empty_object() -> Value { Value::Object(Map::new()) }

/// An update entry. `value` is `None` only when the field is absent; an
/// explicit `null` is `Some(Value::Null)` and replaces the stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntry {
  pub path:  String,
  #[serde(
    default,
    deserialize_with = "present",
    skip_serializing_if = "Option::is_none"
  )]
  pub value: Option<Value>,
}

impl UpdateEntry {
  pub fn new(path: impl Into<String>, value: Value) -> Self {
    Self { path: path.into(), value: Some(value) }
  }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
  D: Deserializer<'de>,
{
  Value::deserialize(deserializer).map(Some)
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
  #[serde(default)]
  pub parameters: Vec<ParameterEntry>,
  #[serde(default)]
  pub overwrite:  bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateResponse {
  pub parameters: Vec<ParameterEntry>,
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
  #[serde(default)]
  pub parameters: Vec<UpdateEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateResponse {
  pub parameters: Vec<ParameterEntry>,
}

// ─── Retrieve ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrieveRequest {
  #[serde(default)]
  pub paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrieveResponse {
  pub parameters: Vec<ParameterEntry>,
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
  #[serde(default)]
  pub paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
  pub deleted: u64,
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {
  #[serde(default)]
  pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
  pub parameters: Vec<ParameterEntry>,
}
