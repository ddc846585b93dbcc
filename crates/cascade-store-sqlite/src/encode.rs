//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and values as compact JSON.

use cascade_core::{Parameter, resolve::WILDCARD};
use chrono::{DateTime, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── List patterns ───────────────────────────────────────────────────────────

/// Translate a list pattern into a `GLOB` operand.
///
/// The first `*` becomes the match-any wildcard. Every other glob
/// metacharacter is wrapped in a one-character class so it matches itself.
pub fn glob_pattern(pattern: &str) -> String {
  let mut glob = String::with_capacity(pattern.len() + 4);
  let mut wildcard_seen = false;
  for c in pattern.chars() {
    match c {
      WILDCARD if !wildcard_seen => {
        wildcard_seen = true;
        glob.push('*');
      }
      '*' | '?' | '[' => {
        glob.push('[');
        glob.push(c);
        glob.push(']');
      }
      _ => glob.push(c),
    }
  }
  glob
}

/// `count` numbered placeholders: `?{first}, ?{first + 1}, …`.
pub fn placeholders(count: usize, first: usize) -> String {
  (first..first + count)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawParameter::from_row`].
pub const PARAMETER_COLUMNS: &str = "path, org_id, value, created_at, updated_at";

/// Raw strings read directly from a `parameter` row.
pub struct RawParameter {
  pub path:       String,
  pub org_id:     String,
  pub value:      String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawParameter {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      path:       row.get(0)?,
      org_id:     row.get(1)?,
      value:      row.get(2)?,
      created_at: row.get(3)?,
      updated_at: row.get(4)?,
    })
  }

  pub fn into_parameter(self) -> Result<Parameter> {
    Ok(Parameter {
      path:       self.path,
      org_id:     self.org_id,
      value:      serde_json::from_str(&self.value)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
