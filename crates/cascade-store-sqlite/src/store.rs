//! [`SqliteStore`]: the SQLite implementation of [`ParameterStore`].

use std::path::Path;

use cascade_core::{NewParameter, Parameter, store::ParameterStore};
use chrono::Utc;
use tracing::{debug, info};

use crate::{
  Error, Result,
  encode::{PARAMETER_COLUMNS, RawParameter, encode_dt, glob_pattern, placeholders},
  schema::{SCHEMA, SCHEMA_VERSION},
};

/// Keys bound per `IN (…)` list, well under SQLite's bound-parameter limit.
const KEYS_PER_STATEMENT: usize = 500;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A parameter store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let found: i64 = self
      .conn
      .call(|conn| {
        let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version < SCHEMA_VERSION {
          conn.execute_batch(SCHEMA)?;
        }
        Ok(version)
      })
      .await?;

    if found > SCHEMA_VERSION {
      return Err(Error::SchemaVersion { found, supported: SCHEMA_VERSION });
    }
    if found < SCHEMA_VERSION {
      info!(from = found, to = SCHEMA_VERSION, "parameter schema applied");
    }
    Ok(())
  }
}

// ─── ParameterStore impl ─────────────────────────────────────────────────────

impl ParameterStore for SqliteStore {
  type Error = Error;

  async fn find_by_keys(&self, org_id: &str, paths: &[String]) -> Result<Vec<Parameter>> {
    if paths.is_empty() {
      return Ok(Vec::new());
    }

    let org_id = org_id.to_owned();
    let paths = paths.to_vec();

    let raws: Vec<RawParameter> = self
      .conn
      .call(move |conn| {
        let mut rows = Vec::new();
        for chunk in paths.chunks(KEYS_PER_STATEMENT) {
          let sql = format!(
            "SELECT {PARAMETER_COLUMNS} FROM parameter
             WHERE org_id = ?1 AND path IN ({})",
            placeholders(chunk.len(), 2),
          );
          let mut stmt = conn.prepare_cached(&sql)?;
          let found = stmt
            .query_map(
              rusqlite::params_from_iter(std::iter::once(&org_id).chain(chunk)),
              RawParameter::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows.extend(found);
        }
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawParameter::into_parameter).collect()
  }

  async fn find_by_pattern(&self, org_id: &str, pattern: &str) -> Result<Vec<Parameter>> {
    let org_id = org_id.to_owned();
    let glob = glob_pattern(pattern);
    debug!(pattern, glob, "pattern scan");

    let raws: Vec<RawParameter> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(&format!(
          "SELECT {PARAMETER_COLUMNS} FROM parameter
           WHERE org_id = ?1 AND path GLOB ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![org_id, glob], RawParameter::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawParameter::into_parameter).collect()
  }

  async fn upsert_many(&self, parameters: Vec<NewParameter>) -> Result<Vec<Parameter>> {
    if parameters.is_empty() {
      return Ok(Vec::new());
    }

    let now = encode_dt(Utc::now());
    let encoded = parameters
      .into_iter()
      .map(|p| -> Result<(String, String, String)> {
        Ok((p.path, p.org_id, serde_json::to_string(&p.value)?))
      })
      .collect::<Result<Vec<_>>>()?;

    let raws: Vec<RawParameter> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut rows = Vec::with_capacity(encoded.len());
        {
          let mut stmt = tx.prepare_cached(&format!(
            "INSERT INTO parameter (path, org_id, value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT (path, org_id) DO UPDATE SET
               value      = excluded.value,
               updated_at = excluded.updated_at
             RETURNING {PARAMETER_COLUMNS}"
          ))?;
          for (path, org_id, value) in &encoded {
            rows.push(stmt.query_row(
              rusqlite::params![path, org_id, value, now],
              RawParameter::from_row,
            )?);
          }
        }
        tx.commit()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawParameter::into_parameter).collect()
  }

  async fn delete_by_keys(&self, org_id: &str, paths: &[String]) -> Result<u64> {
    if paths.is_empty() {
      return Ok(0);
    }

    let org_id = org_id.to_owned();
    let paths = paths.to_vec();

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut deleted = 0usize;
        for chunk in paths.chunks(KEYS_PER_STATEMENT) {
          let sql = format!(
            "DELETE FROM parameter WHERE org_id = ?1 AND path IN ({})",
            placeholders(chunk.len(), 2),
          );
          deleted += tx.execute(
            &sql,
            rusqlite::params_from_iter(std::iter::once(&org_id).chain(chunk)),
          )?;
        }
        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    Ok(deleted as u64)
  }
}
