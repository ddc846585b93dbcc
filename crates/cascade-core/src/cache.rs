//! The advisory parameter cache.
//!
//! The cache sits in front of a [`ParameterStore`](crate::store::ParameterStore)
//! and is written through after every successful store write. Correctness never
//! depends on it: any read may miss, and a failing cache is logged and ignored
//! by the service.

use std::{
  convert::Infallible,
  future::Future,
  sync::Mutex,
  time::{Duration, Instant},
};

use dashmap::DashMap;
use thiserror::Error;

use crate::Parameter;

/// Default lifetime of a cached parameter.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Minimum time between two full expiry sweeps of a full [`MemoryCache`].
const PURGE_INTERVAL: Duration = Duration::from_secs(1);

/// The cache key of `(org_id, path)`: `param:<org_id>:<path>`.
pub fn cache_key(org_id: &str, path: &str) -> String {
  format!("param:{org_id}:{path}")
}

// ─── Trait ───────────────────────────────────────────────────────────────────

pub trait ParameterCache: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Parameter>, Self::Error>> + Send + 'a;

  /// Read several keys at once. The result is aligned with `keys`.
  ///
  /// Backends that can pipeline reads should override this.
  fn get_many<'a>(
    &'a self,
    keys: &'a [String],
  ) -> impl Future<Output = Result<Vec<Option<Parameter>>, Self::Error>> + Send + 'a
  {
    async move {
      let mut hits = Vec::with_capacity(keys.len());
      for key in keys {
        hits.push(self.get(key).await?);
      }
      Ok(hits)
    }
  }

  /// Store `parameter` under `key`. A zero `ttl` means the entry never expires.
  fn set<'a>(
    &'a self,
    key: &'a str,
    parameter: &'a Parameter,
    ttl: Duration,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Drop `key`. Deleting an absent key succeeds.
  fn del<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── In-process cache ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CacheError {
  #[error("cache serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

struct Slot {
  payload:    String,
  expires_at: Option<Instant>,
}

impl Slot {
  fn is_expired(&self, now: Instant) -> bool {
    self.expires_at.is_some_and(|at| at <= now)
  }
}

/// A concurrent in-process cache.
///
/// Parameters are stored serialised, so a hit always deserialises into a
/// fresh value. Expired entries read as misses and are dropped lazily.
pub struct MemoryCache {
  slots:       DashMap<String, Slot>,
  /// Upper bound on live entries; `0` means unbounded.
  max_entries: usize,
  /// When the last expiry sweep ran.
  purged_at:   Mutex<Option<Instant>>,
}

impl MemoryCache {
  pub fn new(max_entries: usize) -> Self {
    Self { slots: DashMap::new(), max_entries, purged_at: Mutex::new(None) }
  }

  pub fn unbounded() -> Self { Self::new(0) }

  /// Number of entries currently held, expired or not.
  pub fn len(&self) -> usize { self.slots.len() }

  pub fn is_empty(&self) -> bool { self.slots.is_empty() }

  /// Drop expired entries, at most once per [`PURGE_INTERVAL`]. A sweep
  /// already running on another task is not waited for.
  fn purge_expired(&self) {
    let now = Instant::now();
    let Ok(mut purged_at) = self.purged_at.try_lock() else { return };
    if purged_at.is_some_and(|at| now.duration_since(at) < PURGE_INTERVAL) {
      return;
    }
    *purged_at = Some(now);
    self.slots.retain(|_, slot| !slot.is_expired(now));
  }

  /// Make room for one more entry.
  fn reserve_slot(&self, key: &str) {
    if self.max_entries == 0
      || self.slots.len() < self.max_entries
      || self.slots.contains_key(key)
    {
      return;
    }

    self.purge_expired();
    if self.slots.len() < self.max_entries {
      return;
    }

    let victim = self.slots.iter().next().map(|entry| entry.key().clone());
    if let Some(victim) = victim {
      self.slots.remove(&victim);
    }
  }
}

impl Default for MemoryCache {
  fn default() -> Self { Self::unbounded() }
}

impl ParameterCache for MemoryCache {
  type Error = CacheError;

  async fn get(&self, key: &str) -> Result<Option<Parameter>, CacheError> {
    let now = Instant::now();
    let hit = self
      .slots
      .get(key)
      .map(|slot| (slot.is_expired(now), slot.payload.clone()));

    match hit {
      None => Ok(None),
      Some((true, _)) => {
        self.slots.remove_if(key, |_, slot| slot.is_expired(now));
        Ok(None)
      }
      Some((false, payload)) => Ok(Some(serde_json::from_str(&payload)?)),
    }
  }

  async fn set(
    &self,
    key: &str,
    parameter: &Parameter,
    ttl: Duration,
  ) -> Result<(), CacheError> {
    let payload = serde_json::to_string(parameter)?;
    // Zero, or too far out to represent, never expires.
    let expires_at = if ttl.is_zero() { None } else { Instant::now().checked_add(ttl) };

    self.reserve_slot(key);
    self.slots.insert(key.to_owned(), Slot { payload, expires_at });
    Ok(())
  }

  async fn del(&self, key: &str) -> Result<(), CacheError> {
    self.slots.remove(key);
    Ok(())
  }
}

// ─── Disabled cache ──────────────────────────────────────────────────────────

/// A cache that stores nothing. Every read misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ParameterCache for NoCache {
  type Error = Infallible;

  async fn get(&self, _key: &str) -> Result<Option<Parameter>, Infallible> {
    Ok(None)
  }

  async fn set(
    &self,
    _key: &str,
    _parameter: &Parameter,
    _ttl: Duration,
  ) -> Result<(), Infallible> {
    Ok(())
  }

  async fn del(&self, _key: &str) -> Result<(), Infallible> { Ok(()) }
}
