//! Wiring for the `cascade` binary: configuration, the runtime cache choice,
//! bearer-token authentication, and the layered application router.

pub mod auth;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::{Router, middleware};
use cascade_core::{
  Parameter, ParameterService,
  cache::{CacheError, MemoryCache, NoCache, ParameterCache},
};
use cascade_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use auth::TokenVerifier;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `CASCADE__*`
/// environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub server: ListenConfig,
  pub store:  StoreConfig,
  pub cache:  CacheConfig,
  pub auth:   auth::AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
  pub host:                 String,
  pub port:                 u16,
  pub request_timeout_secs: u64,
}

impl Default for ListenConfig {
  fn default() -> Self {
    Self { host: "0.0.0.0".to_string(), port: 8000, request_timeout_secs: 30 }
  }
}

impl ListenConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn request_timeout(&self) -> Duration { Duration::from_secs(self.request_timeout_secs) }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  /// Database file, or `:memory:` for an ephemeral store.
  pub path: PathBuf,
}

impl Default for StoreConfig {
  fn default() -> Self { Self { path: PathBuf::from("cascade.db") } }
}

impl StoreConfig {
  pub fn is_in_memory(&self) -> bool { self.path == Path::new(":memory:") }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub enabled:     bool,
  /// Entry lifetime in seconds; `0` keeps entries until evicted.
  pub ttl_secs:    u64,
  /// Capacity bound; `0` means unbounded.
  pub max_entries: usize,
}

impl Default for CacheConfig {
  fn default() -> Self { Self { enabled: true, ttl_secs: 3600, max_entries: 100_000 } }
}

impl CacheConfig {
  pub fn ttl(&self) -> Duration { Duration::from_secs(self.ttl_secs) }

  pub fn build(&self) -> AppCache {
    if self.enabled {
      AppCache::Memory(MemoryCache::new(self.max_entries))
    } else {
      AppCache::Disabled(NoCache)
    }
  }
}

// ─── Runtime cache ────────────────────────────────────────────────────────────

/// The cache selected by configuration.
pub enum AppCache {
  Memory(MemoryCache),
  Disabled(NoCache),
}

impl ParameterCache for AppCache {
  type Error = CacheError;

  async fn get(&self, key: &str) -> Result<Option<Parameter>, CacheError> {
    match self {
      Self::Memory(cache) => cache.get(key).await,
      Self::Disabled(cache) => Ok(cache.get(key).await.unwrap_or_else(|never| match never {})),
    }
  }

  async fn set(
    &self,
    key: &str,
    parameter: &Parameter,
    ttl: Duration,
  ) -> Result<(), CacheError> {
    match self {
      Self::Memory(cache) => cache.set(key, parameter, ttl).await,
      Self::Disabled(cache) => {
        cache.set(key, parameter, ttl).await.unwrap_or_else(|never| match never {});
        Ok(())
      }
    }
  }

  async fn del(&self, key: &str) -> Result<(), CacheError> {
    match self {
      Self::Memory(cache) => cache.del(key).await,
      Self::Disabled(cache) => {
        cache.del(key).await.unwrap_or_else(|never| match never {});
        Ok(())
      }
    }
  }
}

// ─── Application ──────────────────────────────────────────────────────────────

pub type AppService = ParameterService<SqliteStore, AppCache>;

/// Build the service from an opened store and the cache configuration.
pub fn service(store: SqliteStore, cache: &CacheConfig) -> AppService {
  ParameterService::new(store, cache.build()).with_ttl(cache.ttl())
}

/// The RPC router behind token authentication, a request timeout, and
/// request tracing.
pub fn app(service: Arc<AppService>, verifier: Arc<TokenVerifier>, timeout: Duration) -> Router {
  cascade_api::api_router(service)
    .layer(middleware::from_fn_with_state(verifier, auth::authenticate))
    .layer(TimeoutLayer::new(timeout))
    .layer(TraceLayer::new_for_http())
}
