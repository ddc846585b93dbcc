//! [`ParameterService`]: the five parameter operations.
//!
//! The service validates requests, runs them against the store through the
//! [`Resolver`], keeps the cache written through, and shapes the responses.
//! It is transport-agnostic: callers hand it an already authenticated
//! [`CallerContext`].

use std::{collections::HashMap, time::Duration};

use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
  CallerContext, Error, NewParameter, Result,
  cache::{DEFAULT_TTL, ParameterCache},
  messages::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ListRequest,
    ListResponse, ParameterEntry, RetrieveRequest, RetrieveResponse, UpdateRequest,
    UpdateResponse,
  },
  resolve::{Resolver, distinct, invalidate, write_through},
  store::ParameterStore,
};

pub struct ParameterService<S, C> {
  store: S,
  cache: C,
  ttl:   Duration,
}

impl<S, C> ParameterService<S, C>
where
  S: ParameterStore,
  C: ParameterCache,
{
  pub fn new(store: S, cache: C) -> Self { Self { store, cache, ttl: DEFAULT_TTL } }

  /// Override the lifetime of cached parameters.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn cache(&self) -> &C { &self.cache }

  fn resolver<'a>(&'a self, caller: &'a CallerContext) -> Resolver<'a, S, C> {
    Resolver::new(&self.store, &self.cache, self.ttl, caller.org_id())
  }

  // ── Create ────────────────────────────────────────────────────────────────

  /// Store every entry of the request. Fails with [`Error::AlreadyExists`]
  /// when any path is already taken and `overwrite` is not set.
  #[instrument(skip_all, fields(org_id = caller.org_id(), count = request.parameters.len()))]
  pub async fn create(
    &self,
    caller: &CallerContext,
    request: CreateRequest,
  ) -> Result<CreateResponse> {
    require_paths(request.parameters.iter().map(|p| p.path.as_str()))?;
    let org_id = caller.org_id();

    let entries = last_wins(request.parameters.into_iter().map(|p| (p.path, p.value)));
    let paths: Vec<String> = entries.iter().map(|(path, _)| path.clone()).collect();

    let existing = self
      .store
      .find_by_keys(org_id, &paths)
      .await
      .map_err(Error::store)?;
    if !existing.is_empty() && !request.overwrite {
      let taken: Vec<&str> = existing.iter().map(|p| p.path.as_str()).collect();
      return Err(Error::AlreadyExists(taken.join(", ")));
    }

    let rows = entries
      .into_iter()
      .map(|(path, value)| NewParameter::new(org_id, path, value))
      .collect();
    let stored = self.store.upsert_many(rows).await.map_err(Error::store)?;

    for parameter in &stored {
      write_through(&self.cache, parameter, self.ttl).await;
    }
    debug!(stored = stored.len(), replaced = existing.len(), "parameters created");

    Ok(CreateResponse { parameters: stored.into_iter().map(ParameterEntry::from).collect() })
  }

  // ── Update ────────────────────────────────────────────────────────────────

  /// Replace the values of existing parameters. All-or-nothing: fails with
  /// [`Error::NotFound`] unless every requested path exists.
  #[instrument(skip_all, fields(org_id = caller.org_id(), count = request.parameters.len()))]
  pub async fn update(
    &self,
    caller: &CallerContext,
    request: UpdateRequest,
  ) -> Result<UpdateResponse> {
    require_paths(request.parameters.iter().map(|p| p.path.as_str()))?;
    let org_id = caller.org_id();

    let mut updates: HashMap<String, Option<Value>> = last_wins(
      request.parameters.into_iter().map(|p| (p.path, p.value)),
    )
    .into_iter()
    .collect();
    let paths: Vec<String> = updates.keys().cloned().collect();

    let existing = self
      .store
      .find_by_keys(org_id, &paths)
      .await
      .map_err(Error::store)?;
    if existing.len() != paths.len() {
      let mut missing: Vec<&str> = paths
        .iter()
        .filter(|path| !existing.iter().any(|p| &p.path == *path))
        .map(String::as_str)
        .collect();
      missing.sort_unstable();
      return Err(Error::NotFound(missing.join(", ")));
    }

    let rows = existing
      .into_iter()
      .map(|current| {
        let value = updates
          .remove(&current.path)
          .flatten()
          .unwrap_or(current.value);
        NewParameter::new(current.org_id, current.path, value)
      })
      .collect();
    let stored = self.store.upsert_many(rows).await.map_err(Error::store)?;

    for parameter in &stored {
      write_through(&self.cache, parameter, self.ttl).await;
    }

    Ok(UpdateResponse { parameters: stored.into_iter().map(ParameterEntry::from).collect() })
  }

  // ── Retrieve ──────────────────────────────────────────────────────────────

  /// Resolve every path to its most specific existing ancestor.
  /// All-or-nothing: one unresolvable path fails the whole request.
  #[instrument(skip_all, fields(org_id = caller.org_id(), count = request.paths.len()))]
  pub async fn retrieve(
    &self,
    caller: &CallerContext,
    request: RetrieveRequest,
  ) -> Result<RetrieveResponse> {
    require_paths(request.paths.iter().map(String::as_str))?;

    let resolved = self.resolver(caller).resolve(&request.paths).await?;

    Ok(RetrieveResponse { parameters: resolved.into_iter().map(ParameterEntry::from).collect() })
  }

  // ── Delete ────────────────────────────────────────────────────────────────

  /// Remove the given paths and invalidate their cache entries. Absent paths
  /// are not an error; they simply do not count.
  #[instrument(skip_all, fields(org_id = caller.org_id(), count = request.paths.len()))]
  pub async fn delete(
    &self,
    caller: &CallerContext,
    request: DeleteRequest,
  ) -> Result<DeleteResponse> {
    require_paths(request.paths.iter().map(String::as_str))?;
    let org_id = caller.org_id();
    let paths = distinct(&request.paths);

    let deleted = self
      .store
      .delete_by_keys(org_id, &paths)
      .await
      .map_err(Error::store)?;

    for path in &paths {
      invalidate(&self.cache, org_id, path).await;
    }
    debug!(deleted, "parameters deleted");

    Ok(DeleteResponse { deleted })
  }

  // ── List ──────────────────────────────────────────────────────────────────

  /// List by exact path, or by a `*` pattern narrowed to the most specific
  /// parameter per first-segment group. The result order is unspecified.
  #[instrument(skip_all, fields(org_id = caller.org_id(), path = %request.path))]
  pub async fn list(
    &self,
    caller: &CallerContext,
    request: ListRequest,
  ) -> Result<ListResponse> {
    if request.path.is_empty() {
      return Err(Error::InvalidArgument("path must not be empty".to_owned()));
    }

    let listed = self.resolver(caller).list(&request.path).await?;

    Ok(ListResponse { parameters: listed.into_iter().map(ParameterEntry::from).collect() })
  }
}

// ─── Validation ──────────────────────────────────────────────────────────────

fn require_paths<'a>(paths: impl ExactSizeIterator<Item = &'a str>) -> Result<()> {
  if paths.len() == 0 {
    return Err(Error::InvalidArgument("at least one path is required".to_owned()));
  }
  for path in paths {
    if path.is_empty() {
      return Err(Error::InvalidArgument("path must not be empty".to_owned()));
    }
  }
  Ok(())
}

/// Collapse repeated paths, keeping the position of the first occurrence and
/// the payload of the last.
fn last_wins<T>(entries: impl IntoIterator<Item = (String, T)>) -> Vec<(String, T)> {
  let mut position: HashMap<String, usize> = HashMap::new();
  let mut merged: Vec<(String, T)> = Vec::new();
  for (path, payload) in entries {
    match position.get(&path) {
      Some(&at) => merged[at].1 = payload,
      None => {
        position.insert(path.clone(), merged.len());
        merged.push((path, payload));
      }
    }
  }
  merged
}
