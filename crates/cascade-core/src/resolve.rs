//! Path resolution: hierarchical fallback for retrieve and most-specific
//! selection for wildcard list.
//!
//! `/` is the only structural separator. A path `a/b/c` that does not exist
//! resolves to `a/b`, then to `a`; resolution never walks further than
//! [`MAX_FALLBACK_DEPTH`] ancestors.

use std::{
  collections::{HashMap, HashSet},
  time::Duration,
};

use tracing::{debug, warn};

use crate::{
  Error, Parameter, Result,
  cache::{ParameterCache, cache_key},
  store::ParameterStore,
};

/// Number of ancestor levels tried after the exact path.
pub const MAX_FALLBACK_DEPTH: usize = 2;

pub const SEPARATOR: char = '/';

/// The list wildcard; only its first occurrence in a pattern is special.
pub const WILDCARD: char = '*';

// ─── Path helpers ────────────────────────────────────────────────────────────

/// Drop the last `/`-separated segment: `a/b/c` → `a/b`, `a` → `""`.
pub fn parent_path(path: &str) -> &str {
  path.rsplit_once(SEPARATOR).map_or("", |(head, _)| head)
}

/// The substring before the first `/`.
pub fn first_segment(path: &str) -> &str {
  path.split_once(SEPARATOR).map_or(path, |(head, _)| head)
}

pub fn segment_count(path: &str) -> usize { path.split(SEPARATOR).count() }

/// Whether a list request is a wildcard pattern rather than an exact path.
pub fn is_pattern(path: &str) -> bool { path.contains(WILDCARD) }

/// The distinct paths of `paths`, in first-seen order.
pub fn distinct<'a>(paths: impl IntoIterator<Item = &'a String>) -> Vec<String> {
  let mut seen = HashSet::new();
  paths
    .into_iter()
    .filter(|path| seen.insert(path.as_str()))
    .cloned()
    .collect()
}

/// Keep the deepest parameter of every first-segment group.
///
/// Parameters are grouped by [`first_segment`]; a group is bounded by `/`, so
/// `MYCONFIG` and `MYCONFIGURATION/x` never share one. Within a group the path
/// with the most segments wins, the first one seen on a tie. When the input
/// holds the same path twice the later row represents it.
pub fn most_specific_per_group(parameters: Vec<Parameter>) -> Vec<Parameter> {
  let mut by_path: HashMap<String, Parameter> = HashMap::new();
  let mut order: Vec<String> = Vec::new();
  for parameter in parameters {
    if !by_path.contains_key(&parameter.path) {
      order.push(parameter.path.clone());
    }
    by_path.insert(parameter.path.clone(), parameter);
  }

  // (group key, deepest path so far)
  let mut groups: Vec<(&str, &str)> = Vec::new();
  for path in &order {
    let key = first_segment(path);
    match groups.iter_mut().find(|(group, _)| *group == key) {
      Some((_, best)) => {
        if segment_count(path) > segment_count(best) {
          *best = path.as_str();
        }
      }
      None => groups.push((key, path.as_str())),
    }
  }

  let winners: Vec<String> = groups.into_iter().map(|(_, path)| path.to_owned()).collect();
  winners
    .into_iter()
    .filter_map(|path| by_path.remove(&path))
    .collect()
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Resolves paths for one organization against a cache and a store.
///
/// Every level of the fallback is one bulk cache read followed by one bulk
/// store read for the misses; rows read from the store are written back to the
/// cache.
pub struct Resolver<'a, S, C> {
  store:  &'a S,
  cache:  &'a C,
  ttl:    Duration,
  org_id: &'a str,
}

impl<'a, S, C> Resolver<'a, S, C>
where
  S: ParameterStore,
  C: ParameterCache,
{
  pub fn new(store: &'a S, cache: &'a C, ttl: Duration, org_id: &'a str) -> Self {
    Self { store, cache, ttl, org_id }
  }

  /// Resolve every path of `paths` to its most specific existing ancestor.
  ///
  /// Fails with [`Error::NotFound`] if any path has no ancestor within
  /// [`MAX_FALLBACK_DEPTH`] levels. The result holds one parameter per
  /// distinct resolution target, in request order.
  pub async fn resolve(&self, paths: &[String]) -> Result<Vec<Parameter>> {
    let requested = distinct(paths);
    let mut found = self.fetch(&requested).await?;

    let mut resolved: HashMap<String, String> = HashMap::new();
    // (requested path, candidate ancestor)
    let mut pending: Vec<(String, String)> = Vec::new();
    for path in &requested {
      if found.contains_key(path) {
        resolved.insert(path.clone(), path.clone());
      } else {
        pending.push((path.clone(), path.clone()));
      }
    }

    for level in 1..=MAX_FALLBACK_DEPTH {
      if pending.is_empty() {
        break;
      }

      for (_, candidate) in &mut pending {
        *candidate = parent_path(candidate).to_owned();
      }

      let lookups = distinct(
        pending
          .iter()
          .map(|(_, candidate)| candidate)
          .filter(|candidate| !candidate.is_empty() && !found.contains_key(*candidate)),
      );
      if !lookups.is_empty() {
        found.extend(self.fetch(&lookups).await?);
      }

      pending.retain(|(path, candidate)| {
        if found.contains_key(candidate) {
          resolved.insert(path.clone(), candidate.clone());
          false
        } else {
          true
        }
      });

      debug!(
        org_id = self.org_id,
        level,
        unresolved = pending.len(),
        "fallback level done"
      );
    }

    if !pending.is_empty() {
      let missing: Vec<&str> = pending.iter().map(|(path, _)| path.as_str()).collect();
      return Err(Error::NotFound(missing.join(", ")));
    }

    let mut emitted = HashSet::new();
    let mut parameters = Vec::with_capacity(requested.len());
    for path in &requested {
      let Some(target) = resolved.get(path) else { continue };
      if emitted.insert(target.as_str())
        && let Some(parameter) = found.get(target)
      {
        parameters.push(parameter.clone());
      }
    }
    Ok(parameters)
  }

  /// Exact lookup when `path` has no wildcard; otherwise a pattern scan
  /// narrowed to the most specific parameter per group.
  pub async fn list(&self, path: &str) -> Result<Vec<Parameter>> {
    if !is_pattern(path) {
      let paths = [path.to_owned()];
      return self
        .store
        .find_by_keys(self.org_id, &paths)
        .await
        .map_err(Error::store);
    }

    let matched = self
      .store
      .find_by_pattern(self.org_id, path)
      .await
      .map_err(Error::store)?;
    debug!(org_id = self.org_id, pattern = path, matched = matched.len(), "pattern scan");

    Ok(most_specific_per_group(matched))
  }

  /// Exact lookup of `paths`: cache first, then the store for the misses.
  async fn fetch(&self, paths: &[String]) -> Result<HashMap<String, Parameter>> {
    let keys: Vec<String> = paths.iter().map(|path| cache_key(self.org_id, path)).collect();
    let cached = match self.cache.get_many(&keys).await {
      Ok(hits) if hits.len() == paths.len() => hits,
      Ok(_) => vec![None; paths.len()],
      Err(e) => {
        warn!(org_id = self.org_id, error = %e, "cache read failed, treating as miss");
        vec![None; paths.len()]
      }
    };

    let mut found = HashMap::with_capacity(paths.len());
    let mut misses = Vec::new();
    for (path, hit) in paths.iter().zip(cached) {
      // Keys are not injective over (org_id, path) when either contains ':'.
      match hit {
        Some(parameter) if parameter.is_keyed(self.org_id, path) => {
          found.insert(path.clone(), parameter);
        }
        _ => misses.push(path.clone()),
      }
    }

    if misses.is_empty() {
      return Ok(found);
    }

    let stored = self
      .store
      .find_by_keys(self.org_id, &misses)
      .await
      .map_err(Error::store)?;
    for parameter in stored {
      write_through(self.cache, &parameter, self.ttl).await;
      found.insert(parameter.path.clone(), parameter);
    }
    Ok(found)
  }
}

/// Cache `parameter` under its key. Failures are logged and swallowed.
pub(crate) async fn write_through<C: ParameterCache>(
  cache: &C,
  parameter: &Parameter,
  ttl: Duration,
) {
  let key = cache_key(&parameter.org_id, &parameter.path);
  if let Err(e) = cache.set(&key, parameter, ttl).await {
    warn!(key = %key, error = %e, "cache write failed");
  }
}

/// Drop the cache entry of `(org_id, path)`. Failures are logged and swallowed.
pub(crate) async fn invalidate<C: ParameterCache>(cache: &C, org_id: &str, path: &str) {
  let key = cache_key(org_id, path);
  if let Err(e) = cache.del(&key).await {
    warn!(key = %key, error = %e, "cache invalidation failed");
  }
}
