//! The authenticated caller, as seen by the service.
//!
//! Token verification happens outside this crate. Whatever verified the caller
//! hands over the decoded `user_id` and optional `org_id`; the organization
//! falls back to the user when the token names none.

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
  org_id:  String,
  user_id: String,
}

impl CallerContext {
  /// Build a caller context from decoded token claims.
  ///
  /// Fails with [`Error::InvalidArgument`] when neither an organization nor a
  /// user identifier is present.
  pub fn new(org_id: Option<String>, user_id: impl Into<String>) -> Result<Self> {
    let user_id = user_id.into();
    let org_id = org_id
      .filter(|org| !org.is_empty())
      .unwrap_or_else(|| user_id.clone());

    if org_id.is_empty() {
      return Err(Error::InvalidArgument(
        "caller metadata carries no org_id".to_owned(),
      ));
    }

    Ok(Self { org_id, user_id })
  }

  /// The tenant every operation of this caller is scoped to.
  pub fn org_id(&self) -> &str { &self.org_id }

  pub fn user_id(&self) -> &str { &self.user_id }
}
