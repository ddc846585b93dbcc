//! Bearer-token verification and the middleware that attaches the verified
//! [`CallerContext`] to each request.

use std::{path::PathBuf, sync::Arc};

use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use cascade_api::ApiError;
use cascade_core::{CallerContext, Error};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use thiserror::Error;

/// Key material used to check token signatures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
  pub algorithm:       KeyAlgorithm,
  /// PEM-encoded RSA public key; required for `RS256`.
  pub public_key_path: Option<PathBuf>,
  /// Shared secret; required for `HS256`.
  pub secret:          Option<String>,
  /// When set, tokens must carry this `kid` in their header.
  pub key_id:          Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum KeyAlgorithm {
  #[default]
  RS256,
  HS256,
}

#[derive(Debug, Error)]
pub enum KeyError {
  #[error("auth.{0} must be set for the configured algorithm")]
  Missing(&'static str),

  #[error("failed to read key file {path:?}: {source}")]
  Read {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid key: {0}")]
  Invalid(#[from] jsonwebtoken::errors::Error),
}

/// The token claims the service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
  #[serde(default)]
  pub user_id: String,
  #[serde(default)]
  pub org_id:  Option<String>,
}

// ─── Verifier ─────────────────────────────────────────────────────────────────

pub struct TokenVerifier {
  key:        DecodingKey,
  validation: Validation,
  key_id:     Option<String>,
}

impl TokenVerifier {
  pub fn from_config(config: &AuthConfig) -> Result<Self, KeyError> {
    let verifier = match config.algorithm {
      KeyAlgorithm::RS256 => {
        let path = config
          .public_key_path
          .as_ref()
          .ok_or(KeyError::Missing("public_key_path"))?;
        let pem = std::fs::read(path)
          .map_err(|source| KeyError::Read { path: path.clone(), source })?;
        Self::rs256_pem(&pem)?
      }
      KeyAlgorithm::HS256 => {
        let secret = config
          .secret
          .as_deref()
          .filter(|s| !s.is_empty())
          .ok_or(KeyError::Missing("secret"))?;
        Self::hs256(secret.as_bytes())
      }
    };
    Ok(match &config.key_id {
      Some(kid) if !kid.is_empty() => verifier.with_key_id(kid.clone()),
      _ => verifier,
    })
  }

  pub fn rs256_pem(pem: &[u8]) -> Result<Self, KeyError> {
    Ok(Self {
      key:        DecodingKey::from_rsa_pem(pem)?,
      validation: Validation::new(Algorithm::RS256),
      key_id:     None,
    })
  }

  pub fn hs256(secret: &[u8]) -> Self {
    Self {
      key:        DecodingKey::from_secret(secret),
      validation: Validation::new(Algorithm::HS256),
      key_id:     None,
    }
  }

  /// Only accept tokens whose header names `kid`.
  pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
    self.key_id = Some(kid.into());
    self
  }

  /// Verify the bearer token in `headers` and derive the caller from its
  /// claims. Signature and expiry failures are `Unauthenticated`; a token
  /// naming neither an organization nor a user is `InvalidArgument`.
  pub fn verify(&self, headers: &HeaderMap) -> Result<CallerContext, Error> {
    let token = headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Bearer "))
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .ok_or_else(|| Error::Unauthenticated("missing bearer token".to_owned()))?;

    if let Some(expected) = &self.key_id {
      let token_header = decode_header(token)
        .map_err(|_| Error::Unauthenticated("invalid token".to_owned()))?;
      if token_header.kid.as_deref() != Some(expected.as_str()) {
        tracing::debug!(kid = ?token_header.kid, "token signed with an unknown key");
        return Err(Error::Unauthenticated("unknown signing key".to_owned()));
      }
    }

    let claims = decode::<Claims>(token, &self.key, &self.validation)
      .map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        Error::Unauthenticated("invalid token".to_owned())
      })?
      .claims;

    CallerContext::new(claims.org_id, claims.user_id)
  }
}

/// Middleware: reject unauthenticated requests, otherwise attach the
/// [`CallerContext`] for the `Caller` extractor.
pub async fn authenticate(
  State(verifier): State<Arc<TokenVerifier>>,
  mut request: Request,
  next: Next,
) -> Result<Response, ApiError> {
  let caller = verifier.verify(request.headers())?;
  request.extensions_mut().insert(caller);
  Ok(next.run(request).await)
}
