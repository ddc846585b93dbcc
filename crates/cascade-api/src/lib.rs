//! JSON RPC surface for Cascade.
//!
//! Exposes an axum [`Router`] with the five `ParameterService` methods, backed
//! by any [`ParameterService`]. Token verification, TLS, and listener concerns
//! are the caller's responsibility: whatever authenticates a request must
//! attach a [`CallerContext`](cascade_core::CallerContext) to its extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(cascade_api::api_router(service.clone()))
//! ```

pub mod caller;
pub mod error;
pub mod parameters;

use std::sync::Arc;

use axum::{Router, routing::post};
use cascade_core::{ParameterService, cache::ParameterCache, store::ParameterStore};

pub use caller::Caller;
pub use error::ApiError;

/// Route prefix shared by every method.
pub const SERVICE_PATH: &str = "/parameter.ParameterService";

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(service: Arc<ParameterService<S, C>>) -> Router<()>
where
  S: ParameterStore + 'static,
  C: ParameterCache + 'static,
{
  Router::new()
    .route(&format!("{SERVICE_PATH}/create"), post(parameters::create::<S, C>))
    .route(&format!("{SERVICE_PATH}/retrieve"), post(parameters::retrieve::<S, C>))
    .route(&format!("{SERVICE_PATH}/update"), post(parameters::update::<S, C>))
    .route(&format!("{SERVICE_PATH}/delete"), post(parameters::delete::<S, C>))
    .route(&format!("{SERVICE_PATH}/list"), post(parameters::list::<S, C>))
    .with_state(service)
}
