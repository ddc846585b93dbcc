//! Handlers for the `parameter.ParameterService` methods.
//!
//! | Method | Path | Body → Response |
//! |--------|------|-----------------|
//! | `POST` | `/parameter.ParameterService/create` | [`CreateRequest`] → [`CreateResponse`] |
//! | `POST` | `/parameter.ParameterService/retrieve` | [`RetrieveRequest`] → [`RetrieveResponse`] |
//! | `POST` | `/parameter.ParameterService/update` | [`UpdateRequest`] → [`UpdateResponse`] |
//! | `POST` | `/parameter.ParameterService/delete` | [`DeleteRequest`] → [`DeleteResponse`] |
//! | `POST` | `/parameter.ParameterService/list` | [`ListRequest`] → [`ListResponse`] |

use std::sync::Arc;

use axum::{Json, extract::State};
use cascade_core::{
  ParameterService,
  cache::ParameterCache,
  messages::{
    CreateRequest, CreateResponse, DeleteRequest, DeleteResponse, ListRequest,
    ListResponse, RetrieveRequest, RetrieveResponse, UpdateRequest, UpdateResponse,
  },
  store::ParameterStore,
};

use crate::{ApiError, Caller};

type Service<S, C> = State<Arc<ParameterService<S, C>>>;

pub async fn create<S, C>(
  State(service): Service<S, C>,
  Caller(caller): Caller,
  Json(request): Json<CreateRequest>,
) -> Result<Json<CreateResponse>, ApiError>
where
  S: ParameterStore,
  C: ParameterCache,
{
  Ok(Json(service.create(&caller, request).await?))
}

pub async fn retrieve<S, C>(
  State(service): Service<S, C>,
  Caller(caller): Caller,
  Json(request): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>, ApiError>
where
  S: ParameterStore,
  C: ParameterCache,
{
  Ok(Json(service.retrieve(&caller, request).await?))
}

pub async fn update<S, C>(
  State(service): Service<S, C>,
  Caller(caller): Caller,
  Json(request): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>, ApiError>
where
  S: ParameterStore,
  C: ParameterCache,
{
  Ok(Json(service.update(&caller, request).await?))
}

pub async fn delete<S, C>(
  State(service): Service<S, C>,
  Caller(caller): Caller,
  Json(request): Json<DeleteRequest>,
) -> Result<Json<DeleteResponse>, ApiError>
where
  S: ParameterStore,
  C: ParameterCache,
{
  Ok(Json(service.delete(&caller, request).await?))
}

pub async fn list<S, C>(
  State(service): Service<S, C>,
  Caller(caller): Caller,
  Json(request): Json<ListRequest>,
) -> Result<Json<ListResponse>, ApiError>
where
  S: ParameterStore,
  C: ParameterCache,
{
  Ok(Json(service.list(&caller, request).await?))
}
