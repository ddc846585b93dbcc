//! Core types and trait definitions for the Cascade parameter store.
//!
//! This crate is free of HTTP and database dependencies. It holds
//! the parameter model, the storage and cache abstractions, the hierarchical
//! resolver, and the [`service::ParameterService`] that ties them together.

pub mod cache;
pub mod caller;
pub mod error;
pub mod messages;
pub mod parameter;
pub mod resolve;
pub mod service;
pub mod store;

pub use caller::CallerContext;
pub use error::{Error, ErrorKind, Result};
pub use parameter::{NewParameter, Parameter};
pub use service::ParameterService;
