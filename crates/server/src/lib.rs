//! HTTP surface for logbook
//!
//! - `POST /` ingests one JSON log record
//! - `GET /logs` runs a filtered, paginated query
//! - `GET /-/healthy` liveness
//! - `/ui` serves a static UI directory when one is configured

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod request;
pub mod response;

pub use config::{CliArgs, ServerConfig, StorageKind};
pub use error::ApiError;
pub use http::{build_router, LogServer};
