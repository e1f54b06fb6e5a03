//! # students-api
//!
//! A small JSON service for student records, backed by SQLite.
//!
//! ## Layers
//!
//! - [`api`]: one handler per endpoint; decode, validate, one storage call,
//!   encode.
//! - [`storage`]: the [`Storage`](storage::Storage) trait with a SQLite
//!   implementation and an in-memory one for tests.
//! - [`envelope`]: the JSON error shape every failure uses.
//! - [`Router`] / [`Server`]: radix-tree routing via [`matchit`] and a
//!   hyper server with graceful shutdown.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use students_api::api::{self, AppState};
//! use students_api::storage::SqliteStore;
//! use students_api::validate::Validator;
//! use students_api::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), students_api::Error> {
//!     let store = Arc::new(SqliteStore::open("storage/storage.db")?);
//!     let app = api::routes(AppState::new(store, Validator::new()));
//!
//!     Server::bind("localhost:8082").await?.serve(app).await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod api;
pub mod config;
pub mod envelope;
pub mod health;
pub mod storage;
pub mod student;
pub mod validate;

pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::{DEFAULT_GRACE_PERIOD, DEFAULT_MAX_BODY_BYTES, Server};
pub use status::Status;
