//! Unified infrastructure error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::storage::StorageError;

/// Errors that stop the process: loading configuration, opening the store,
/// binding the listener.
///
/// Request-scoped failures never surface here. They are rendered as error
/// envelopes by the handlers (see [`ApiError`](crate::api::ApiError)).
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),
}
