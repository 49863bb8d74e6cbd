//! Error taxonomy for the telemetry pipeline.

use crate::config::ConfigError;

/// Errors that can occur inside the telemetry pipeline.
///
/// None of these ever surface through [`crate::Telemetry::log`] — emission is
/// fire-and-forget for the host. They are returned from initialization and
/// logged on the internal paths.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A local event store operation failed.
    #[error("event store error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Checking out a pooled store connection failed.
    #[error("event store pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Creating the store connection pool failed.
    #[error(transparent)]
    PoolInit(#[from] beacon_db::PoolError),

    /// Setting up the event store schema failed.
    #[error(transparent)]
    Schema(#[from] beacon_db::SchemaError),

    /// JSON serialization of an envelope failed.
    #[error("event serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The upload transport failed (connect, timeout, protocol).
    #[error("upload transport error: {0}")]
    Network(#[from] reqwest::Error),

    /// The ingest endpoint answered with a non-success status.
    #[error("ingest endpoint returned status {0}")]
    HttpStatus(reqwest::StatusCode),

    /// The configuration was missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A process-wide telemetry context was already installed.
    #[error("telemetry already initialized")]
    AlreadyInitialized,
}
