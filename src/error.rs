//! Error types for the mapping core

use thiserror::Error;

pub type Result<T, E = MappingError> = std::result::Result<T, E>;

/// Failures surfaced by the index build, the refresh cycle and configuration.
///
/// Read operations on the store never produce one of these; absence is
/// reported as `None`.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The model query channel rejected the query or failed mid-stream.
    #[error("model query failed: {0:#}")]
    QueryChannel(#[source] anyhow::Error),

    /// A model row could not be decoded into `{element: {id}, building__number}`.
    #[error("malformed model row: {0}")]
    MalformedRow(#[source] serde_json::Error),

    /// The telemetry request failed or returned a non-success status.
    #[error("telemetry fetch failed: {0:#}")]
    Fetch(#[source] anyhow::Error),

    /// The telemetry body was not the expected `{buildings: {...}}` document.
    #[error("telemetry payload could not be decoded: {0:#}")]
    Decode(#[source] anyhow::Error),

    /// The spreadsheet values request failed.
    #[error("spreadsheet fetch failed: {0:#}")]
    Sheet(#[source] anyhow::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The operation needs a built model index.
    #[error("mapping store is not ready (state: {0})")]
    NotReady(&'static str),

    #[error("refresh loop is already running")]
    AlreadyRunning,
}
