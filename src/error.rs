use crate::proxmox::types::UniqueProcessId;
use derive_more::Display;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Defines the crate's custom error types.
///
/// The first four variants are the outcomes of waiting on a Proxmox task.
/// `TimedOut` and `Cancelled` are inconclusive: the task may still be running
/// on the server.
///
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to query status of task \"{job}\": {source}")]
    Query {
        job: UniqueProcessId,
        #[source]
        source: Box<Error>,
    },
    #[error("Task \"{job}\" failed to complete with exit code: {exit_code}")]
    JobFailed {
        job: UniqueProcessId,
        exit_code: String,
    },
    #[error("Timeout waiting for task \"{job}\" after {} milliseconds", .elapsed.as_millis())]
    TimedOut {
        job: UniqueProcessId,
        elapsed: Duration,
    },
    #[error("Cancelled waiting for task \"{job}\" after {} milliseconds", .elapsed.as_millis())]
    Cancelled {
        job: UniqueProcessId,
        elapsed: Duration,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Proxmox API error: {0} failed: status {1}, body: {2}")]
    Proxmox(ProxmoxError, reqwest::StatusCode, String),
    #[error("The server did not include a data object in the response")]
    NoData,
    #[error("Header convert error: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Failed to set logger: {0}")]
    Logger(#[from] tracing_log::log::SetLoggerError),
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tracing::dispatcher::SetGlobalDefaultError),
    #[error("IO error: {0}")]
    InputOutput(#[from] std::io::Error),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    /// Whether the error leaves the remote task in an unknown state.
    ///
    /// A timed out or cancelled wait says nothing about the task itself, which
    /// may still complete later. A `JobFailed` is a definite failure.
    ///
    pub fn is_inconclusive(&self) -> bool {
        matches!(self, Error::TimedOut { .. } | Error::Cancelled { .. })
    }
}

/// Represents the Proxmox API operation that failed.
///
#[derive(Debug, Display)]
pub enum ProxmoxError {
    TaskStatus,
}
