use chrono::{DateTime, Utc};
use derive_more::Display;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

/// Generic wrapper for all successful Proxmox API responses.
///
/// Proxmox API wraps its successful responses in a JSON object with a single
/// `data` field. The field may be missing or `null` when the server has
/// nothing to report, which callers treat as an error.
///
/// # Example JSON
///
/// ```json
/// "data": {
///     ...
/// }
/// ```
///
#[derive(Deserialize)]
pub struct Response<T> {
    pub data: Option<T>,
}

/// Type-safe representation of a Proxmox Unique Process ID (`UPID`).
///
/// The identifier is treated as an opaque token. Its only transformation is
/// percent-encoding when it is placed into a URL path.
///
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueProcessId(String);

impl UniqueProcessId {
    /// Percent-encode the UPID to make it safe for use in a URL path
    ///
    /// For example, characters like `:` and `@` will be encoded to
    /// `%3A` and `%40` respectively.
    ///
    pub fn encoded(&self) -> String {
        utf8_percent_encode(&self.0, NON_ALPHANUMERIC).to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the inner string of the UPID.
    ///
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for UniqueProcessId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for UniqueProcessId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// -----------------------------------------------------------------------------

/// Exit code reported by Proxmox for a task that finished successfully.
///
pub const EXIT_CODE_OK: &str = "OK";

/// Run state of a Proxmox task.
///
/// Anything other than `running` is terminal, so values outside the known
/// vocabulary land in `Unknown` instead of failing deserialization.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Running,
    Stopped,
    #[serde(other)]
    Unknown,
}

/// Raw response from the Proxmox task status endpoint.
///
/// # Fields
///
/// * `status`: Current run state of the task.
/// * `exit_status`: Exit status of the task, present once the task has
///   stopped. Typically, `"OK"` on success.
/// * `task_type`: Kind of the task, e.g. `qmclone` or `vzdump`.
/// * `user`: User that started the task.
///
#[derive(Debug, Deserialize)]
pub struct TaskResponse {
    pub status: TaskState,
    #[serde(rename = "exitstatus")]
    pub exit_status: Option<String>,
    #[serde(rename = "type")]
    pub task_type: Option<String>,
    pub user: Option<String>,
}

/// Snapshot of a task's state at the moment it was queried.
///
/// Every poll produces a fresh snapshot; the `timestamp` only serves
/// diagnostics and never takes part in control decisions.
///
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatus {
    pub state: TaskState,
    pub exit_code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl JobStatus {
    /// Creates a snapshot stamped with the current time.
    ///
    pub fn new(state: TaskState, exit_code: Option<String>) -> Self {
        Self {
            state,
            exit_code,
            timestamp: Utc::now(),
        }
    }

    pub fn running() -> Self {
        Self::new(TaskState::Running, None)
    }

    pub fn stopped(exit_code: &str) -> Self {
        Self::new(TaskState::Stopped, Some(exit_code.to_owned()))
    }

    pub fn is_terminal(&self) -> bool {
        self.state != TaskState::Running
    }

    /// High-level classification of the snapshot.
    ///
    /// Only an exact `"OK"` exit code counts as success. A stopped task
    /// without any exit code is a failure with an empty code.
    ///
    pub fn classify(&self) -> TaskStatus {
        match (self.is_terminal(), self.exit_code.as_deref()) {
            (false, _) => TaskStatus::Pending,
            (true, Some(EXIT_CODE_OK)) => TaskStatus::Completed,
            (true, exit_code) => TaskStatus::Failed(exit_code.unwrap_or_default().to_owned()),
        }
    }
}

impl From<TaskResponse> for JobStatus {
    fn from(response: TaskResponse) -> Self {
        Self::new(response.status, response.exit_status)
    }
}

/// High-level status of a long-running asynchronous task in Proxmox.
///
#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed(String),
}
