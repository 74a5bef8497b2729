pub mod client;
pub mod types;

// -----------------------------------------------------------------------------

use crate::prelude::Result;
use crate::proxmox::types::{JobStatus, UniqueProcessId};
use async_trait::async_trait;

/// Single-shot query for the current status of a remote task.
///
/// Implementations must not retry on their own: a failed query is returned as
/// an error and the caller decides what to do with it. The returned future is
/// dropped when the caller gives up, which must abort any in-flight request.
///
#[async_trait]
pub trait JobStatusFetcher {
    async fn fetch(&self, job: &UniqueProcessId) -> Result<JobStatus>;
}
