pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod proxmox;
pub mod tasks;
pub mod telemetry;

pub mod prelude {
    pub use crate::context::Context;
    pub use crate::error::{Error, ProxmoxError, Result};
    pub use crate::proxmox::JobStatusFetcher;
    pub use crate::tasks::{TaskWaiter, WaitOutcome};
}
