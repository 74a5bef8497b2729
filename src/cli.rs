use crate::proxmox::types::UniqueProcessId;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "task-wait",
    version,
    about = "Query and wait for Proxmox VE tasks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the current status of a task once.
    Status(TaskArgs),
    /// Block until a task finishes, fails, or the timeout elapses.
    Wait {
        #[command(flatten)]
        task: TaskArgs,
        #[arg(
            short,
            long,
            help = "Maximum time to wait, in seconds",
            env = "TASK_TIMEOUT_SECS"
        )]
        timeout_secs: Option<u64>,
        #[arg(
            short,
            long,
            help = "Pause between two status queries, in milliseconds",
            env = "TASK_INTERVAL_MS"
        )]
        interval_ms: Option<u64>,
    },
}

#[derive(Debug, Args)]
pub struct TaskArgs {
    #[arg(short, long, help = "Node the task runs on", env = "PVE_NODE")]
    pub node: String,
    #[arg(help = "Unique process id of the task (UPID)")]
    pub upid: String,
}

impl TaskArgs {
    pub fn upid(&self) -> UniqueProcessId {
        UniqueProcessId::from(self.upid.as_str())
    }
}
