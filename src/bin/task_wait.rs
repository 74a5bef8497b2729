use clap::Parser;
use pve_tasks::cli::{Cli, Command};
use pve_tasks::config::Config;
use pve_tasks::prelude::*;
use pve_tasks::proxmox::client::ProxmoxClient;
use pve_tasks::telemetry;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

/// The main entry point for the task waiter.
///
#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: "cli", %error, inconclusive = error.is_inconclusive(), "Task wait failed");
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let subscriber = telemetry::get_subscriber(Level::INFO, std::io::stderr);
    telemetry::init_subscriber(subscriber)?;

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let api = Arc::new(
        ProxmoxClient::new(
            config.proxmox.url.clone(),
            config.proxmox.auth_header.clone(),
        )
        .accept_invalid_certs(config.proxmox.accept_invalid_certs),
    );

    match cli.command {
        Command::Status(task) => {
            let status = api.tasks(&task.node).fetch(&task.upid()).await?;
            println!(
                "{} state={:?} exit_code={} at={}",
                task.upid,
                status.state,
                status.exit_code.as_deref().unwrap_or("-"),
                status.timestamp
            );
        }
        Command::Wait {
            task,
            timeout_secs,
            interval_ms,
        } => {
            let timeout = timeout_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.tasks.timeout());
            let interval = interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.tasks.poll_interval());

            // Ctrl-C cancels the wait instead of killing the process.
            let ctx = Context::background();
            let signal_ctx = ctx.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!(target: "cli", "Interrupted, cancelling wait");
                    signal_ctx.cancel();
                }
            });

            tracing::info!(target: "cli", node = %task.node, upid = %task.upid, ?timeout, ?interval, "Waiting for task");
            api.tasks(&task.node)
                .wait_for_task(&ctx, &task.upid(), timeout, interval)
                .await?;
            println!("{} OK", task.upid);
        }
    }

    Ok(())
}
