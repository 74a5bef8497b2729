use crate::prelude::Result;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Represents the configuration of the task waiter.
///
#[derive(Debug, Deserialize)]
pub struct Config {
    pub proxmox: ProxmoxEnv,
    #[serde(default)]
    pub tasks: TaskSettings,
}

impl Config {
    /// Loads the configuration from files and environment variables.
    ///
    /// Sources, from lowest to highest priority:
    ///
    /// * `base.yaml` in the configuration directory;
    /// * `local.yaml` or `production.yaml`, picked by `APP_ENVIRONMENT`;
    /// * `APP__*` environment variables, e.g. `APP__PROXMOX__URL`.
    ///
    /// The configuration directory is `APP_CONFIG_DIR`, or `configuration`
    /// relative to the working directory.
    ///
    pub fn from_env() -> Result<Self> {
        match dotenv::dotenv() {
            Ok(path) => tracing::info!(target: "config", ?path, ".env loaded."),
            Err(error) => tracing::debug!(target: "config", %error, "No .env loaded."),
        }

        let config_dir = std::env::var("APP_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("configuration"));
        let environment = std::env::var("APP_ENVIRONMENT")
            .map(|value| Environment::from(value.as_str()))
            .unwrap_or(Environment::Local);

        let config = config::Config::builder()
            .add_source(config::File::from(config_dir.join("base.yaml")).required(false))
            .add_source(config::File::from(config_dir.join(environment.as_filename())).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize::<Config>()?;

        tracing::info!(target: "config", ?config, "Configuration loaded.");

        Ok(config)
    }
}

// -----------------------------------------------------------------------------

/// All settings required to work with Proxmox.
///
#[derive(Debug, Clone, Deserialize)]
pub struct ProxmoxEnv {
    pub url: String,
    pub auth_header: SecretString,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Default timing of task waits.
///
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSettings {
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            poll_interval_ms: 1000,
        }
    }
}

impl TaskSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// -----------------------------------------------------------------------------

/// Represents the different environments the task waiter can run in.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    /// Returns the filename for the environment-specific configuration file.
    ///
    pub fn as_filename(&self) -> String {
        match self {
            Environment::Local => "local.yaml".to_owned(),
            Environment::Production => "production.yaml".to_owned(),
        }
    }
}

impl From<&str> for Environment {
    fn from(value: &str) -> Self {
        match serde_json::from_value::<Self>(serde_json::Value::String(value.to_lowercase())) {
            Ok(environment) => environment,
            Err(error) => {
                tracing::warn!(target: "config", value, ?error, "Incorrect environment format. Use either `local` or `production`.");
                Self::Local
            }
        }
    }
}
