use crate::context::Context;
use crate::prelude::{Error, ProxmoxError, Result};
use crate::proxmox::JobStatusFetcher;
use crate::proxmox::types::*;
use crate::tasks::TaskWaiter;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// HTTP client for the Proxmox VE API built on `reqwest`.
///
/// Holds the connection settings and lazily builds the underlying client on
/// the first request.
///
pub struct ProxmoxClient {
    client: OnceCell<Client>,
    url: String,
    auth_header: SecretString,
    accept_invalid_certs: bool,
}

impl ProxmoxClient {
    /// Creates a new instance of the Proxmox client.
    ///
    /// # Arguments
    ///
    /// * `url`: URL of the Proxmox API, e.g. `https://pve:8006/api2/json`.
    /// * `auth_header`: The full, pre-formatted authorization header string.
    ///
    pub fn new(url: String, auth_header: SecretString) -> Self {
        Self {
            client: OnceCell::new(),
            url: url.trim_end_matches('/').to_owned(),
            auth_header,
            accept_invalid_certs: false,
        }
    }

    /// Accepts self-signed or otherwise invalid TLS certificates, as served
    /// by a fresh Proxmox VE install. Off unless enabled.
    ///
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Returns a client for the task endpoints of a single node.
    ///
    pub fn tasks(self: &Arc<Self>, node: &str) -> TaskClient {
        TaskClient {
            api: Arc::clone(self),
            node: node.to_owned(),
        }
    }

    /// Lazily initializes and returns a reference to the `reqwest::Client`.
    ///
    async fn get_client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                let mut auth_header = HeaderValue::from_str(self.auth_header.expose_secret())?;
                auth_header.set_sensitive(true);

                let mut headers = HeaderMap::new();
                headers.insert(AUTHORIZATION, auth_header);

                Client::builder()
                    .default_headers(headers)
                    .danger_accept_invalid_certs(self.accept_invalid_certs)
                    .use_rustls_tls()
                    .build()
                    .map_err(Error::from)
            })
            .await
    }

    /// Generic helper method to perform a `GET` request to the Proxmox API.
    ///
    /// # Arguments
    ///
    /// * `path`: API endpoint path.
    /// * `error_var`: Specific error to use if the API call fails.
    ///
    /// # Returns
    ///
    /// Deserialized `data` object of the response. A response without it is
    /// an [`Error::NoData`].
    ///
    async fn get<D>(&self, path: &str, error_var: ProxmoxError) -> Result<D>
    where
        for<'de> D: Deserialize<'de>,
    {
        let client = self.get_client().await?;
        let url = format!("{}{}", self.url, path);

        let response = client.request(Method::GET, &url).send().await?;

        match response.status() {
            status if status.is_success() => response
                .json::<Response<D>>()
                .await?
                .data
                .ok_or(Error::NoData),
            status => {
                let text = response.text().await?;
                Err(Error::Proxmox(error_var, status, text))
            }
        }
    }
}

// -----------------------------------------------------------------------------

/// Task endpoints of one Proxmox node.
///
#[derive(Clone)]
pub struct TaskClient {
    api: Arc<ProxmoxClient>,
    node: String,
}

impl TaskClient {
    pub fn node(&self) -> &str {
        &self.node
    }

    /// Waits for a task on this node to complete.
    ///
    /// # Arguments
    ///
    /// * `ctx`: Ambient context, cancelling it aborts the wait.
    /// * `upid`: Task to wait for.
    /// * `timeout`: Upper bound for the whole wait.
    /// * `delay`: Pause between two status queries.
    ///
    pub async fn wait_for_task(
        &self,
        ctx: &Context,
        upid: &UniqueProcessId,
        timeout: Duration,
        delay: Duration,
    ) -> Result<()> {
        TaskWaiter::new(Arc::new(self.clone()))
            .wait(ctx, upid, timeout, delay)
            .await
    }
}

#[async_trait]
impl JobStatusFetcher for TaskClient {
    async fn fetch(&self, job: &UniqueProcessId) -> Result<JobStatus> {
        let path = format!("/nodes/{}/tasks/{}/status", self.node, job.encoded());
        let data: TaskResponse = self.api.get(&path, ProxmoxError::TaskStatus).await?;
        tracing::trace!(
            target: "proxmox",
            %job,
            state = ?data.status,
            exit_status = ?data.exit_status,
            task_type = ?data.task_type,
            user = ?data.user,
            "Task status received"
        );

        Ok(data.into())
    }
}
