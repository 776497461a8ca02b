use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dora_common::artifact::{ArtifactTracker, TempArtifact};
use dora_common::config::{ConfigSource, REMOTE_PORT};
use dora_common::error::{DoraError, Result};
use dora_common::model::{Addon, Connection, OperationResult};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, instrument};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT_SECS: u64 = 10;
const PING_TIMEOUT_SECS: u64 = 5;
const USER_AGENT_STRING: &str = "dora addon sync (Rust)";

/// Talks to the Dora.js service on the configured device.
///
/// The host is read from the config source on every call, so a host change made while
/// the process runs (e.g. during `watch`) takes effect on the next request.
#[derive(Clone)]
pub struct RemoteClient {
    client: Client,
    config: Arc<dyn ConfigSource>,
    port: u16,
}

impl RemoteClient {
    pub fn new(config: Arc<dyn ConfigSource>) -> Result<Self> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(config: Arc<dyn ConfigSource>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            config,
            port: REMOTE_PORT,
        })
    }

    /// Overrides the service port, which is otherwise fixed.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Base URL for the configured host, or a configuration error when none is set.
    pub fn endpoint(&self) -> Result<String> {
        match self.config.host() {
            Some(host) if !host.trim().is_empty() => Ok(self.endpoint_for(host.trim())),
            _ => Err(DoraError::HostNotSet),
        }
    }

    fn endpoint_for(&self, host: &str) -> String {
        format!("http://{}:{}", host, self.port)
    }

    /// Liveness check against the configured host. Never fails; an unset host is `false`.
    pub async fn is_reachable(&self) -> bool {
        match self.endpoint() {
            Ok(base) => self.ping(&base).await,
            Err(e) => {
                debug!("Reachability check skipped: {e}");
                false
            }
        }
    }

    /// Liveness check against a host that is not (yet) in the configuration.
    pub async fn is_host_reachable(&self, host: &str) -> bool {
        let base = self.endpoint_for(host);
        self.ping(&base).await
    }

    async fn ping(&self, base: &str) -> bool {
        let url = format!("{base}/ping");
        debug!("Pinging {url}");
        let response = match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(PING_TIMEOUT_SECS))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!("Ping to {url} failed: {e}");
                return false;
            }
        };
        if !response.status().is_success() {
            debug!("Ping to {url} returned HTTP {}", response.status());
            return false;
        }
        match response.text().await {
            Ok(body) => body == "pong",
            Err(e) => {
                debug!("Failed to read ping body from {url}: {e}");
                false
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn list_addons(&self) -> Result<Vec<Addon>> {
        let url = format!("{}/addon", self.endpoint()?);
        debug!("Fetching addon list from {url}");
        let response = self.get_ok(&url).await?;
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&url, "read response body", e))?;
        serde_json::from_str::<Vec<Addon>>(&body).map_err(|e| {
            error!("Malformed addon listing from {url}: {e}");
            DoraError::Transport(format!("Malformed addon listing from {url}: {e}"))
        })
    }

    /// `Disconnected` when no host is set or the device does not answer the ping.
    pub async fn connection(&self) -> Result<Connection> {
        if self.endpoint().is_err() || !self.is_reachable().await {
            return Ok(Connection::Disconnected);
        }
        Ok(Connection::Connected(self.list_addons().await?))
    }

    /// Streams the addon archive into a fresh temp artifact owned by the caller.
    ///
    /// On any failure the partially written artifact is dropped, which deletes it.
    #[instrument(skip(self, artifacts))]
    pub async fn download_addon(
        &self,
        uuid: &str,
        artifacts: &ArtifactTracker,
    ) -> Result<TempArtifact> {
        let url = format!("{}/addon/{}?pull", self.endpoint()?, uuid);
        debug!("Pulling addon {uuid} from {url}");
        let response = self.get_ok(&url).await?;

        let artifact = artifacts.create("dora-pull-")?;
        let mut file = tokio::fs::File::create(artifact.path()).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| transport_error(&url, "stream response body", e))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        debug!(
            "Saved {} bytes of addon {} to {}",
            written,
            uuid,
            artifact.path().display()
        );
        Ok(artifact)
    }

    #[instrument(skip(self))]
    pub async fn upload_addon(&self, path: &Path) -> Result<OperationResult> {
        let url = format!("{}/addon", self.endpoint()?);
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "addon.zip".to_string());
        debug!("Pushing {} ({} bytes) to {url}", path.display(), bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/zip")
            .map_err(|e| transport_error(&url, "build multipart body", e))?;
        let form = Form::new().part("file", part);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(&url, "send upload", e))?;
        let response = ensure_success(&url, response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&url, "read upload reply", e))?;
        let result = OperationResult::from_body(&body);
        debug!("Push finished: {result}");
        Ok(result)
    }

    async fn get_ok(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, "send request", e))?;
        ensure_success(url, response).await
    }
}

async fn ensure_success(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);
    if status.is_success() {
        return Ok(response);
    }
    let body_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read response body".to_string());
    error!("HTTP error {} for URL {}: {}", status, url, body_text);
    Err(DoraError::Transport(format!(
        "HTTP error {status} for URL {url}: {body_text}"
    )))
}

fn transport_error(url: &str, action: &str, e: reqwest::Error) -> DoraError {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "could not connect"
    } else {
        "failed"
    };
    error!("Failed to {action} for {url}: {kind}: {e}");
    DoraError::Transport(format!("Failed to {action} for {url} ({kind}): {e}"))
}

fn build_http_client(timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .build()
        .map_err(|e| DoraError::Transport(format!("Failed to build HTTP client: {e}")))
}
