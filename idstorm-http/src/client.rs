//! SCIM-style HTTP target

use crate::errors::HttpTargetError;
use crate::status::StatusMap;
use async_trait::async_trait;
use idstorm_config::ScimConfig;
use idstorm_core::{IdentityRecord, OperationKind, TargetOperations, TargetResponse, TransportError};
use reqwest::{Client, RequestBuilder};
use serde_json::json;
use std::error::Error as _;
use std::time::Duration;
use tracing::{debug, trace};

/// Provisioning endpoint reached through one shared connection pool
#[derive(Debug, Clone)]
pub struct ScimTarget {
    client: Client,
    base_url: String,
    status_map: StatusMap,
    timeout: Duration,
}

impl ScimTarget {
    /// Build the target; `timeout` bounds each request
    pub fn from_config(config: &ScimConfig, timeout: Duration) -> Result<Self, HttpTargetError> {
        let base_url = url::Url::parse(&config.base_url)
            .map_err(|e| HttpTargetError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(HttpTargetError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                config.base_url
            )));
        }

        debug!(
            base_url = %base_url,
            verify_tls = config.verify_tls,
            timeout_ms = timeout.as_millis() as u64,
            "Creating HTTP target"
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_tls)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            status_map: StatusMap::new(
                config.conflict_statuses.clone(),
                config.fatal_statuses.clone(),
            ),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn record_url(&self, uid: &str) -> String {
        format!("{}/{}", self.base_url, uid)
    }

    async fn send(&self, kind: OperationKind, request: RequestBuilder) -> TargetResponse {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout))?;

        let code = response.status().as_u16();
        let status = self.status_map.classify(kind, code);
        trace!(%kind, code, class = ?status.class, "HTTP response");
        Ok(status)
    }
}

#[async_trait]
impl TargetOperations for ScimTarget {
    fn name(&self) -> &str {
        "scim"
    }

    async fn create(&self, record: &IdentityRecord) -> TargetResponse {
        let payload = json!({
            "id": record.uid,
            "userName": record.display_name,
            "description": record.description,
        });
        let request = self.client.post(&self.base_url).json(&payload);
        self.send(OperationKind::Create, request).await
    }

    async fn update(&self, record: &IdentityRecord) -> TargetResponse {
        let payload = json!({ "description": record.description });
        let request = self.client.put(self.record_url(&record.uid)).json(&payload);
        self.send(OperationKind::Update, request).await
    }

    async fn delete(&self, record: &IdentityRecord) -> TargetResponse {
        let request = self.client.delete(self.record_url(&record.uid));
        self.send(OperationKind::Delete, request).await
    }
}

/// Reduce a reqwest failure to the transport taxonomy
fn transport_error(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(timeout.as_millis() as u64);
    }

    let detail = error_chain(err);
    if err.is_connect() {
        if let Some(io) = find_io_error(err) {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return TransportError::ConnectionRefused(detail);
            }
        }
        let lowered = detail.to_lowercase();
        if lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("handshake") {
            return TransportError::Tls(detail);
        }
        return TransportError::Connect(detail);
    }

    if err.is_request() || err.is_body() {
        return TransportError::Io(detail);
    }

    TransportError::Other(detail)
}

fn find_io_error<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a std::io::Error> {
    let mut source = Some(err);
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            return Some(io);
        }
        source = current.source();
    }
    None
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
