//! Thin transport for the iTop-style JSON API.
//!
//! Each operation is an HTTP POST of a form body carrying the API
//! version, credentials and a `json_data` payload (the operation's
//! parameters with `operation` injected). Responses come back as raw
//! bytes; callers decode them with the typed schemas in
//! `domain::remote`. Fixed request timeout, no retries.

use crate::domain::ports::RemoteClient;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ItopClient {
    base_url: String,
    username: String,
    password: String,
    version: String,
    client: reqwest::Client,
}

impl ItopClient {
    pub fn new(
        base_url: String,
        username: String,
        password: String,
        version: String,
        timeout_seconds: u64,
        accept_invalid_certs: bool,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self {
            base_url,
            username,
            password,
            version,
            client,
        })
    }
}

#[async_trait]
impl RemoteClient for ItopClient {
    async fn request(&self, operation: &str, mut params: serde_json::Value) -> Result<Vec<u8>> {
        if let serde_json::Value::Object(map) = &mut params {
            map.insert(
                "operation".to_string(),
                serde_json::Value::String(operation.to_string()),
            );
        }
        let json_data = serde_json::to_string(&params)?;

        tracing::debug!("Remote call {} -> {}", operation, self.base_url);
        let response = self
            .client
            .post(&self.base_url)
            .form(&[
                ("version", self.version.as_str()),
                ("auth_user", self.username.as_str()),
                ("auth_pwd", self.password.as_str()),
                ("json_data", json_data.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            tracing::error!(
                "Remote API returned HTTP {} for {}: {}",
                status,
                operation,
                String::from_utf8_lossy(&body)
            );
            return Err(SyncError::HttpStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(body.to_vec())
    }
}
