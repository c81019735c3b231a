//! HTTP client for the Vault API.
//!
//! Provides an authenticated `reqwest`-based client implementing
//! [`VaultApi`]. Every request carries the configured token as
//! `X-Vault-Token`; an optional PEM client certificate/key pair is loaded
//! for mTLS toward Vault.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::api::{MountInfo, MountInput, MountTuneInput, MountTuneOutput, Secret, VaultApi};
use crate::config::VaultConfig;
use crate::errors::{Error, Result};

/// Authenticated HTTP client for the Vault API.
#[derive(Debug, Clone)]
pub struct VaultHttpClient {
    client: Client,
    config: VaultConfig,
}

impl VaultHttpClient {
    /// Create a new Vault client with the given configuration.
    pub fn new(config: VaultConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout));

        if let (Some(cert), Some(key)) = (&config.client_cert, &config.client_key) {
            let mut pem = std::fs::read(cert)
                .map_err(|e| Error::io(format!("reading client certificate '{}'", cert), e))?;
            let key_pem = std::fs::read(key)
                .map_err(|e| Error::io(format!("reading client key '{}'", key), e))?;
            pem.extend_from_slice(&key_pem);
            let identity = reqwest::Identity::from_pem(&pem)
                .map_err(|e| Error::backend("loading client identity", e))?;
            builder = builder.identity(identity);
        }

        let client =
            builder.build().map_err(|e| Error::backend("building HTTP client", e))?;

        Ok(Self { client, config })
    }

    /// The configured Vault base URL.
    pub fn base_url(&self) -> &str {
        &self.config.address
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.address.trim_end_matches('/'), path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("GET {}", url);
        self.client.get(url).header("X-Vault-Token", &self.config.token)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("POST {}", url);
        self.client.post(url).header("X-Vault-Token", &self.config.token)
    }

    fn delete_req(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("DELETE {}", url);
        self.client.delete(url).header("X-Vault-Token", &self.config.token)
    }

    async fn send(&self, request: RequestBuilder, verb: &str, path: &str) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| Error::backend(format!("{} {}", verb, path), e))
    }

    /// Turn a non-success Vault response into an error, surfacing the
    /// messages from Vault's `errors` array when present.
    async fn response_error(&self, path: &str, response: Response) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("errors").and_then(Value::as_array).map(|errors| {
                    errors.iter().filter_map(Value::as_str).collect::<Vec<_>>().join("; ")
                })
            })
            .filter(|m| !m.is_empty())
            .unwrap_or(body);
        Error::Http { status, path: path.to_string(), message }
    }

    /// Expect a success status with no meaningful body (sys endpoints).
    async fn expect_no_content(&self, path: &str, response: Response) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.response_error(path, response).await)
        }
    }

    async fn parse_secret(&self, path: &str, response: Response) -> Result<Option<Secret>> {
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => {
                let secret = response
                    .json::<Secret>()
                    .await
                    .map_err(|e| Error::backend(format!("decoding response from {}", path), e))?;
                Ok(Some(secret))
            }
            _ => Err(self.response_error(path, response).await),
        }
    }
}

/// Unwrap the `data` envelope Vault puts around sys responses; older
/// servers return the payload at the top level.
fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(ref obj) if obj.get("data").map(Value::is_object).unwrap_or(false) => {
            obj["data"].clone()
        }
        other => other,
    }
}

#[async_trait]
impl VaultApi for VaultHttpClient {
    async fn list_mounts(&self) -> Result<HashMap<String, MountInfo>> {
        let path = "sys/mounts";
        let response = self.send(self.get(path), "GET", path).await?;
        if !response.status().is_success() {
            return Err(self.response_error(path, response).await);
        }
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| Error::backend(format!("decoding response from {}", path), e))?;
        let listing = unwrap_data(body);
        let obj = match listing {
            Value::Object(obj) => obj,
            _ => return Err(Error::decode(path, "data")),
        };

        let mut mounts = HashMap::new();
        for (key, value) in obj {
            // The listing mixes mount entries with envelope metadata; only
            // objects carrying a backend type are mounts.
            if value.get("type").map(Value::is_string).unwrap_or(false) {
                let info: MountInfo =
                    serde_json::from_value(value).map_err(|_| Error::decode(path, "type"))?;
                mounts.insert(key, info);
            }
        }
        Ok(mounts)
    }

    async fn mount(&self, path: &str, input: &MountInput) -> Result<()> {
        let sys_path = format!("sys/mounts/{}", path);
        let response = self.send(self.post(&sys_path).json(input), "POST", &sys_path).await?;
        self.expect_no_content(&sys_path, response).await
    }

    async fn unmount(&self, path: &str) -> Result<()> {
        let sys_path = format!("sys/mounts/{}", path);
        let response = self.send(self.delete_req(&sys_path), "DELETE", &sys_path).await?;
        self.expect_no_content(&sys_path, response).await
    }

    async fn mount_config(&self, path: &str) -> Result<MountTuneOutput> {
        let sys_path = format!("sys/mounts/{}/tune", path);
        let response = self.send(self.get(&sys_path), "GET", &sys_path).await?;
        if !response.status().is_success() {
            return Err(self.response_error(&sys_path, response).await);
        }
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| Error::backend(format!("decoding response from {}", sys_path), e))?;
        serde_json::from_value(unwrap_data(body)).map_err(|_| Error::decode(sys_path, "data"))
    }

    async fn tune_mount(&self, path: &str, input: &MountTuneInput) -> Result<()> {
        let sys_path = format!("sys/mounts/{}/tune", path);
        let response = self.send(self.post(&sys_path).json(input), "POST", &sys_path).await?;
        self.expect_no_content(&sys_path, response).await
    }

    async fn read(&self, path: &str) -> Result<Option<Secret>> {
        let response = self.send(self.get(path), "GET", path).await?;
        self.parse_secret(path, response).await
    }

    async fn write(&self, path: &str, data: Value) -> Result<Option<Secret>> {
        let response = self.send(self.post(path).json(&data), "POST", path).await?;
        self.parse_secret(path, response).await
    }

    async fn delete(&self, path: &str) -> Result<Option<Secret>> {
        let response = self.send(self.delete_req(path), "DELETE", path).await?;
        self.parse_secret(path, response).await
    }
}
