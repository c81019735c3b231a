//! Vault API types and the backend-client trait.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Result;

/// A logical Vault response: the secret envelope returned by read and by
/// writes that produce data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub request_id: Option<String>,

    #[serde(default)]
    pub lease_id: Option<String>,

    /// The payload. `None` when Vault returned an envelope without data.
    #[serde(default)]
    pub data: Option<serde_json::Map<String, Value>>,
}

impl Secret {
    /// Look up a field in the secret's data, if any.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(name))
    }
}

/// Parameters for mounting a new backend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MountInput {
    #[serde(rename = "type")]
    pub backend_type: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    pub config: MountTuneInput,
}

/// Lease tuning parameters for a mount.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MountTuneInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_lease_ttl: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lease_ttl: Option<String>,
}

/// Lease configuration reported by Vault for an existing mount.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MountTuneOutput {
    #[serde(default)]
    pub default_lease_ttl: Option<i64>,

    #[serde(default)]
    pub max_lease_ttl: Option<i64>,
}

/// A mounted backend as reported by the mount listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MountInfo {
    #[serde(rename = "type", default)]
    pub backend_type: String,

    #[serde(default)]
    pub description: String,
}

/// The Vault operations the PKI core consumes.
///
/// One trait instead of the original interface-per-capability sprawl; every
/// method maps onto a single Vault HTTP call and every error is propagated
/// verbatim to the caller. `write` must behave as an upsert for paths that
/// Vault treats that way (notably `{mount}/roles/{role}`) — the leaf
/// certificate issuer re-creates its role on every run and relies on this.
#[async_trait]
pub trait VaultApi: Send + Sync {
    /// List all mounted backends, keyed by path. Keys carry Vault's
    /// trailing `/`.
    async fn list_mounts(&self) -> Result<HashMap<String, MountInfo>>;

    /// Mount a new backend at `path`.
    async fn mount(&self, path: &str, input: &MountInput) -> Result<()>;

    /// Unmount the backend at `path`.
    async fn unmount(&self, path: &str) -> Result<()>;

    /// Read the lease configuration of the mount at `path`.
    async fn mount_config(&self, path: &str) -> Result<MountTuneOutput>;

    /// Tune the lease configuration of the mount at `path`.
    async fn tune_mount(&self, path: &str, input: &MountTuneInput) -> Result<()>;

    /// Read a secret. Returns `Ok(None)` when the path does not exist.
    async fn read(&self, path: &str) -> Result<Option<Secret>>;

    /// Write data to a path. Returns `Ok(None)` when Vault responds with
    /// no content.
    async fn write(&self, path: &str, data: Value) -> Result<Option<Secret>>;

    /// Delete the data at a path (not the mount itself).
    async fn delete(&self, path: &str) -> Result<Option<Secret>>;
}

/// Returns true if `path` is currently mounted as a backend.
///
/// Mount listing keys carry a trailing separator ("root-ca/"); exactly one
/// is stripped before comparing.
pub async fn is_mounted(api: &dyn VaultApi, path: &str) -> Result<bool> {
    let mounts = api.list_mounts().await?;
    Ok(mounts.keys().any(|m| m.strip_suffix('/').unwrap_or(m) == path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_field_lookup() {
        let secret: Secret = serde_json::from_value(serde_json::json!({
            "request_id": "abc",
            "data": {"certificate": "PEM"}
        }))
        .unwrap();
        assert_eq!(secret.field("certificate").and_then(Value::as_str), Some("PEM"));
        assert!(secret.field("missing").is_none());
    }

    #[test]
    fn test_mount_input_serializes_vault_field_names() {
        let input = MountInput {
            backend_type: "pki".to_string(),
            description: String::new(),
            config: MountTuneInput {
                default_lease_ttl: None,
                max_lease_ttl: Some("87600h".to_string()),
            },
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["type"], "pki");
        assert_eq!(value["config"]["max_lease_ttl"], "87600h");
        assert!(value.get("description").is_none());
        assert!(value["config"].get("default_lease_ttl").is_none());
    }
}
