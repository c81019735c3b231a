//! # Configuration
//!
//! Connection settings for the Vault API, built once at process start from
//! environment variables and CLI flag overrides, then passed by reference
//! into every component. There is no ambient global configuration state.

use crate::errors::{Error, Result};

/// Default Vault address used when neither `VAULT_ADDR` nor `--api-url` is set.
pub const DEFAULT_VAULT_ADDR: &str = "http://localhost:8200";

/// Connection configuration for the Vault HTTP API.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Base URL of the Vault server, e.g. "https://vault.example.org:8200".
    pub address: String,

    /// Vault token sent as `X-Vault-Token` on every request.
    pub token: String,

    /// Optional path to a PEM client certificate for mTLS toward Vault.
    pub client_cert: Option<String>,

    /// Optional path to the PEM private key matching `client_cert`.
    pub client_key: Option<String>,

    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_VAULT_ADDR.to_string(),
            token: String::new(),
            client_cert: None,
            client_key: None,
            timeout: 30,
        }
    }
}

impl VaultConfig {
    /// Load the configuration from environment variables.
    ///
    /// - `VAULT_ADDR`: Vault server address
    /// - `VAULT_TOKEN`: authentication token
    /// - `CERTPLANE_CLIENT_CERT` / `CERTPLANE_CLIENT_KEY`: mTLS identity
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(address) = std::env::var("VAULT_ADDR") {
            if !address.is_empty() {
                config.address = address;
            }
        }
        if let Ok(token) = std::env::var("VAULT_TOKEN") {
            config.token = token;
        }
        config.client_cert = std::env::var("CERTPLANE_CLIENT_CERT").ok().filter(|v| !v.is_empty());
        config.client_key = std::env::var("CERTPLANE_CLIENT_KEY").ok().filter(|v| !v.is_empty());
        config
    }

    /// Apply CLI flag overrides on top of the environment-derived values.
    pub fn apply_overrides(
        &mut self,
        api_url: Option<String>,
        token: Option<String>,
        client_cert: Option<String>,
        client_key: Option<String>,
    ) {
        if let Some(url) = api_url {
            self.address = url;
        }
        if let Some(token) = token {
            self.token = token;
        }
        if let Some(cert) = client_cert {
            self.client_cert = Some(cert);
        }
        if let Some(key) = client_key {
            self.client_key = Some(key);
        }
    }

    /// Validate the configuration before any backend call.
    pub fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            return Err(Error::config("Vault address cannot be empty"));
        }
        url::Url::parse(&self.address)
            .map_err(|e| Error::config(format!("invalid Vault address '{}': {}", self.address, e)))?;
        // A client cert without its key (or the reverse) is always a mistake.
        if self.client_cert.is_some() != self.client_key.is_some() {
            return Err(Error::config(
                "--client-cert and --client-key must be provided together",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_env_values() {
        let mut config = VaultConfig {
            address: "http://env:8200".to_string(),
            token: "env-token".to_string(),
            ..VaultConfig::default()
        };
        config.apply_overrides(
            Some("http://flag:8200".to_string()),
            Some("flag-token".to_string()),
            None,
            None,
        );
        assert_eq!(config.address, "http://flag:8200");
        assert_eq!(config.token, "flag-token");
    }

    #[test]
    fn test_overrides_keep_env_values_when_absent() {
        let mut config = VaultConfig {
            address: "http://env:8200".to_string(),
            token: "env-token".to_string(),
            ..VaultConfig::default()
        };
        config.apply_overrides(None, None, None, None);
        assert_eq!(config.address, "http://env:8200");
        assert_eq!(config.token, "env-token");
    }

    #[test]
    fn test_validate_rejects_bad_address() {
        let config = VaultConfig { address: "not a url".to_string(), ..VaultConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_cert_without_key() {
        let config = VaultConfig {
            client_cert: Some("/tmp/cert.pem".to_string()),
            ..VaultConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
