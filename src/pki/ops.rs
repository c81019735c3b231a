//! Low-level PKI operations over the Vault backend client.
//!
//! Free functions over `&dyn VaultApi`, one per PKI primitive. These carry
//! no sequencing logic; the provisioners in [`super::root`],
//! [`super::intermediate`], and [`super::leaf`] decide what runs when.

use serde_json::{json, Value};

use crate::errors::{Error, Result};
use crate::vault::{Secret, VaultApi};

/// Backend type for every mount this tool manages.
pub const PKI_BACKEND_TYPE: &str = "pki";

/// RSA key size for every key this tool asks Vault to generate.
pub const KEY_BITS: u64 = 4096;

/// Root CA mount max lease TTL and root certificate TTL (10 years).
pub const ROOT_MAX_TTL: &str = "87600h";

/// Intermediate CA mount max lease TTL and CSR TTL (3 years).
pub const INTERMEDIATE_MAX_TTL: &str = "26280h";

/// TTL the root imposes when signing an intermediate CSR (1 year). Shorter
/// than the CSR's own TTL on purpose; the root's ceiling wins.
pub const SIGNING_TTL: &str = "8760h";

/// Max TTL for per-site leaf roles (1 year).
pub const LEAF_ROLE_MAX_TTL: &str = "8760h";

/// Leaf certificate TTL (30 days).
pub const LEAF_TTL: &str = "720h";

/// Parameters for a signing role.
#[derive(Debug, Clone, Default)]
pub struct RoleConfig {
    pub allowed_domains: Option<String>,
    pub allow_subdomains: bool,
    pub allow_any_name: bool,
    pub key_bits: u64,
    pub max_ttl: Option<String>,
}

/// Create (or upsert) a signing role under a mount.
pub async fn create_role(
    api: &dyn VaultApi,
    mount: &str,
    role: &str,
    config: &RoleConfig,
) -> Result<()> {
    let mut data = json!({
        "allow_subdomains": config.allow_subdomains,
        "allow_any_name": config.allow_any_name,
        "key_bits": config.key_bits,
    });
    if let Some(domains) = &config.allowed_domains {
        data["allowed_domains"] = json!(domains);
    }
    if let Some(max_ttl) = &config.max_ttl {
        data["max_ttl"] = json!(max_ttl);
    }
    api.write(&format!("{}/roles/{}", mount, role), data).await?;
    Ok(())
}

/// Returns true if `role` exists under `mount` with `common_name` among its
/// allowed domains and the expected subdomain setting.
///
/// Vault encodes `allowed_domains` as a comma-joined string on older
/// servers and as a list on newer ones; both are accepted. An unreadable
/// role (404) is absent, not an error.
pub async fn has_role(
    api: &dyn VaultApi,
    mount: &str,
    role: &str,
    common_name: &str,
    allow_subdomains: bool,
) -> Result<bool> {
    let secret = match api.read(&format!("{}/roles/{}", mount, role)).await? {
        Some(secret) => secret,
        None => return Ok(false),
    };
    let domains_match = match secret.field("allowed_domains") {
        Some(Value::String(s)) => s.split(',').any(|d| d.trim() == common_name),
        Some(Value::Array(list)) => {
            list.iter().filter_map(Value::as_str).any(|d| d == common_name)
        }
        _ => false,
    };
    let subdomains_match =
        secret.field("allow_subdomains").and_then(Value::as_bool) == Some(allow_subdomains);
    Ok(domains_match && subdomains_match)
}

/// Returns true if a CA certificate has been generated on `mount`.
///
/// There is no direct "has root cert" primitive; the mount's own CA entry
/// is readable once generation has happened.
pub async fn has_root_cert(api: &dyn VaultApi, mount: &str) -> Result<bool> {
    let secret = match api.read(&format!("{}/cert/ca", mount)).await? {
        Some(secret) => secret,
        None => return Ok(false),
    };
    Ok(secret
        .field("certificate")
        .and_then(Value::as_str)
        .map(|c| !c.is_empty())
        .unwrap_or(false))
}

/// Generate a self-signed root certificate on `mount`.
///
/// A missing secret is a hard failure, not an empty success; Vault keeps
/// the generated key internal and only ever does this once per mount.
pub async fn generate_root(api: &dyn VaultApi, mount: &str, common_name: &str) -> Result<Secret> {
    let path = format!("{}/root/generate/internal", mount);
    let secret = api
        .write(
            &path,
            json!({
                "common_name": common_name,
                "ttl": ROOT_MAX_TTL,
                "key_bits": KEY_BITS,
            }),
        )
        .await?;
    secret.ok_or_else(|| Error::CertificateGeneration { mount: mount.to_string() })
}

/// Generate an intermediate CSR on `mount` and return the PEM CSR.
pub async fn generate_intermediate_csr(
    api: &dyn VaultApi,
    mount: &str,
    common_name: &str,
) -> Result<String> {
    let path = format!("{}/intermediate/generate/internal", mount);
    let secret = api
        .write(
            &path,
            json!({
                "common_name": common_name,
                "ttl": INTERMEDIATE_MAX_TTL,
                "key_bits": KEY_BITS,
            }),
        )
        .await?
        .ok_or_else(|| Error::decode(&path, "data"))?;
    required_string(&secret, &path, "csr")
}

/// Have the root CA at `root_mount` sign an intermediate CSR, returning
/// the signed PEM certificate.
pub async fn sign_intermediate(
    api: &dyn VaultApi,
    root_mount: &str,
    csr: &str,
    common_name: &str,
) -> Result<String> {
    let path = format!("{}/root/sign-intermediate", root_mount);
    let secret = api
        .write(
            &path,
            json!({
                "csr": csr,
                "common_name": common_name,
                "ttl": SIGNING_TTL,
                "format": "pem",
            }),
        )
        .await?
        .ok_or_else(|| Error::decode(&path, "data"))?;
    required_string(&secret, &path, "certificate")
}

/// Import a signed certificate back into the intermediate mount.
pub async fn set_signed_intermediate(
    api: &dyn VaultApi,
    mount: &str,
    certificate: &str,
) -> Result<()> {
    api.write(
        &format!("{}/intermediate/set-signed", mount),
        json!({ "certificate": certificate }),
    )
    .await?;
    Ok(())
}

/// Derive the issuing-certificate and CRL distribution URLs for a mount
/// from the Vault base URL: `{scheme}://{host}:{port}/v1/{mount}/{ca,crl}`.
pub fn ca_urls(base_url: &str, mount: &str) -> Result<(String, String)> {
    let parsed = url::Url::parse(base_url)
        .map_err(|e| Error::config(format!("invalid Vault URL '{}': {}", base_url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::config(format!("Vault URL '{}' has no host", base_url)))?;
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| Error::config(format!("Vault URL '{}' has no port", base_url)))?;
    let base = format!("{}://{}:{}", parsed.scheme(), host, port);
    Ok((format!("{}/v1/{}/ca", base, mount), format!("{}/v1/{}/crl", base, mount)))
}

/// Point a mount's issuing-certificate and CRL distribution URLs at the
/// given locations.
pub async fn configure_ca_urls(
    api: &dyn VaultApi,
    mount: &str,
    issuing_url: &str,
    crl_url: &str,
) -> Result<()> {
    api.write(
        &format!("{}/config/urls", mount),
        json!({
            "issuing_certificates": [issuing_url],
            "crl_distribution_points": [crl_url],
        }),
    )
    .await?;
    Ok(())
}

/// Read a mount's configured URL lists. A missing or mis-shaped config
/// document is a decode error; the caller compares the values.
pub async fn read_ca_urls(
    api: &dyn VaultApi,
    mount: &str,
) -> Result<(Vec<String>, Vec<String>)> {
    let path = format!("{}/config/urls", mount);
    let secret = api.read(&path).await?.ok_or_else(|| Error::decode(&path, "data"))?;
    let issuing = string_list(&secret, &path, "issuing_certificates")?;
    let crl = string_list(&secret, &path, "crl_distribution_points")?;
    Ok((issuing, crl))
}

/// A leaf certificate as issued by Vault.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub certificate: String,
    pub issuing_ca: String,
    pub private_key: String,
    pub serial_number: String,
}

/// Issue a leaf certificate from `mount/role`. Every field must be present;
/// a partial certificate is never accepted.
pub async fn issue_certificate(
    api: &dyn VaultApi,
    mount: &str,
    role: &str,
    common_name: &str,
) -> Result<IssuedCertificate> {
    let path = format!("{}/issue/{}", mount, role);
    let secret = api
        .write(
            &path,
            json!({
                "common_name": common_name,
                "ttl": LEAF_TTL,
                "format": "pem",
            }),
        )
        .await?
        .ok_or_else(|| Error::decode(&path, "data"))?;
    Ok(IssuedCertificate {
        certificate: required_string(&secret, &path, "certificate")?,
        issuing_ca: required_string(&secret, &path, "issuing_ca")?,
        private_key: required_string(&secret, &path, "private_key")?,
        serial_number: required_string(&secret, &path, "serial_number")?,
    })
}

/// Look up an issued certificate by serial number and return its raw
/// `revocation_time`. The zero sentinel means "not revoked" and is left to
/// the caller to interpret.
pub async fn read_revocation_time(
    api: &dyn VaultApi,
    mount: &str,
    serial_number: &str,
) -> Result<Value> {
    let path = format!("{}/cert/{}", mount, serial_number);
    let secret = api.read(&path).await?.ok_or_else(|| Error::decode(&path, "data"))?;
    secret
        .field("revocation_time")
        .cloned()
        .ok_or_else(|| Error::decode(&path, "revocation_time"))
}

/// Revoke a certificate by serial number. Revocation must produce a
/// non-zero timestamp to count as successful.
pub async fn revoke_certificate(
    api: &dyn VaultApi,
    mount: &str,
    serial_number: &str,
) -> Result<i64> {
    let path = format!("{}/revoke", mount);
    let secret = api
        .write(&path, json!({ "serial_number": serial_number }))
        .await?
        .ok_or_else(|| Error::RevocationFailed { serial: serial_number.to_string() })?;
    let revocation_time = secret
        .field("revocation_time")
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::RevocationFailed { serial: serial_number.to_string() })?;
    if revocation_time == 0 {
        return Err(Error::RevocationFailed { serial: serial_number.to_string() });
    }
    Ok(revocation_time)
}

fn string_list(secret: &Secret, path: &str, field: &'static str) -> Result<Vec<String>> {
    match secret.field(field) {
        Some(Value::Array(list)) => {
            Ok(list.iter().filter_map(Value::as_str).map(str::to_string).collect())
        }
        // Single-URL configs come back as a bare string on some servers.
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        _ => Err(Error::decode(path, field)),
    }
}

fn required_string(secret: &Secret, path: &str, field: &'static str) -> Result<String> {
    secret
        .field(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::decode(path, field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ca_urls_from_explicit_port() {
        let (issuing, crl) = ca_urls("http://localhost:8200", "intermediate-ca").unwrap();
        assert_eq!(issuing, "http://localhost:8200/v1/intermediate-ca/ca");
        assert_eq!(crl, "http://localhost:8200/v1/intermediate-ca/crl");
    }

    #[test]
    fn test_ca_urls_fill_in_default_port() {
        let (issuing, _) = ca_urls("https://vault.example.org", "intermediate-ca").unwrap();
        assert_eq!(issuing, "https://vault.example.org:443/v1/intermediate-ca/ca");
    }

    #[test]
    fn test_ca_urls_discard_path_component() {
        let (_, crl) = ca_urls("https://vault.example.org:8200/ui", "pki-int").unwrap();
        assert_eq!(crl, "https://vault.example.org:8200/v1/pki-int/crl");
    }

    #[test]
    fn test_ca_urls_reject_garbage() {
        assert!(ca_urls("not a url", "pki").is_err());
    }
}
