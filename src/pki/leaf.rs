//! Leaf TLS certificate issuance, status lookup, and revocation.
//!
//! Issuance creates a per-site role (always written — role creation is an
//! upsert at the backend, see [`crate::vault::VaultApi::write`]), requests
//! a certificate, and emits a chain file and a key file. The serial number
//! is the caller's only handle for later lookup and revocation; it is not
//! persisted here.

use chrono::DateTime;
use serde_json::Value;
use tracing::debug;

use super::ops::{self, RoleConfig, KEY_BITS, LEAF_ROLE_MAX_TTL};
use super::report::Report;
use crate::errors::{Error, Result};
use crate::vault::VaultApi;

/// A leaf TLS certificate/key pair issued under an intermediate CA.
#[derive(Debug, Clone)]
pub struct LeafCert {
    pub mount: String,
    pub role: String,
    pub common_name: String,
}

impl LeafCert {
    /// Pre-flight parameter validation, before any backend call.
    pub fn validate(&self) -> Result<()> {
        if self.mount.is_empty() {
            return Err(Error::Precondition { flag: "--mount" });
        }
        if self.role.is_empty() {
            return Err(Error::Precondition { flag: "--role" });
        }
        if self.common_name.is_empty() {
            return Err(Error::Precondition { flag: "--common-name" });
        }
        Ok(())
    }

    /// Issue a certificate and write the chain and key files.
    ///
    /// The chain file is the certificate followed by the issuing CA, each
    /// newline-terminated; the key file is the private key. Both are
    /// truncating writes; a failed write leaves any partial file on disk.
    ///
    /// Returns the issued serial number.
    pub async fn issue(
        &self,
        api: &dyn VaultApi,
        cert_path: &str,
        key_path: &str,
        report: &mut Report,
    ) -> Result<String> {
        self.validate()?;
        if cert_path.is_empty() {
            return Err(Error::Precondition { flag: "--cert-path" });
        }
        if key_path.is_empty() {
            return Err(Error::Precondition { flag: "--key-path" });
        }

        report.record(
            "Creating the TLS role:",
            ops::create_role(
                api,
                &self.mount,
                &self.role,
                &RoleConfig {
                    allowed_domains: None,
                    allow_subdomains: false,
                    allow_any_name: true,
                    key_bits: KEY_BITS,
                    max_ttl: Some(LEAF_ROLE_MAX_TTL.to_string()),
                },
            )
            .await,
        )?;

        let issued = report.record(
            "Issuing the TLS cert:",
            ops::issue_certificate(api, &self.mount, &self.role, &self.common_name).await,
        )?;
        debug!(serial = %issued.serial_number, "issued leaf certificate");

        let outcome = std::fs::write(
            cert_path,
            format!("{}\n{}\n", issued.certificate, issued.issuing_ca),
        )
        .map_err(|e| Error::io(format!("writing cert file '{}'", cert_path), e));
        report.record("Writing the TLS cert file:", outcome)?;

        let outcome = std::fs::write(key_path, format!("{}\n", issued.private_key))
            .map_err(|e| Error::io(format!("writing key file '{}'", key_path), e));
        report.record("Writing the TLS key file:", outcome)?;

        Ok(issued.serial_number)
    }
}

/// Look up a certificate by serial number and report its raw
/// `revocation_time`. The serial is assumed to exist; a missing entry is a
/// decode error, not a NO.
pub async fn check_revocation(
    api: &dyn VaultApi,
    mount: &str,
    serial_number: &str,
    report: &mut Report,
) -> Result<Value> {
    if mount.is_empty() {
        return Err(Error::Precondition { flag: "--mount" });
    }
    if serial_number.is_empty() {
        return Err(Error::Precondition { flag: "--serial-number" });
    }

    let revocation_time = ops::read_revocation_time(api, mount, serial_number).await?;
    report.push_value("TLS cert revocation time:", render_revocation_time(&revocation_time));
    Ok(revocation_time)
}

/// Revoke a certificate by serial number. SUCCESS requires a non-zero
/// revocation timestamp from Vault; revocation is one-way.
pub async fn revoke(
    api: &dyn VaultApi,
    mount: &str,
    serial_number: &str,
    report: &mut Report,
) -> Result<i64> {
    if mount.is_empty() {
        return Err(Error::Precondition { flag: "--mount" });
    }
    if serial_number.is_empty() {
        return Err(Error::Precondition { flag: "--serial-number" });
    }

    report.record(
        "Revoking the TLS cert:",
        ops::revoke_certificate(api, mount, serial_number).await,
    )
}

/// Render the raw revocation time, annotating non-zero epoch values with a
/// readable UTC timestamp. The zero sentinel is passed through untouched.
fn render_revocation_time(value: &Value) -> String {
    match value.as_i64() {
        Some(t) if t > 0 => match DateTime::from_timestamp(t, 0) {
            Some(when) => format!("{} ({})", t, when.to_rfc3339()),
            None => t.to_string(),
        },
        Some(t) => t.to_string(),
        None => match value.as_str() {
            Some(s) => s.to_string(),
            None => value.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_zero_sentinel_untouched() {
        assert_eq!(render_revocation_time(&json!(0)), "0");
    }

    #[test]
    fn test_render_epoch_annotated() {
        let rendered = render_revocation_time(&json!(1700000000));
        assert!(rendered.starts_with("1700000000 ("));
        assert!(rendered.contains("2023-11-14"));
    }

    #[test]
    fn test_render_non_numeric_passthrough() {
        assert_eq!(render_revocation_time(&json!("never")), "never");
    }
}
