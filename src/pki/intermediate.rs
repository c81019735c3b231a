//! Intermediate CA provisioning and status checking.
//!
//! Five sequential steps: mount the backend, generate a CSR, have the root
//! CA sign it, import the signed certificate, and point the mount's CA/CRL
//! access URLs at the Vault server. The CSR/signed-certificate pair is
//! transient; it lives only for the duration of one provisioning run.

use tracing::debug;

use super::ops::{self, INTERMEDIATE_MAX_TTL, PKI_BACKEND_TYPE};
use super::report::Report;
use super::CheckStatus;
use crate::errors::{Error, Result};
use crate::vault::{is_mounted, MountInput, MountTuneInput, VaultApi};

/// An intermediate certificate authority signed by the root CA.
#[derive(Debug, Clone)]
pub struct IntermediateCa {
    pub mount: String,
    pub root_mount: String,
    pub role: String,
    pub common_name: String,
}

/// Check results for the intermediate CA resources.
#[derive(Debug, Clone, Copy)]
pub struct IntermediateCaStatus {
    pub mount: CheckStatus,
    pub role: CheckStatus,
    pub url_config: CheckStatus,
}

impl IntermediateCa {
    /// Pre-flight parameter validation for provisioning, before any
    /// backend call.
    pub fn validate(&self) -> Result<()> {
        self.validate_check()?;
        if self.root_mount.is_empty() {
            return Err(Error::Precondition { flag: "--root-mount" });
        }
        Ok(())
    }

    /// Pre-flight validation for the read-only check, which never touches
    /// the root mount.
    pub fn validate_check(&self) -> Result<()> {
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

    /// Provision the intermediate CA. `base_url` is the externally
    /// reachable Vault URL the CA/CRL access URLs are derived from.
    ///
    /// A failure partway (e.g. signing against a root mount that is not a
    /// root CA) leaves the backend partially provisioned; a re-run
    /// tolerates that by re-checking the mount before acting.
    pub async fn provision(
        &self,
        api: &dyn VaultApi,
        base_url: &str,
        report: &mut Report,
    ) -> Result<()> {
        self.validate()?;

        let outcome = async {
            if !is_mounted(api, &self.mount).await? {
                debug!(mount = %self.mount, "mounting intermediate CA backend");
                api.mount(
                    &self.mount,
                    &MountInput {
                        backend_type: PKI_BACKEND_TYPE.to_string(),
                        description: "intermediate CA".to_string(),
                        config: MountTuneInput {
                            default_lease_ttl: None,
                            max_lease_ttl: Some(INTERMEDIATE_MAX_TTL.to_string()),
                        },
                    },
                )
                .await?;
            }
            Ok(())
        }
        .await;
        report.record("Creating the intermediate CA:", outcome)?;

        let csr = report.record(
            "Creating a CSR:",
            ops::generate_intermediate_csr(api, &self.mount, &self.common_name).await,
        )?;

        let signed_cert = report.record(
            "Signing the intermediate CSR with the root CA:",
            ops::sign_intermediate(api, &self.root_mount, &csr, &self.common_name).await,
        )?;

        report.record(
            "Importing the signed cert into the intermediate CA:",
            ops::set_signed_intermediate(api, &self.mount, &signed_cert).await,
        )?;

        let outcome = async {
            let (issuing_url, crl_url) = ops::ca_urls(base_url, &self.mount)?;
            debug!(%issuing_url, %crl_url, "configuring CA access URLs");
            ops::configure_ca_urls(api, &self.mount, &issuing_url, &crl_url).await
        }
        .await;
        report.record("Set the CA and CRL URLs for the intermediate CA:", outcome)?;

        Ok(())
    }

    /// Read-only status check. Each check is gated on the previous one:
    /// with no mount, the role and URL-configuration rows are UNKNOWN and
    /// the configuration read is never attempted.
    pub async fn check(
        &self,
        api: &dyn VaultApi,
        base_url: &str,
        report: &mut Report,
    ) -> Result<IntermediateCaStatus> {
        self.validate_check()?;

        let mounted = is_mounted(api, &self.mount).await?;
        let mount_status = CheckStatus::from_present(mounted);
        report.push("Intermediate CA backend is mounted:", mount_status.step());

        let role_status = if !mounted {
            CheckStatus::Unknown
        } else {
            CheckStatus::from_present(
                ops::has_role(api, &self.mount, &self.role, &self.common_name, true).await?,
            )
        };
        report.push("Intermediate CA role exists:", role_status.step());

        let url_status = if !mounted {
            CheckStatus::Unknown
        } else {
            let (expected_issuing, expected_crl) = ops::ca_urls(base_url, &self.mount)?;
            let (issuing, crl) = ops::read_ca_urls(api, &self.mount).await?;
            if issuing.iter().any(|u| u == &expected_issuing)
                && crl.iter().any(|u| u == &expected_crl)
            {
                CheckStatus::Satisfied
            } else {
                CheckStatus::Mismatched
            }
        };
        report.push("Intermediate CA backend is configured correctly:", url_status.step());

        Ok(IntermediateCaStatus {
            mount: mount_status,
            role: role_status,
            url_config: url_status,
        })
    }
}
