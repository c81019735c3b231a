//! Root CA provisioning and status checking.
//!
//! Three sequential idempotent steps: mount the PKI backend, create the
//! signing role, generate the self-signed root certificate. Each step
//! re-checks existence before acting, so re-running against an unchanged
//! backend is a no-op chain of SUCCESS rows.

use tracing::debug;

use super::ops::{self, RoleConfig, KEY_BITS, PKI_BACKEND_TYPE, ROOT_MAX_TTL};
use super::report::Report;
use super::CheckStatus;
use crate::errors::{Error, Result};
use crate::vault::{is_mounted, MountInput, MountTuneInput, VaultApi};

/// The root certificate authority: a mount, a signing role, and a
/// self-signed root certificate.
#[derive(Debug, Clone)]
pub struct RootCa {
    pub mount: String,
    pub role: String,
    pub common_name: String,
}

/// Check results for the three root CA resources.
#[derive(Debug, Clone, Copy)]
pub struct RootCaStatus {
    pub mount: CheckStatus,
    pub role: CheckStatus,
    pub certificate: CheckStatus,
}

impl RootCa {
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

    /// Idempotently ensure the root CA backend, role, and root certificate
    /// exist. The first failing step is recorded as FAILURE and aborts the
    /// run; the caller flushes the report before exiting.
    pub async fn provision(&self, api: &dyn VaultApi, report: &mut Report) -> Result<()> {
        self.validate()?;

        let outcome = async {
            if !is_mounted(api, &self.mount).await? {
                debug!(mount = %self.mount, "mounting root CA backend");
                api.mount(
                    &self.mount,
                    &MountInput {
                        backend_type: PKI_BACKEND_TYPE.to_string(),
                        description: String::new(),
                        config: MountTuneInput {
                            default_lease_ttl: None,
                            max_lease_ttl: Some(ROOT_MAX_TTL.to_string()),
                        },
                    },
                )
                .await?;
            }
            Ok(())
        }
        .await;
        report.record("Mounting root CA backend:", outcome)?;

        let outcome = async {
            // An existing role is accepted as-is; its parameters are not
            // repaired to match.
            if !ops::has_role(api, &self.mount, &self.role, &self.common_name, true).await? {
                debug!(mount = %self.mount, role = %self.role, "creating root CA role");
                ops::create_role(
                    api,
                    &self.mount,
                    &self.role,
                    &RoleConfig {
                        allowed_domains: Some(self.common_name.clone()),
                        allow_subdomains: true,
                        allow_any_name: true,
                        key_bits: KEY_BITS,
                        max_ttl: None,
                    },
                )
                .await?;
            }
            Ok(())
        }
        .await;
        report.record("Creating root CA role:", outcome)?;

        let outcome = async {
            if !ops::has_root_cert(api, &self.mount).await? {
                debug!(mount = %self.mount, "generating root CA certificate");
                ops::generate_root(api, &self.mount, &self.common_name).await?;
            }
            Ok(())
        }
        .await;
        report.record("Creating root CA cert:", outcome)?;

        Ok(())
    }

    /// Read-only status check. Never mutates, never treats a NO as fatal;
    /// only backend communication errors propagate.
    pub async fn check(&self, api: &dyn VaultApi, report: &mut Report) -> Result<RootCaStatus> {
        self.validate()?;

        let mounted = is_mounted(api, &self.mount).await?;
        let mount_status = CheckStatus::from_present(mounted);
        report.push("Root CA backend is mounted:", mount_status.step());

        let role_status = if !mounted {
            CheckStatus::Unknown
        } else {
            CheckStatus::from_present(
                ops::has_role(api, &self.mount, &self.role, &self.common_name, true).await?,
            )
        };
        report.push("Root CA role exists:", role_status.step());

        let certificate_status = if role_status != CheckStatus::Satisfied {
            CheckStatus::Unknown
        } else {
            CheckStatus::from_present(ops::has_root_cert(api, &self.mount).await?)
        };
        report.push("Root CA cert exists:", certificate_status.step());

        Ok(RootCaStatus {
            mount: mount_status,
            role: role_status,
            certificate: certificate_status,
        })
    }
}
