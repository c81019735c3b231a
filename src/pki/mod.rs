//! # PKI Core
//!
//! The idempotent provision/verify state machines for the layered trust
//! chain: root CA, intermediate CA, and leaf TLS certificates, plus the
//! shared teardown. Every component works against the [`VaultApi`] trait
//! and reports per-step progress through a [`Report`].

pub mod intermediate;
pub mod leaf;
pub mod ops;
pub mod report;
pub mod root;

pub use intermediate::IntermediateCa;
pub use leaf::LeafCert;
pub use report::{Report, StepStatus};
pub use root::RootCa;

use crate::errors::{Error, Result};
use crate::vault::{is_mounted, VaultApi};

/// Result of one read-only sub-check.
///
/// Checks are three-valued: a resource can be present and correct, present
/// with the wrong configured values, or absent. `Unknown` is reported when
/// a prerequisite resource was absent and the check was never attempted.
/// The caller decides what, if anything, is fatal; the checkers themselves
/// only fail on genuine backend or decode errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Present with the expected configuration.
    Satisfied,
    /// Present, but the configured values do not match the expected ones.
    Mismatched,
    /// Not present.
    Absent,
    /// Prerequisite absent; the check was not attempted.
    Unknown,
}

impl CheckStatus {
    /// Map a boolean existence probe onto a check status.
    pub fn from_present(present: bool) -> Self {
        if present {
            CheckStatus::Satisfied
        } else {
            CheckStatus::Absent
        }
    }

    /// The report rendering of this status.
    pub fn step(self) -> StepStatus {
        match self {
            CheckStatus::Satisfied => StepStatus::Yes,
            CheckStatus::Mismatched | CheckStatus::Absent => StepStatus::No,
            CheckStatus::Unknown => StepStatus::Unknown,
        }
    }
}

/// Unmount a PKI backend if it is mounted.
///
/// Idempotent: an already-absent mount is a vacuous success. Only a failed
/// mount listing or a failed unmount call reports FAILURE.
pub async fn teardown(
    api: &dyn VaultApi,
    mount: &str,
    label: &str,
    report: &mut Report,
) -> Result<()> {
    if mount.is_empty() {
        return Err(Error::Precondition { flag: "--mount" });
    }
    let outcome = async {
        if is_mounted(api, mount).await? {
            api.unmount(mount).await?;
        }
        Ok(())
    }
    .await;
    report.record(label, outcome)
}
