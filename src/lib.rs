//! # Certplane
//!
//! Certplane provisions and audits a layered PKI trust chain inside
//! HashiCorp Vault's PKI secrets engine: a root CA, one or more
//! intermediate CAs signed by the root, and leaf TLS certificate/key pairs
//! issued under an intermediate CA.
//!
//! ## Architecture
//!
//! ```text
//! CLI (clap) → PKI state machines → VaultApi trait → Vault HTTP API
//!                    ↓
//!              Step report (stdout)
//! ```
//!
//! ## Core Components
//!
//! - **Vault client**: a generic, path-based Vault API client (`reqwest`)
//!   behind the [`vault::VaultApi`] trait so the PKI core can be exercised
//!   against a fake backend.
//! - **PKI core**: idempotent provision/verify state machines for the root
//!   CA, intermediate CA, and leaf certificates, plus a shared teardown.
//! - **Report**: buffered, column-aligned per-step output that is always
//!   flushed before a fatal exit so partial progress stays visible.
//!
//! Every invocation is strictly sequential: one linear chain of Vault
//! calls, no retries, no rollback. Re-running a provisioning command is
//! safe because each step re-checks existence before acting.

pub mod cli;
pub mod config;
pub mod errors;
pub mod pki;
pub mod vault;

pub use config::VaultConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
