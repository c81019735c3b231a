//! # Command Line Interface
//!
//! The `certplane` command tree: `init`, `check`, `generate`, `revoke`,
//! and `remove`, each selecting a PKI resource kind (`root-ca`,
//! `intermediate-ca`, `tls`) as a subcommand. Connection settings are
//! resolved once (environment, then flags) and passed into every handler;
//! the step report is flushed on both the success and the error path so
//! partial progress is always visible before a non-zero exit.

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::VaultConfig;
use crate::pki::{self, IntermediateCa, LeafCert, Report, RootCa};
use crate::vault::VaultHttpClient;

#[derive(Parser)]
#[command(name = "certplane")]
#[command(about = "Provision and audit a layered PKI trust chain in HashiCorp Vault")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault token used to authenticate every request
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Base URL of the Vault API (defaults to $VAULT_ADDR)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Path to a PEM client certificate for mTLS toward Vault
    #[arg(long, global = true)]
    pub client_cert: Option<String>,

    /// Path to the PEM private key matching --client-cert
    #[arg(long, global = true)]
    pub client_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the PKI resources represented by the subcommands
    Init {
        #[command(subcommand)]
        target: InitTarget,
    },

    /// Report the status of the PKI resources represented by the subcommands
    Check {
        #[command(subcommand)]
        target: CheckTarget,
    },

    /// Generate the PKI resources represented by the subcommands
    Generate {
        #[command(subcommand)]
        target: GenerateTarget,
    },

    /// Revoke the PKI resource represented by the subcommand
    Revoke {
        #[command(subcommand)]
        target: RevokeTarget,
    },

    /// Clear out the resources associated with the subcommands from Vault
    Remove {
        #[command(subcommand)]
        target: RemoveTarget,
    },
}

#[derive(Subcommand)]
pub enum InitTarget {
    /// Initialize a root CA in Vault
    #[command(
        long_about = "Initializes a root CA in Vault, creating a backend mount, a role, and a \
                      root cert. Requires the --common-name setting. Does not recreate something \
                      if it already exists. If you require a full reset of the mount, role, \
                      and/or cert, use the 'remove root-ca' command followed by an 'init \
                      root-ca' command."
    )]
    RootCa {
        /// The path in Vault to the root CA pki backend
        #[arg(long, default_value = "root-ca")]
        mount: String,

        /// The name of the role to use for operations on the root CA
        #[arg(long, default_value = "root-ca")]
        role: String,

        /// The common name to use for operations on the root CA
        #[arg(long, default_value = "")]
        common_name: String,
    },

    /// Initialize an intermediate CA in Vault
    #[command(
        long_about = "Initializes an intermediate CA in Vault, the end result being a new PKI \
                      backend with a CSR signed by the root CA imported into it and its CA/CRL \
                      access URLs configured."
    )]
    IntermediateCa {
        /// The path in Vault to the intermediate CA pki backend
        #[arg(long, default_value = "intermediate-ca")]
        mount: String,

        /// The path in Vault to the root CA pki backend
        #[arg(long, default_value = "root-ca")]
        root_mount: String,

        /// The name of the role to use for operations on the intermediate CA
        #[arg(long, default_value = "intermediate-ca")]
        role: String,

        /// The common name to use for operations on the intermediate CA
        #[arg(long, default_value = "")]
        common_name: String,
    },
}

#[derive(Subcommand)]
pub enum CheckTarget {
    /// Check the status of the root CA in Vault
    #[command(
        long_about = "Checks whether the root CA backend is mounted, whether the role exists, \
                      and whether the root certificate exists. Creates nothing; use 'init \
                      root-ca' for that. Checks whose prerequisite is absent report UNKNOWN."
    )]
    RootCa {
        /// The path in Vault to the root CA pki backend
        #[arg(long, default_value = "root-ca")]
        mount: String,

        /// The name of the role to use for operations on the root CA
        #[arg(long, default_value = "root-ca")]
        role: String,

        /// The common name to use for operations on the root CA
        #[arg(long, default_value = "")]
        common_name: String,
    },

    /// Check the status of the intermediate CA in Vault
    #[command(
        long_about = "Checks whether the intermediate CA backend is mounted, whether the role \
                      exists, and whether the CA/CRL access URLs are configured correctly. \
                      Creates nothing. If the backend is not mounted, the subsequent checks \
                      report UNKNOWN."
    )]
    IntermediateCa {
        /// The path in Vault to the intermediate CA pki backend
        #[arg(long, default_value = "intermediate-ca")]
        mount: String,

        /// The name of the role to use for operations on the intermediate CA
        #[arg(long, default_value = "intermediate-ca")]
        role: String,

        /// The common name to use for operations on the intermediate CA
        #[arg(long, default_value = "")]
        common_name: String,
    },

    /// Check the status of a TLS cert/key pair by its serial number
    Tls {
        /// The path in Vault to the pki backend the cert was issued from
        #[arg(long, default_value = "intermediate-ca")]
        mount: String,

        /// The serial number of the cert to look up
        #[arg(long, default_value = "")]
        serial_number: String,
    },
}

#[derive(Subcommand)]
pub enum GenerateTarget {
    /// Generate a new TLS cert/key pair
    #[command(
        long_about = "Generates a new TLS cert/key pair under the intermediate CA, writing the \
                      certificate chain and the private key to the given paths. The serial \
                      number printed afterwards is the only handle for later checks and \
                      revocation; record it."
    )]
    Tls {
        /// The path in Vault to the pki backend to issue from
        #[arg(long, default_value = "intermediate-ca")]
        mount: String,

        /// The name of the per-site role to issue under
        #[arg(long, default_value = "")]
        role: String,

        /// The common name for the issued cert
        #[arg(long, default_value = "")]
        common_name: String,

        /// The file the cert chain is written to
        #[arg(long, default_value = "")]
        cert_path: String,

        /// The file the private key is written to
        #[arg(long, default_value = "")]
        key_path: String,
    },
}

#[derive(Subcommand)]
pub enum RevokeTarget {
    /// Revoke a TLS cert/key pair by its serial number
    Tls {
        /// The path in Vault to the pki backend the cert was issued from
        #[arg(long, default_value = "intermediate-ca")]
        mount: String,

        /// The serial number of the cert to revoke
        #[arg(long, default_value = "")]
        serial_number: String,
    },
}

#[derive(Subcommand)]
pub enum RemoveTarget {
    /// Remove the root CA from Vault
    #[command(
        long_about = "Removes the root CA, its role, and its root cert from Vault by unmounting \
                      the root CA backend. Succeeds if the backend is already unmounted."
    )]
    RootCa {
        /// The path in Vault to the root CA pki backend
        #[arg(long, default_value = "root-ca")]
        mount: String,
    },

    /// Remove the intermediate CA from Vault
    #[command(
        long_about = "Removes the intermediate CA from Vault by unmounting its backend. \
                      Succeeds if the backend is already unmounted."
    )]
    IntermediateCa {
        /// The path in Vault to the intermediate CA pki backend
        #[arg(long, default_value = "intermediate-ca")]
        mount: String,
    },
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    initialise_logging(cli.verbose)?;

    let mut config = VaultConfig::from_env();
    config.apply_overrides(cli.api_url, cli.token, cli.client_cert, cli.client_key);
    config.validate()?;
    let client = VaultHttpClient::new(config)?;

    match cli.command {
        Commands::Init { target } => handle_init_command(target, &client).await,
        Commands::Check { target } => handle_check_command(target, &client).await,
        Commands::Generate { target } => handle_generate_command(target, &client).await,
        Commands::Revoke { target } => handle_revoke_command(target, &client).await,
        Commands::Remove { target } => handle_remove_command(target, &client).await,
    }
}

async fn handle_init_command(target: InitTarget, client: &VaultHttpClient) -> anyhow::Result<()> {
    let mut report = Report::new();
    let outcome = match target {
        InitTarget::RootCa { mount, role, common_name } => {
            RootCa { mount, role, common_name }.provision(client, &mut report).await
        }
        InitTarget::IntermediateCa { mount, root_mount, role, common_name } => {
            let base_url = client.base_url().to_string();
            IntermediateCa { mount, root_mount, role, common_name }
                .provision(client, &base_url, &mut report)
                .await
        }
    };
    report.flush();
    outcome?;
    Ok(())
}

async fn handle_check_command(target: CheckTarget, client: &VaultHttpClient) -> anyhow::Result<()> {
    let mut report = Report::new();
    let outcome = match target {
        CheckTarget::RootCa { mount, role, common_name } => {
            RootCa { mount, role, common_name }.check(client, &mut report).await.map(|_| ())
        }
        CheckTarget::IntermediateCa { mount, role, common_name } => {
            let base_url = client.base_url().to_string();
            IntermediateCa {
                mount,
                root_mount: String::new(),
                role,
                common_name,
            }
            .check(client, &base_url, &mut report)
            .await
            .map(|_| ())
        }
        CheckTarget::Tls { mount, serial_number } => {
            pki::leaf::check_revocation(client, &mount, &serial_number, &mut report)
                .await
                .map(|_| ())
        }
    };
    report.flush();
    outcome?;
    Ok(())
}

async fn handle_generate_command(
    target: GenerateTarget,
    client: &VaultHttpClient,
) -> anyhow::Result<()> {
    let GenerateTarget::Tls { mount, role, common_name, cert_path, key_path } = target;
    let mut report = Report::new();
    let outcome = LeafCert { mount, role, common_name }
        .issue(client, &cert_path, &key_path, &mut report)
        .await;
    report.flush();
    let serial_number = outcome?;
    println!();
    println!("Serial Number: {}", serial_number);
    Ok(())
}

async fn handle_revoke_command(
    target: RevokeTarget,
    client: &VaultHttpClient,
) -> anyhow::Result<()> {
    let RevokeTarget::Tls { mount, serial_number } = target;
    let mut report = Report::new();
    let outcome = pki::leaf::revoke(client, &mount, &serial_number, &mut report).await;
    report.flush();
    outcome?;
    Ok(())
}

async fn handle_remove_command(
    target: RemoveTarget,
    client: &VaultHttpClient,
) -> anyhow::Result<()> {
    let mut report = Report::new();
    let outcome = match target {
        RemoveTarget::RootCa { mount } => {
            pki::teardown(client, &mount, "Unmounting root CA backend:", &mut report).await
        }
        RemoveTarget::IntermediateCa { mount } => {
            pki::teardown(client, &mount, "Unmounting intermediate CA backend:", &mut report)
                .await
        }
    };
    report.flush();
    outcome?;
    Ok(())
}

fn initialise_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", default_level);
    }

    // Logs go to stderr; stdout is reserved for the step report.
    if tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .finish(),
    )
    .is_err()
    {
        tracing::debug!("logging already initialised");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_init_root_ca_defaults() {
        let cli = Cli::try_parse_from(["certplane", "init", "root-ca"]).unwrap();
        match cli.command {
            Commands::Init { target: InitTarget::RootCa { mount, role, common_name } } => {
                assert_eq!(mount, "root-ca");
                assert_eq!(role, "root-ca");
                assert!(common_name.is_empty());
            }
            _ => panic!("parsed into the wrong command"),
        }
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "certplane",
            "init",
            "intermediate-ca",
            "--common-name",
            "sub.example.org",
            "--root-mount",
            "root-ca",
            "--token",
            "s.abc",
            "--api-url",
            "https://vault.example.org:8200",
        ])
        .unwrap();
        assert_eq!(cli.token.as_deref(), Some("s.abc"));
        assert_eq!(cli.api_url.as_deref(), Some("https://vault.example.org:8200"));
        match cli.command {
            Commands::Init {
                target: InitTarget::IntermediateCa { mount, root_mount, common_name, .. },
            } => {
                assert_eq!(mount, "intermediate-ca");
                assert_eq!(root_mount, "root-ca");
                assert_eq!(common_name, "sub.example.org");
            }
            _ => panic!("parsed into the wrong command"),
        }
    }

    #[test]
    fn test_cli_parses_generate_tls() {
        let cli = Cli::try_parse_from([
            "certplane",
            "generate",
            "tls",
            "--role",
            "site-example-org",
            "--common-name",
            "example.org",
            "--cert-path",
            "/tmp/chain.pem",
            "--key-path",
            "/tmp/key.pem",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                target: GenerateTarget::Tls { mount, role, common_name, cert_path, key_path },
            } => {
                assert_eq!(mount, "intermediate-ca");
                assert_eq!(role, "site-example-org");
                assert_eq!(common_name, "example.org");
                assert_eq!(cert_path, "/tmp/chain.pem");
                assert_eq!(key_path, "/tmp/key.pem");
            }
            _ => panic!("parsed into the wrong command"),
        }
    }
}
