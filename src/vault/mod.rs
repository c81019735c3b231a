//! # Vault Backend Client
//!
//! A generic, path-based client for the Vault HTTP API. The [`VaultApi`]
//! trait is the seam between the PKI core and Vault: production code uses
//! [`VaultHttpClient`], tests substitute an in-memory fake.

pub mod api;
pub mod client;

pub use api::{
    is_mounted, MountInfo, MountInput, MountTuneInput, MountTuneOutput, Secret, VaultApi,
};
pub use client::VaultHttpClient;
