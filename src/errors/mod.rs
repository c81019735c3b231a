//! # Error Handling
//!
//! Error types for certplane, defined with `thiserror`. Every failure mode
//! falls into one of the buckets below; nothing is retried and nothing is
//! recovered locally, so errors propagate unchanged to the process boundary.

/// Custom result type for certplane operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for certplane
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A required CLI flag was empty. Raised before any Vault call is made.
    #[error("{flag} must be set")]
    Precondition { flag: &'static str },

    /// Vault could not be reached or the request could not be sent.
    #[error("Vault request failed: {context}")]
    Backend {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// Vault rejected the call with a non-success status.
    #[error("Vault returned status {status} for '{path}': {message}")]
    Http { status: u16, path: String, message: String },

    /// A Vault response was missing an expected field or carried the wrong
    /// kind of value. Never silently defaulted.
    #[error("malformed Vault response from '{path}': missing or invalid field '{field}'")]
    Decode { path: String, field: &'static str },

    /// Root certificate generation returned no secret at all.
    #[error("root CA certificate generation on '{mount}' produced no certificate data")]
    CertificateGeneration { mount: String },

    /// A revoke call completed without producing a non-zero revocation time.
    #[error("revocation of certificate '{serial}' did not produce a revocation time")]
    RevocationFailed { serial: String },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new backend transport error
    pub fn backend<S: Into<String>>(context: S, source: reqwest::Error) -> Self {
        Self::Backend { context: context.into(), source }
    }

    /// Create a new decode error for a field missing from a Vault response
    pub fn decode<S: Into<String>>(path: S, field: &'static str) -> Self {
        Self::Decode { path: path.into(), field }
    }

    /// Create a new I/O error with context
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }
}
