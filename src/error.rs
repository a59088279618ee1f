//! Error type shared by every devpki operation.

use std::path::PathBuf;

use thiserror::Error;

/// Represents errors that can occur while building or writing the PKI.
///
/// Every variant except [`PkiError::Io`] is a cryptographic fault: generation
/// stops at the first one and nothing is retried.
#[derive(Debug, Error)]
pub enum PkiError {
    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error related to certificate operations.
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// A signature could not be produced or did not verify.
    #[error("Signature error: {0}")]
    SignatureError(String),

    /// Error from RSA operations.
    #[error("RSA error: {0}")]
    RsaError(String),

    /// Failure creating the output directory or writing a PEM file.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PkiError>;

impl From<der::Error> for PkiError {
    /// Converts a `der::Error` into a `PkiError`.
    fn from(err: der::Error) -> Self {
        PkiError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for PkiError {
    fn from(err: rsa::Error) -> Self {
        PkiError::RsaError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for PkiError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        PkiError::RsaError(err.to_string())
    }
}

impl From<pkcs8::Error> for PkiError {
    fn from(err: pkcs8::Error) -> Self {
        PkiError::RsaError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for PkiError {
    fn from(err: pkcs8::spki::Error) -> Self {
        PkiError::EncodingError(err.to_string())
    }
}

impl From<rsa::signature::Error> for PkiError {
    fn from(err: rsa::signature::Error) -> Self {
        PkiError::SignatureError(err.to_string())
    }
}

impl From<pem::PemError> for PkiError {
    fn from(err: pem::PemError) -> Self {
        PkiError::DecodingError(err.to_string())
    }
}
