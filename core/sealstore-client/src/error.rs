//! Client error types.

use sealstore_crypto::CryptoError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the put/get pipelines.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A materials, keyring, or content transform failure. Deterministic;
    /// never retried.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The storage SDK reported a transport error, surfaced verbatim so
    /// the caller can decide whether to retry.
    #[error("storage I/O error: {0}")]
    Io(String),

    /// The fetched object carries no envelope metadata.
    #[error("object {0:?} is not client-encrypted")]
    NotEncrypted(String),
}

impl ClientError {
    /// Process exit code for CLI facades wrapping this client.
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::Crypto(CryptoError::Configuration(_))
            | ClientError::Crypto(CryptoError::LegacyRefused(_))
            | ClientError::NotEncrypted(_) => 2,
            ClientError::Crypto(CryptoError::WrapFailure(_))
            | ClientError::Crypto(CryptoError::UnwrapFailure(_))
            | ClientError::Crypto(CryptoError::TamperedEnvelope(_)) => 3,
            ClientError::Crypto(CryptoError::Authentication(_)) => 4,
            ClientError::Io(_) => 5,
        }
    }
}
