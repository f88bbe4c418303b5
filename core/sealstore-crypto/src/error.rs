//! Envelope encryption error types.

use thiserror::Error;

/// Result type for envelope encryption operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur while wrapping keys or transforming content.
///
/// All of these are deterministic: retrying the same inputs produces the
/// same outcome, so callers must not retry locally.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Wrong wrapping-key algorithm, unknown suite, or an operation the
    /// keyring/strategy configuration does not permit.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The underlying crypto primitive refused to wrap a data key.
    #[error("data key wrap failed: {0}")]
    WrapFailure(String),

    /// No encrypted data key could be unwrapped by any registered strategy.
    ///
    /// Per-candidate causes are folded into a single aggregate message so
    /// that no per-strategy oracle is exposed.
    #[error("unable to unwrap any encrypted data key: {0}")]
    UnwrapFailure(String),

    /// A structural check on the stored envelope failed: bad pseudo-data-key
    /// length byte, cipher-name mismatch, or tag length outside the valid set.
    #[error("envelope integrity check failed: {0}")]
    TamperedEnvelope(String),

    /// GCM tag verification failed on the object content.
    #[error("content authentication failed: {0}")]
    Authentication(String),

    /// The stored object uses a legacy algorithm and legacy decryption was
    /// not enabled on the client.
    #[error("legacy algorithm refused: {0}")]
    LegacyRefused(String),
}
