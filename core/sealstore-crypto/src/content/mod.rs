//! Content encryption strategies.
//!
//! One strategy per algorithm suite. The active GCM strategy is the only
//! one that encrypts; the legacy CBC and CTR strategies exist to read
//! objects written by older clients and refuse the write path.

mod gcm;
mod legacy;

pub use gcm::AesGcmContentStrategy;
pub use legacy::{AesCbcContentStrategy, AesCtrContentStrategy};

use std::sync::Arc;

use crate::error::{CryptoError, CryptoResult};
use crate::materials::{DecryptionMaterials, EncryptionMaterials};
use crate::random::SecureRandom;
use crate::suite::AlgorithmSuite;

/// Authenticated ciphertext produced by a content strategy.
///
/// The IV travels separately so the metadata strategy can encode it; the
/// authentication tag (when the suite has one) trails the ciphertext.
#[derive(Debug)]
pub struct EncryptedContent {
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl EncryptedContent {
    /// Ciphertext length, i.e. plaintext length plus the tag.
    pub fn ciphertext_length(&self) -> u64 {
        self.ciphertext.len() as u64
    }
}

/// Turns plaintext into (authenticated) ciphertext and back.
///
/// Strategies hold no per-request state; every call builds its own cipher
/// session, so one instance serves concurrent requests.
pub trait ContentCryptoStrategy: Send + Sync {
    fn encrypt_content(
        &self,
        materials: &EncryptionMaterials,
        plaintext: &[u8],
    ) -> CryptoResult<EncryptedContent>;

    /// Decrypts a full object body. No plaintext is released unless the
    /// whole stream authenticates (for suites that carry a tag).
    fn decrypt_content(
        &self,
        materials: &DecryptionMaterials,
        iv: &[u8],
        ciphertext: &[u8],
        tag_length_bits: usize,
    ) -> CryptoResult<Vec<u8>>;

    /// Decrypts a ciphertext slice that starts `offset` bytes into the
    /// object. Only seekable legacy suites support this.
    fn decrypt_content_range(
        &self,
        _materials: &DecryptionMaterials,
        _iv: &[u8],
        _ciphertext: &[u8],
        _offset: u64,
    ) -> CryptoResult<Vec<u8>> {
        Err(CryptoError::Configuration(
            "ranged decryption is not supported for this algorithm suite".to_string(),
        ))
    }
}

/// Selects the strategy for a stored object's suite.
pub fn strategy_for_suite(
    suite: AlgorithmSuite,
    random: Arc<dyn SecureRandom>,
) -> Box<dyn ContentCryptoStrategy> {
    match suite {
        AlgorithmSuite::AesGcm => Box::new(AesGcmContentStrategy::with_random(random)),
        AlgorithmSuite::AesCbc => Box::new(AesCbcContentStrategy),
        AlgorithmSuite::AesCtr => Box::new(AesCtrContentStrategy),
    }
}

/// Pulls the plaintext data key out of materials, checking it against the
/// suite's required length.
pub(crate) fn content_key<'a>(
    suite: AlgorithmSuite,
    data_key: Option<&'a crate::key::DataKey>,
    valid_lengths: &[usize],
) -> CryptoResult<&'a [u8]> {
    let key = data_key.ok_or_else(|| {
        CryptoError::Configuration("materials carry no plaintext data key".to_string())
    })?;
    if !valid_lengths.contains(&key.len()) {
        return Err(CryptoError::Configuration(format!(
            "data key length {} is not valid for suite {}",
            key.len(),
            suite.cipher_name()
        )));
    }
    Ok(key.as_bytes())
}
