//! AES-256-GCM content strategy (the active suite).

use std::sync::Arc;

use aes::cipher::consts::{U12, U13, U14, U15, U16};
use aes::Aes256;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, AesGcm, Nonce, TagSize};

use crate::content::{content_key, ContentCryptoStrategy, EncryptedContent};
use crate::error::{CryptoError, CryptoResult};
use crate::materials::{DecryptionMaterials, EncryptionMaterials};
use crate::random::{OsRandom, SecureRandom};
use crate::suite::AlgorithmSuite;

/// Streams an object body through AES-256-GCM.
///
/// A repeated IV under one data key is catastrophic for GCM, so every
/// encrypt draws a fresh 12-byte IV from the injected RNG and the data key
/// itself is single-use.
pub struct AesGcmContentStrategy {
    random: Arc<dyn SecureRandom>,
}

impl AesGcmContentStrategy {
    pub fn new() -> Self {
        Self::with_random(Arc::new(OsRandom))
    }

    pub fn with_random(random: Arc<dyn SecureRandom>) -> Self {
        Self { random }
    }
}

impl Default for AesGcmContentStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentCryptoStrategy for AesGcmContentStrategy {
    fn encrypt_content(
        &self,
        materials: &EncryptionMaterials,
        plaintext: &[u8],
    ) -> CryptoResult<EncryptedContent> {
        let suite = materials.suite();
        if suite != AlgorithmSuite::AesGcm {
            return Err(CryptoError::Configuration(format!(
                "GCM content strategy cannot encrypt for suite {}",
                suite.cipher_name()
            )));
        }
        let key = content_key(suite, materials.data_key(), &[suite.data_key_length()])?;

        let mut iv = vec![0u8; suite.iv_length()];
        self.random.fill(&mut iv);

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| CryptoError::Configuration("content data key must be 32 bytes".to_string()))?;
        // No content AAD: the key wrap already binds the cipher name.
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|_| CryptoError::WrapFailure("AES-GCM content encryption refused".to_string()))?;

        debug_assert_eq!(ciphertext.len(), plaintext.len() + suite.tag_length());
        Ok(EncryptedContent { iv, ciphertext })
    }

    fn decrypt_content(
        &self,
        materials: &DecryptionMaterials,
        iv: &[u8],
        ciphertext: &[u8],
        tag_length_bits: usize,
    ) -> CryptoResult<Vec<u8>> {
        let suite = materials.suite();
        let key = content_key(suite, materials.data_key(), &[suite.data_key_length()])?;
        if iv.len() != suite.iv_length() {
            return Err(CryptoError::TamperedEnvelope(format!(
                "GCM IV must be {} bytes, envelope carried {}",
                suite.iv_length(),
                iv.len()
            )));
        }
        if ciphertext.len() < tag_length_bits / 8 {
            return Err(CryptoError::Authentication(
                "ciphertext shorter than its authentication tag".to_string(),
            ));
        }

        match tag_length_bits {
            96 => open_with_tag::<U12>(key, iv, ciphertext),
            104 => open_with_tag::<U13>(key, iv, ciphertext),
            112 => open_with_tag::<U14>(key, iv, ciphertext),
            120 => open_with_tag::<U15>(key, iv, ciphertext),
            128 => open_with_tag::<U16>(key, iv, ciphertext),
            other => Err(CryptoError::TamperedEnvelope(format!(
                "invalid GCM tag length {other} bits"
            ))),
        }
    }
}

/// One-shot AEAD open for a single tag width. The library verifies the
/// tag before returning any plaintext, which is exactly the emission
/// gating the decrypt path requires.
fn open_with_tag<T: TagSize>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = AesGcm::<Aes256, U12, T>::new_from_slice(key)
        .map_err(|_| CryptoError::Configuration("content data key must be 32 bytes".to_string()))?;
    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| CryptoError::Authentication("content authentication tag mismatch".to_string()))
}
