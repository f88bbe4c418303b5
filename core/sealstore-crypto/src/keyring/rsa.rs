//! Asymmetric RSA keyring.
//!
//! The public key wraps, the private key unwraps. The active strategy
//! wraps a pseudo-data-key that carries the content cipher name, so a
//! wrapped key cannot be replayed under a different content algorithm.

use std::sync::Arc;

use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::key::{DataKey, VALID_AES_KEY_LENGTHS};
use crate::keyring::{Keyring, UnwrapAttempts};
use crate::materials::{DecryptionMaterials, EncryptedDataKey, EncryptionMaterials};
use crate::random::{OsRandom, RandCompat, SecureRandom};

/// Provider id of the active RSA-OAEP (SHA-1, MGF1-SHA1) wrap.
pub const RSA_OAEP_SHA1_PROVIDER_ID: &str = "RSA-OAEP-SHA1";
/// Provider id of the legacy RSA-ECB OAEP-SHA256 wrap (bare data key).
pub const RSA_ECB_OAEP_SHA256_PROVIDER_ID: &str = "RSA/ECB/OAEPWithSHA-256AndMGF1Padding";

fn oaep_sha1() -> Oaep {
    Oaep::new::<Sha1>()
}

/// The legacy JCE transformation pairs a SHA-256 digest with MGF1-SHA1.
fn oaep_sha256_mgf1_sha1() -> Oaep {
    Oaep::new_with_mgf_hash::<Sha256, Sha1>()
}

/// A keyring holding an RSA wrapping key pair.
///
/// Built encrypt-only (public key) or full (private key, public derived).
pub struct RsaKeyring {
    public_key: RsaPublicKey,
    private_key: Option<RsaPrivateKey>,
    random: Arc<dyn SecureRandom>,
}

impl RsaKeyring {
    pub fn new(private_key: RsaPrivateKey) -> Self {
        Self::with_random(private_key, Arc::new(OsRandom))
    }

    pub fn with_random(private_key: RsaPrivateKey, random: Arc<dyn SecureRandom>) -> Self {
        Self {
            public_key: private_key.to_public_key(),
            private_key: Some(private_key),
            random,
        }
    }

    /// A keyring that can wrap but never unwrap.
    pub fn encrypt_only(public_key: RsaPublicKey) -> Self {
        Self {
            public_key,
            private_key: None,
            random: Arc::new(OsRandom),
        }
    }

    fn unwrap_oaep_sha1(
        &self,
        private_key: &RsaPrivateKey,
        materials: &DecryptionMaterials,
        edk: &EncryptedDataKey,
    ) -> CryptoResult<Vec<u8>> {
        let pseudo = Zeroizing::new(
            private_key
                .decrypt(oaep_sha1(), edk.ciphertext())
                .map_err(|_| CryptoError::UnwrapFailure("RSA-OAEP unwrap failed".to_string()))?,
        );
        parse_pseudo_data_key(materials, &pseudo)
    }

    fn unwrap_legacy_oaep_sha256(
        &self,
        private_key: &RsaPrivateKey,
        edk: &EncryptedDataKey,
    ) -> CryptoResult<Vec<u8>> {
        let data_key = private_key
            .decrypt(oaep_sha256_mgf1_sha1(), edk.ciphertext())
            .map_err(|_| CryptoError::UnwrapFailure("legacy RSA-OAEP unwrap failed".to_string()))?;
        if !VALID_AES_KEY_LENGTHS.contains(&data_key.len()) {
            return Err(CryptoError::UnwrapFailure(format!(
                "unwrapped data key has invalid length {}",
                data_key.len()
            )));
        }
        Ok(data_key)
    }
}

impl Keyring for RsaKeyring {
    fn on_encrypt(&self, mut materials: EncryptionMaterials) -> CryptoResult<EncryptionMaterials> {
        let suite = materials.suite();
        if suite.is_legacy() {
            return Err(CryptoError::Configuration(format!(
                "refusing to wrap a data key for legacy suite {}",
                suite.cipher_name()
            )));
        }

        if materials.data_key().is_none() {
            materials.set_data_key(DataKey::generate(suite.data_key_length(), self.random.as_ref()));
        }
        let data_key = materials.data_key().expect("data key generated above");

        let pseudo = build_pseudo_data_key(data_key.as_bytes(), suite.cipher_name());
        let mut rng = RandCompat(self.random.as_ref());
        let ciphertext = self
            .public_key
            .encrypt(&mut rng, oaep_sha1(), &pseudo)
            .map_err(|e| CryptoError::WrapFailure(format!("RSA-OAEP wrap refused: {e}")))?;

        materials
            .push_encrypted_data_key(EncryptedDataKey::new(RSA_OAEP_SHA1_PROVIDER_ID, ciphertext));
        Ok(materials)
    }

    fn on_decrypt(
        &self,
        mut materials: DecryptionMaterials,
        encrypted_data_keys: &[EncryptedDataKey],
    ) -> CryptoResult<DecryptionMaterials> {
        let private_key = self.private_key.as_ref().ok_or_else(|| {
            CryptoError::Configuration(
                "this RSA keyring was built encrypt-only and cannot unwrap".to_string(),
            )
        })?;

        let mut attempts = UnwrapAttempts::new();

        for edk in encrypted_data_keys {
            let provider_id = edk.key_provider_id();
            let legacy = match provider_id {
                RSA_OAEP_SHA1_PROVIDER_ID => false,
                RSA_ECB_OAEP_SHA256_PROVIDER_ID => true,
                _ => {
                    attempts.record_unknown_provider(provider_id);
                    continue;
                }
            };
            if legacy && !materials.legacy_decrypt_enabled() {
                attempts.record_legacy_refused(provider_id);
                continue;
            }

            let result = if legacy {
                self.unwrap_legacy_oaep_sha256(private_key, edk)
            } else {
                self.unwrap_oaep_sha1(private_key, &materials, edk)
            };
            match result {
                Ok(plaintext_key) => {
                    materials.set_data_key(DataKey::new(plaintext_key));
                    return Ok(materials);
                }
                Err(error @ CryptoError::TamperedEnvelope(_)) => return Err(error),
                Err(error) => attempts.record_failure(provider_id, &error),
            }
        }

        Err(attempts.into_error())
    }
}

/// Layout: `[len: u8][data key: len bytes][content cipher name: UTF-8]`.
fn build_pseudo_data_key(data_key: &[u8], cipher_name: &str) -> Zeroizing<Vec<u8>> {
    let name = cipher_name.as_bytes();
    let mut pseudo = Zeroizing::new(Vec::with_capacity(1 + data_key.len() + name.len()));
    pseudo.push(data_key.len() as u8);
    pseudo.extend_from_slice(data_key);
    pseudo.extend_from_slice(name);
    pseudo
}

/// Validates and splits a decrypted pseudo-data-key.
///
/// The length byte is read unsigned; values outside {16, 24, 32} are
/// rejected outright. The trailing cipher name is compared in constant
/// time against the suite the envelope declared.
fn parse_pseudo_data_key(
    materials: &DecryptionMaterials,
    pseudo: &[u8],
) -> CryptoResult<Vec<u8>> {
    let data_key_length = match pseudo.first() {
        Some(&len) => len as usize,
        None => {
            return Err(CryptoError::TamperedEnvelope(
                "empty pseudo data key".to_string(),
            ))
        }
    };
    if !VALID_AES_KEY_LENGTHS.contains(&data_key_length) {
        return Err(CryptoError::TamperedEnvelope(format!(
            "invalid data key length {data_key_length} in encrypted data key"
        )));
    }
    if pseudo.len() <= 1 + data_key_length {
        return Err(CryptoError::TamperedEnvelope(
            "pseudo data key is missing the content cipher name".to_string(),
        ));
    }

    let cipher_name = &pseudo[1 + data_key_length..];
    let expected = materials.suite().cipher_name().as_bytes();
    if !bool::from(cipher_name.ct_eq(expected)) {
        return Err(CryptoError::TamperedEnvelope(
            "the wrapped key was bound to a different content cipher; the object may be altered"
                .to_string(),
        ));
    }

    Ok(pseudo[1..1 + data_key_length].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EncryptionContext;
    use crate::suite::AlgorithmSuite;

    fn materials_for(suite: AlgorithmSuite) -> DecryptionMaterials {
        DecryptionMaterials::new(suite, EncryptionContext::new())
    }

    #[test]
    fn pseudo_data_key_roundtrip() {
        let dk = [0x42u8; 32];
        let pseudo = build_pseudo_data_key(&dk, "AES/GCM/NoPadding");
        let parsed = parse_pseudo_data_key(&materials_for(AlgorithmSuite::AesGcm), &pseudo).unwrap();
        assert_eq!(parsed, dk);
    }

    #[test]
    fn high_length_byte_is_read_unsigned() {
        // 0xA0 = 160 as unsigned; a signed read would see -96 and a naive
        // range check could misbehave.
        let mut pseudo = vec![0xA0u8];
        pseudo.extend_from_slice(&[0u8; 64]);
        let err =
            parse_pseudo_data_key(&materials_for(AlgorithmSuite::AesGcm), &pseudo).unwrap_err();
        assert!(matches!(err, CryptoError::TamperedEnvelope(_)));
    }

    #[test]
    fn cipher_name_mismatch_is_tampering() {
        let dk = [7u8; 32];
        let pseudo = build_pseudo_data_key(&dk, "AES/CTR/NoPadding");
        let err =
            parse_pseudo_data_key(&materials_for(AlgorithmSuite::AesGcm), &pseudo).unwrap_err();
        assert!(matches!(err, CryptoError::TamperedEnvelope(_)));
    }

    #[test]
    fn truncated_pseudo_key_rejected() {
        let err = parse_pseudo_data_key(&materials_for(AlgorithmSuite::AesGcm), &[32u8; 16])
            .unwrap_err();
        assert!(matches!(err, CryptoError::TamperedEnvelope(_)));
    }
}
