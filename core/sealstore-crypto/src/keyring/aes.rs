//! Symmetric AES keyring.
//!
//! Wraps data keys with AES-GCM (the active strategy) and unwraps the two
//! provider ids that historically appeared alongside it: RFC 3394 AES key
//! wrap and raw AES-ECB.

use std::sync::Arc;

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::consts::U12;
use aes::cipher::BlockDecryptMut;
use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce};
use aes_kw::{KekAes128, KekAes192, KekAes256};

use crate::error::{CryptoError, CryptoResult};
use crate::key::{AesWrappingKey, DataKey};
use crate::keyring::{Keyring, UnwrapAttempts};
use crate::materials::{DecryptionMaterials, EncryptedDataKey, EncryptionMaterials};
use crate::random::{OsRandom, SecureRandom};

/// Provider id of the active AES-GCM key wrap.
pub const AES_GCM_PROVIDER_ID: &str = "AES/GCM";
/// Provider id of the legacy RFC 3394 key wrap.
pub const AES_WRAP_PROVIDER_ID: &str = "AESWrap";
/// Provider id of the legacy raw AES-ECB wrap.
pub const AES_RAW_PROVIDER_ID: &str = "AES";

const WRAP_NONCE_LENGTH: usize = 12;
const WRAP_TAG_LENGTH: usize = 16;

/// The closed table of unwrap strategies this keyring knows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AesUnwrapStrategy {
    Gcm,
    Kw,
    Ecb,
}

impl AesUnwrapStrategy {
    fn for_provider_id(id: &str) -> Option<Self> {
        match id {
            AES_GCM_PROVIDER_ID => Some(Self::Gcm),
            AES_WRAP_PROVIDER_ID => Some(Self::Kw),
            AES_RAW_PROVIDER_ID => Some(Self::Ecb),
            _ => None,
        }
    }

    fn is_legacy(&self) -> bool {
        !matches!(self, Self::Gcm)
    }
}

/// A keyring holding one symmetric AES wrapping key.
///
/// One key opens many doors: the same key unwraps data keys written by the
/// active GCM strategy and by both legacy wrap algorithms.
pub struct AesKeyring {
    wrapping_key: AesWrappingKey,
    random: Arc<dyn SecureRandom>,
}

impl AesKeyring {
    pub fn new(wrapping_key: AesWrappingKey) -> Self {
        Self::with_random(wrapping_key, Arc::new(OsRandom))
    }

    pub fn with_random(wrapping_key: AesWrappingKey, random: Arc<dyn SecureRandom>) -> Self {
        Self { wrapping_key, random }
    }

    fn unwrap_gcm(
        &self,
        materials: &DecryptionMaterials,
        edk: &EncryptedDataKey,
    ) -> CryptoResult<Vec<u8>> {
        let encoded = edk.ciphertext();
        if encoded.len() < WRAP_NONCE_LENGTH + WRAP_TAG_LENGTH {
            return Err(CryptoError::UnwrapFailure(
                "encrypted data key shorter than nonce plus tag".to_string(),
            ));
        }
        let (nonce, ciphertext) = encoded.split_at(WRAP_NONCE_LENGTH);
        let aad = materials.suite().cipher_name().as_bytes();
        gcm_open(self.wrapping_key.as_bytes(), nonce, aad, ciphertext)
    }

    fn unwrap_kw(&self, edk: &EncryptedDataKey) -> CryptoResult<Vec<u8>> {
        let wrapped = edk.ciphertext();
        if wrapped.len() < 24 || wrapped.len() % 8 != 0 {
            return Err(CryptoError::UnwrapFailure(
                "malformed AES key wrap ciphertext".to_string(),
            ));
        }
        let mut out = vec![0u8; wrapped.len() - 8];
        let key = self.wrapping_key.as_bytes();
        let result = match key.len() {
            16 => KekAes128::from(<[u8; 16]>::try_from(key).expect("validated length"))
                .unwrap(wrapped, &mut out),
            24 => KekAes192::from(<[u8; 24]>::try_from(key).expect("validated length"))
                .unwrap(wrapped, &mut out),
            32 => KekAes256::from(<[u8; 32]>::try_from(key).expect("validated length"))
                .unwrap(wrapped, &mut out),
            _ => unreachable!("wrapping key length validated at construction"),
        };
        result.map_err(|e| CryptoError::UnwrapFailure(format!("AES key wrap: {e}")))?;
        Ok(out)
    }

    fn unwrap_ecb(&self, edk: &EncryptedDataKey) -> CryptoResult<Vec<u8>> {
        let key = self.wrapping_key.as_bytes();
        let ciphertext = edk.ciphertext();
        let result = match key.len() {
            16 => ecb::Decryptor::<Aes128>::new_from_slice(key)
                .expect("validated length")
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            24 => ecb::Decryptor::<Aes192>::new_from_slice(key)
                .expect("validated length")
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            32 => ecb::Decryptor::<Aes256>::new_from_slice(key)
                .expect("validated length")
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            _ => unreachable!("wrapping key length validated at construction"),
        };
        result.map_err(|_| CryptoError::UnwrapFailure("raw AES unwrap: bad padding".to_string()))
    }
}

impl Keyring for AesKeyring {
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

        let mut nonce = [0u8; WRAP_NONCE_LENGTH];
        self.random.fill(&mut nonce);

        // The suite's cipher name as AAD binds the wrapped key to the
        // content algorithm the object was written with.
        let aad = suite.cipher_name().as_bytes();
        let ciphertext = gcm_seal(self.wrapping_key.as_bytes(), &nonce, aad, data_key.as_bytes())?;

        let mut encoded = Vec::with_capacity(nonce.len() + ciphertext.len());
        encoded.extend_from_slice(&nonce);
        encoded.extend_from_slice(&ciphertext);

        materials.push_encrypted_data_key(EncryptedDataKey::new(AES_GCM_PROVIDER_ID, encoded));
        Ok(materials)
    }

    fn on_decrypt(
        &self,
        mut materials: DecryptionMaterials,
        encrypted_data_keys: &[EncryptedDataKey],
    ) -> CryptoResult<DecryptionMaterials> {
        let mut attempts = UnwrapAttempts::new();

        for edk in encrypted_data_keys {
            let provider_id = edk.key_provider_id();
            let strategy = match AesUnwrapStrategy::for_provider_id(provider_id) {
                Some(strategy) => strategy,
                None => {
                    attempts.record_unknown_provider(provider_id);
                    continue;
                }
            };
            if strategy.is_legacy() && !materials.legacy_decrypt_enabled() {
                attempts.record_legacy_refused(provider_id);
                continue;
            }

            let result = match strategy {
                AesUnwrapStrategy::Gcm => self.unwrap_gcm(&materials, edk),
                AesUnwrapStrategy::Kw => self.unwrap_kw(edk),
                AesUnwrapStrategy::Ecb => self.unwrap_ecb(edk),
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

/// AES-GCM seal with a caller-chosen nonce, dispatched on key length.
fn gcm_seal(key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let payload = Payload { msg: plaintext, aad };
    let nonce = Nonce::from_slice(nonce);
    let result = match key.len() {
        16 => Aes128Gcm::new_from_slice(key)
            .expect("validated length")
            .encrypt(nonce, payload),
        24 => AesGcm::<Aes192, U12>::new_from_slice(key)
            .expect("validated length")
            .encrypt(nonce, payload),
        32 => Aes256Gcm::new_from_slice(key)
            .expect("validated length")
            .encrypt(nonce, payload),
        _ => unreachable!("wrapping key length validated at construction"),
    };
    result.map_err(|_| CryptoError::WrapFailure("AES-GCM key wrap refused".to_string()))
}

/// AES-GCM open with the same dispatch; failure reveals nothing beyond
/// "this candidate did not unwrap".
fn gcm_open(key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    let payload = Payload { msg: ciphertext, aad };
    let nonce = Nonce::from_slice(nonce);
    let result = match key.len() {
        16 => Aes128Gcm::new_from_slice(key)
            .expect("validated length")
            .decrypt(nonce, payload),
        24 => AesGcm::<Aes192, U12>::new_from_slice(key)
            .expect("validated length")
            .decrypt(nonce, payload),
        32 => Aes256Gcm::new_from_slice(key)
            .expect("validated length")
            .decrypt(nonce, payload),
        _ => unreachable!("wrapping key length validated at construction"),
    };
    result.map_err(|_| CryptoError::UnwrapFailure("AES-GCM key unwrap failed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EncryptionContext;
    use crate::suite::AlgorithmSuite;
    use aes::cipher::BlockEncryptMut;

    fn keyring(key: Vec<u8>) -> AesKeyring {
        AesKeyring::new(AesWrappingKey::new(key).unwrap())
    }

    fn legacy_materials(suite: AlgorithmSuite) -> DecryptionMaterials {
        DecryptionMaterials::new(suite, EncryptionContext::new()).with_legacy_decrypt_enabled(true)
    }

    #[test]
    fn gcm_wrap_binds_cipher_name_as_aad() {
        let key = [9u8; 32];
        let nonce = [1u8; 12];
        let ct = gcm_seal(&key, &nonce, b"AES/GCM/NoPadding", b"data key bytes").unwrap();
        assert!(gcm_open(&key, &nonce, b"AES/GCM/NoPadding", &ct).is_ok());
        assert!(gcm_open(&key, &nonce, b"AES/CTR/NoPadding", &ct).is_err());
    }

    /// RFC 3394 section 4.6: 256-bit KEK wrapping 256-bit key data.
    #[test]
    fn rfc_3394_unwrap_vector() {
        let kek: Vec<u8> = (0u8..32).collect();
        let wrapped = hex::decode(
            "28c9f404c4b810f4cbccb35cfb87f8263f5786e2d80ed326cbc7f0e71a99f43bfb988b9b7a02dd21",
        )
        .unwrap();
        let expected =
            hex::decode("00112233445566778899aabbccddeeff000102030405060708090a0b0c0d0e0f")
                .unwrap();

        let edk = EncryptedDataKey::new(AES_WRAP_PROVIDER_ID, wrapped);
        let materials = keyring(kek)
            .on_decrypt(legacy_materials(AlgorithmSuite::AesCbc), &[edk])
            .unwrap();
        assert_eq!(materials.data_key().unwrap().as_bytes(), &expected[..]);
    }

    #[test]
    fn raw_aes_ecb_unwrap() {
        use aes::cipher::block_padding::Pkcs7;

        let wrapping_key = [0x5au8; 32];
        let data_key = [0x33u8; 32];
        let wrapped = ecb::Encryptor::<Aes256>::new_from_slice(&wrapping_key)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(&data_key);

        let edk = EncryptedDataKey::new(AES_RAW_PROVIDER_ID, wrapped);
        let materials = keyring(wrapping_key.to_vec())
            .on_decrypt(legacy_materials(AlgorithmSuite::AesCbc), &[edk])
            .unwrap();
        assert_eq!(materials.data_key().unwrap().as_bytes(), &data_key);
    }

    #[test]
    fn wrap_works_for_all_aes_key_sizes() {
        for len in [16usize, 24, 32] {
            let ring = keyring(vec![7u8; len]);
            let materials = ring
                .on_encrypt(EncryptionMaterials::new(
                    AlgorithmSuite::ACTIVE,
                    EncryptionContext::new(),
                ))
                .unwrap();
            assert_eq!(materials.encrypted_data_keys().len(), 1);

            let decrypted = ring
                .on_decrypt(
                    DecryptionMaterials::new(AlgorithmSuite::ACTIVE, EncryptionContext::new()),
                    materials.encrypted_data_keys(),
                )
                .unwrap();
            assert_eq!(
                decrypted.data_key().unwrap().as_bytes(),
                materials.data_key().unwrap().as_bytes()
            );
        }
    }
}
