//! Legacy content strategies: AES-CBC and AES-CTR.
//!
//! Read side only. Neither mode authenticates, so a successful decrypt
//! proves nothing about integrity; the materials manager gates these
//! behind the legacy opt-in.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, KeyIvInit, StreamCipher, StreamCipherSeek};
use aes::{Aes128, Aes192, Aes256};

use crate::content::{content_key, ContentCryptoStrategy, EncryptedContent};
use crate::error::{CryptoError, CryptoResult};
use crate::key::VALID_AES_KEY_LENGTHS;
use crate::materials::{DecryptionMaterials, EncryptionMaterials};

const LEGACY_IV_LENGTH: usize = 16;

fn refuse_encrypt(suite: crate::suite::AlgorithmSuite) -> CryptoError {
    CryptoError::Configuration(format!(
        "legacy suite {} is allowed on read only",
        suite.cipher_name()
    ))
}

fn check_iv(iv: &[u8]) -> CryptoResult<()> {
    if iv.len() != LEGACY_IV_LENGTH {
        return Err(CryptoError::TamperedEnvelope(format!(
            "legacy IV must be {LEGACY_IV_LENGTH} bytes, envelope carried {}",
            iv.len()
        )));
    }
    Ok(())
}

/// AES-CBC with PKCS#5 padding. Decryption succeeds whenever the padding
/// is valid; there is no integrity check.
pub struct AesCbcContentStrategy;

impl ContentCryptoStrategy for AesCbcContentStrategy {
    fn encrypt_content(
        &self,
        materials: &EncryptionMaterials,
        _plaintext: &[u8],
    ) -> CryptoResult<EncryptedContent> {
        Err(refuse_encrypt(materials.suite()))
    }

    fn decrypt_content(
        &self,
        materials: &DecryptionMaterials,
        iv: &[u8],
        ciphertext: &[u8],
        _tag_length_bits: usize,
    ) -> CryptoResult<Vec<u8>> {
        let key = content_key(materials.suite(), materials.data_key(), &VALID_AES_KEY_LENGTHS)?;
        check_iv(iv)?;
        if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
            return Err(CryptoError::Authentication(
                "CBC ciphertext is not a whole number of blocks".to_string(),
            ));
        }

        let result = match key.len() {
            16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
                .expect("lengths validated")
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
                .expect("lengths validated")
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
                .expect("lengths validated")
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            _ => unreachable!("key length validated above"),
        };
        result.map_err(|_| CryptoError::Authentication("CBC padding check failed".to_string()))
    }
}

/// AES-CTR. Seekable, which is what makes ranged reads of legacy objects
/// possible.
pub struct AesCtrContentStrategy;

impl AesCtrContentStrategy {
    fn apply(key: &[u8], iv: &[u8], data: &[u8], offset: u64) -> CryptoResult<Vec<u8>> {
        let mut buffer = data.to_vec();
        match key.len() {
            16 => {
                let mut cipher = ctr::Ctr128BE::<Aes128>::new_from_slices(key, iv)
                    .expect("lengths validated");
                cipher
                    .try_seek(offset)
                    .map_err(|_| CryptoError::Configuration("CTR offset out of range".to_string()))?;
                cipher.apply_keystream(&mut buffer);
            }
            24 => {
                let mut cipher = ctr::Ctr128BE::<Aes192>::new_from_slices(key, iv)
                    .expect("lengths validated");
                cipher
                    .try_seek(offset)
                    .map_err(|_| CryptoError::Configuration("CTR offset out of range".to_string()))?;
                cipher.apply_keystream(&mut buffer);
            }
            32 => {
                let mut cipher = ctr::Ctr128BE::<Aes256>::new_from_slices(key, iv)
                    .expect("lengths validated");
                cipher
                    .try_seek(offset)
                    .map_err(|_| CryptoError::Configuration("CTR offset out of range".to_string()))?;
                cipher.apply_keystream(&mut buffer);
            }
            _ => unreachable!("key length validated above"),
        }
        Ok(buffer)
    }
}

impl ContentCryptoStrategy for AesCtrContentStrategy {
    fn encrypt_content(
        &self,
        materials: &EncryptionMaterials,
        _plaintext: &[u8],
    ) -> CryptoResult<EncryptedContent> {
        Err(refuse_encrypt(materials.suite()))
    }

    fn decrypt_content(
        &self,
        materials: &DecryptionMaterials,
        iv: &[u8],
        ciphertext: &[u8],
        _tag_length_bits: usize,
    ) -> CryptoResult<Vec<u8>> {
        let key = content_key(materials.suite(), materials.data_key(), &VALID_AES_KEY_LENGTHS)?;
        check_iv(iv)?;
        Self::apply(key, iv, ciphertext, 0)
    }

    fn decrypt_content_range(
        &self,
        materials: &DecryptionMaterials,
        iv: &[u8],
        ciphertext: &[u8],
        offset: u64,
    ) -> CryptoResult<Vec<u8>> {
        let key = content_key(materials.suite(), materials.data_key(), &VALID_AES_KEY_LENGTHS)?;
        check_iv(iv)?;
        Self::apply(key, iv, ciphertext, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EncryptionContext;
    use crate::key::DataKey;
    use crate::suite::AlgorithmSuite;
    use aes::cipher::BlockEncryptMut;

    fn materials(suite: AlgorithmSuite, key: &[u8]) -> DecryptionMaterials {
        let mut m = DecryptionMaterials::new(suite, EncryptionContext::new())
            .with_legacy_decrypt_enabled(true);
        m.set_data_key(DataKey::new(key.to_vec()));
        m
    }

    fn cbc_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Vec<u8> {
        cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .unwrap()
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    #[test]
    fn cbc_decrypts_what_an_old_writer_produced() {
        let key = [0x11u8; 32];
        let iv = [0x22u8; 16];
        let plaintext = b"hello world";

        let ciphertext = cbc_encrypt(&key, &iv, plaintext);
        let decrypted = AesCbcContentStrategy
            .decrypt_content(&materials(AlgorithmSuite::AesCbc, &key), &iv, &ciphertext, 0)
            .unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn cbc_rejects_partial_blocks() {
        let key = [0x11u8; 32];
        let iv = [0x22u8; 16];
        let err = AesCbcContentStrategy
            .decrypt_content(&materials(AlgorithmSuite::AesCbc, &key), &iv, &[0u8; 17], 0)
            .unwrap_err();
        assert!(matches!(err, CryptoError::Authentication(_)));
    }

    #[test]
    fn cbc_refuses_encrypt() {
        let m = crate::materials::EncryptionMaterials::new(
            AlgorithmSuite::AesCbc,
            EncryptionContext::new(),
        );
        let err = AesCbcContentStrategy.encrypt_content(&m, b"nope").unwrap_err();
        assert!(matches!(err, CryptoError::Configuration(_)));
    }

    #[test]
    fn ctr_roundtrip_and_range() {
        let key = [0x42u8; 32];
        let iv = [0x01u8; 16];
        let plaintext: Vec<u8> = (0u8..=255).cycle().take(100).collect();

        // Produce CTR ciphertext the way an old writer would.
        let mut ciphertext = plaintext.clone();
        let mut cipher = ctr::Ctr128BE::<Aes256>::new_from_slices(&key, &iv).unwrap();
        cipher.apply_keystream(&mut ciphertext);

        let m = materials(AlgorithmSuite::AesCtr, &key);
        let full = AesCtrContentStrategy
            .decrypt_content(&m, &iv, &ciphertext, 0)
            .unwrap();
        assert_eq!(full, plaintext);

        // A mid-object slice decrypts with a seeked counter, including a
        // non-block-aligned start.
        let offset = 37;
        let slice = AesCtrContentStrategy
            .decrypt_content_range(&m, &iv, &ciphertext[offset..], offset as u64)
            .unwrap();
        assert_eq!(slice, &plaintext[offset..]);
    }

    #[test]
    fn ctr_refuses_encrypt() {
        let m = crate::materials::EncryptionMaterials::new(
            AlgorithmSuite::AesCtr,
            EncryptionContext::new(),
        );
        let err = AesCtrContentStrategy.encrypt_content(&m, b"nope").unwrap_err();
        assert!(matches!(err, CryptoError::Configuration(_)));
    }

    #[test]
    fn legacy_iv_length_enforced() {
        let key = [0u8; 32];
        let err = AesCtrContentStrategy
            .decrypt_content(&materials(AlgorithmSuite::AesCtr, &key), &[0u8; 12], &[1, 2, 3], 0)
            .unwrap_err();
        assert!(matches!(err, CryptoError::TamperedEnvelope(_)));
    }
}
