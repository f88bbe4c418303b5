//! Content encryption strategy tests through the public API.

use std::collections::HashSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sealstore_crypto::{
    AesGcmContentStrategy, AesKeyring, AesWrappingKey, AlgorithmSuite, ContentCryptoStrategy,
    CryptoError, DecryptMaterialsRequest, DefaultMaterialsManager, EncryptionContext,
    EncryptionMaterialsRequest, MaterialsManager, SecureRandom,
};

fn manager() -> DefaultMaterialsManager {
    let keyring = AesKeyring::new(AesWrappingKey::new(vec![0u8; 32]).unwrap());
    DefaultMaterialsManager::new(Arc::new(keyring))
}

fn encrypt_decrypt_pair(
    plaintext: &[u8],
) -> (
    sealstore_crypto::EncryptedContent,
    sealstore_crypto::DecryptionMaterials,
) {
    let manager = manager();
    let enc = manager
        .encryption_materials(
            EncryptionMaterialsRequest::new(EncryptionContext::new())
                .with_plaintext_length(plaintext.len() as u64),
        )
        .unwrap();
    let content = AesGcmContentStrategy::new()
        .encrypt_content(&enc, plaintext)
        .unwrap();
    let dec = manager
        .decryption_materials(DecryptMaterialsRequest::new(
            enc.suite(),
            EncryptionContext::new(),
            enc.encrypted_data_keys().to_vec(),
        ))
        .unwrap();
    (content, dec)
}

#[test]
fn gcm_roundtrip() {
    let (content, materials) = encrypt_decrypt_pair(b"hello");
    assert_eq!(content.iv.len(), 12);
    assert_eq!(content.ciphertext_length(), 5 + 16);

    let plaintext = AesGcmContentStrategy::new()
        .decrypt_content(&materials, &content.iv, &content.ciphertext, 128)
        .unwrap();
    assert_eq!(plaintext, b"hello");
}

#[test]
fn gcm_roundtrip_empty_body() {
    let (content, materials) = encrypt_decrypt_pair(b"");
    assert_eq!(content.ciphertext_length(), 16);
    let plaintext = AesGcmContentStrategy::new()
        .decrypt_content(&materials, &content.iv, &content.ciphertext, 128)
        .unwrap();
    assert!(plaintext.is_empty());
}

#[test]
fn any_flipped_bit_fails_authentication_with_zero_plaintext() {
    let (content, materials) = encrypt_decrypt_pair(b"integrity-protected body");
    let strategy = AesGcmContentStrategy::new();

    for i in 0..content.ciphertext.len() {
        let mut tampered = content.ciphertext.clone();
        tampered[i] ^= 0x01;
        let err = strategy
            .decrypt_content(&materials, &content.iv, &tampered, 128)
            .unwrap_err();
        assert!(
            matches!(err, CryptoError::Authentication(_)),
            "byte {i}: expected Authentication, got {err:?}"
        );
    }
}

#[test]
fn truncated_ciphertext_fails() {
    let (content, materials) = encrypt_decrypt_pair(b"will be truncated");
    let err = AesGcmContentStrategy::new()
        .decrypt_content(&materials, &content.iv, &content.ciphertext[..10], 128)
        .unwrap_err();
    assert!(matches!(err, CryptoError::Authentication(_)));
}

#[test]
fn tampered_iv_fails() {
    let (content, materials) = encrypt_decrypt_pair(b"iv matters");
    let mut iv = content.iv.clone();
    iv[0] ^= 0xFF;
    assert!(AesGcmContentStrategy::new()
        .decrypt_content(&materials, &iv, &content.ciphertext, 128)
        .is_err());
}

#[test]
fn out_of_set_tag_length_rejected() {
    let (content, materials) = encrypt_decrypt_pair(b"tag length");
    let err = AesGcmContentStrategy::new()
        .decrypt_content(&materials, &content.iv, &content.ciphertext, 64)
        .unwrap_err();
    assert!(matches!(err, CryptoError::TamperedEnvelope(_)));
}

#[test]
fn ivs_do_not_collide_across_many_encrypts() {
    let manager = manager();
    let enc = manager
        .encryption_materials(EncryptionMaterialsRequest::new(EncryptionContext::new()))
        .unwrap();
    let strategy = AesGcmContentStrategy::new();

    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let content = strategy.encrypt_content(&enc, b"x").unwrap();
        assert!(seen.insert(content.iv), "IV collision under one data key");
    }
}

#[test]
fn encrypt_uses_the_injected_rng() {
    /// Fills every buffer with a fixed byte.
    struct FixedRandom(u8);
    impl SecureRandom for FixedRandom {
        fn fill(&self, dest: &mut [u8]) {
            dest.fill(self.0);
        }
    }

    let manager = manager();
    let enc = manager
        .encryption_materials(EncryptionMaterialsRequest::new(EncryptionContext::new()))
        .unwrap();
    let strategy = AesGcmContentStrategy::with_random(Arc::new(FixedRandom(0xAA)));
    let content = strategy.encrypt_content(&enc, b"rng seam").unwrap();
    assert_eq!(content.iv, vec![0xAA; 12]);
}

#[test]
fn gcm_strategy_refuses_legacy_suite_materials() {
    // The manager never hands a legacy suite to the write path; the
    // strategy also refuses if someone constructs such materials directly.
    let materials = sealstore_crypto::EncryptionMaterials::new(
        AlgorithmSuite::AesCbc,
        EncryptionContext::new(),
    );
    let err = AesGcmContentStrategy::new()
        .encrypt_content(&materials, b"nope")
        .unwrap_err();
    assert!(matches!(err, CryptoError::Configuration(_)));
}

// Property-based tests
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn gcm_roundtrips_any_payload(payload in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let (content, materials) = encrypt_decrypt_pair(&payload);
            let plaintext = AesGcmContentStrategy::new()
                .decrypt_content(&materials, &content.iv, &content.ciphertext, 128)
                .unwrap();
            prop_assert_eq!(plaintext, payload);
        }
    }
}
