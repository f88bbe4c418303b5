//! Cryptographic materials bundles.
//!
//! A materials manager builds these per request; a keyring populates the
//! data key side. Both bundles own their key/context snapshots for the
//! duration of one request and zeroize the plaintext key on drop.

use crate::context::EncryptionContext;
use crate::key::DataKey;
use crate::suite::AlgorithmSuite;

/// A wrapped data key plus the provider id needed to choose an unwrap
/// strategy. The ciphertext is opaque to everything but its keyring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedDataKey {
    key_provider_id: String,
    key_provider_info: Option<String>,
    ciphertext: Vec<u8>,
}

impl EncryptedDataKey {
    pub fn new(key_provider_id: impl Into<String>, ciphertext: Vec<u8>) -> Self {
        Self {
            key_provider_id: key_provider_id.into(),
            key_provider_info: None,
            ciphertext,
        }
    }

    pub fn with_provider_info(mut self, info: impl Into<String>) -> Self {
        self.key_provider_info = Some(info.into());
        self
    }

    pub fn key_provider_id(&self) -> &str {
        &self.key_provider_id
    }

    pub fn key_provider_info(&self) -> Option<&str> {
        self.key_provider_info.as_deref()
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

/// Materials for the encrypt path. Built by the manager with the active
/// suite, populated by the keyring with a plaintext data key and exactly
/// one encrypted data key.
#[derive(Debug)]
pub struct EncryptionMaterials {
    suite: AlgorithmSuite,
    context: EncryptionContext,
    data_key: Option<DataKey>,
    encrypted_data_keys: Vec<EncryptedDataKey>,
    plaintext_length: Option<u64>,
}

impl EncryptionMaterials {
    pub fn new(suite: AlgorithmSuite, context: EncryptionContext) -> Self {
        Self {
            suite,
            context,
            data_key: None,
            encrypted_data_keys: Vec::new(),
            plaintext_length: None,
        }
    }

    pub fn with_plaintext_length(mut self, length: u64) -> Self {
        self.plaintext_length = Some(length);
        self
    }

    pub fn suite(&self) -> AlgorithmSuite {
        self.suite
    }

    pub fn context(&self) -> &EncryptionContext {
        &self.context
    }

    pub fn data_key(&self) -> Option<&DataKey> {
        self.data_key.as_ref()
    }

    pub fn encrypted_data_keys(&self) -> &[EncryptedDataKey] {
        &self.encrypted_data_keys
    }

    pub fn plaintext_length(&self) -> Option<u64> {
        self.plaintext_length
    }

    pub(crate) fn set_data_key(&mut self, data_key: DataKey) {
        self.data_key = Some(data_key);
    }

    pub(crate) fn push_encrypted_data_key(&mut self, edk: EncryptedDataKey) {
        self.encrypted_data_keys.push(edk);
    }
}

/// Materials for the decrypt path. The suite comes from the parsed
/// envelope, never from the caller.
#[derive(Debug)]
pub struct DecryptionMaterials {
    suite: AlgorithmSuite,
    context: EncryptionContext,
    data_key: Option<DataKey>,
    legacy_decrypt_enabled: bool,
}

impl DecryptionMaterials {
    pub fn new(suite: AlgorithmSuite, context: EncryptionContext) -> Self {
        Self {
            suite,
            context,
            data_key: None,
            legacy_decrypt_enabled: false,
        }
    }

    pub fn with_legacy_decrypt_enabled(mut self, enabled: bool) -> Self {
        self.legacy_decrypt_enabled = enabled;
        self
    }

    pub fn suite(&self) -> AlgorithmSuite {
        self.suite
    }

    pub fn context(&self) -> &EncryptionContext {
        &self.context
    }

    pub fn data_key(&self) -> Option<&DataKey> {
        self.data_key.as_ref()
    }

    /// Whether the caller opted into legacy key-wrap and content algorithms.
    pub fn legacy_decrypt_enabled(&self) -> bool {
        self.legacy_decrypt_enabled
    }

    pub(crate) fn set_data_key(&mut self, data_key: DataKey) {
        self.data_key = Some(data_key);
    }
}
