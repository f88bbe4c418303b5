//! Materials managers: policy over a keyring.

use std::sync::Arc;

use crate::context::EncryptionContext;
use crate::error::{CryptoError, CryptoResult};
use crate::keyring::Keyring;
use crate::materials::{
    DecryptionMaterials, EncryptedDataKey, EncryptionMaterials,
};
use crate::suite::AlgorithmSuite;

/// Inputs to building encryption materials for one PUT.
#[derive(Clone, Debug)]
pub struct EncryptionMaterialsRequest {
    context: EncryptionContext,
    plaintext_length: Option<u64>,
}

impl EncryptionMaterialsRequest {
    pub fn new(context: EncryptionContext) -> Self {
        Self {
            context,
            plaintext_length: None,
        }
    }

    pub fn with_plaintext_length(mut self, length: u64) -> Self {
        self.plaintext_length = Some(length);
        self
    }

    pub fn context(&self) -> &EncryptionContext {
        &self.context
    }

    pub fn plaintext_length(&self) -> Option<u64> {
        self.plaintext_length
    }
}

/// Inputs to building decryption materials for one GET.
///
/// Everything here comes from the parsed envelope except the caller's
/// expected context and the legacy opt-in, which come from the client.
#[derive(Clone, Debug)]
pub struct DecryptMaterialsRequest {
    suite: AlgorithmSuite,
    stored_context: EncryptionContext,
    encrypted_data_keys: Vec<EncryptedDataKey>,
    expected_context: Option<EncryptionContext>,
    legacy_decrypt_enabled: bool,
}

impl DecryptMaterialsRequest {
    pub fn new(
        suite: AlgorithmSuite,
        stored_context: EncryptionContext,
        encrypted_data_keys: Vec<EncryptedDataKey>,
    ) -> Self {
        Self {
            suite,
            stored_context,
            encrypted_data_keys,
            expected_context: None,
            legacy_decrypt_enabled: false,
        }
    }

    /// Context the caller expects the object to have been written with.
    pub fn with_expected_context(mut self, context: EncryptionContext) -> Self {
        self.expected_context = Some(context);
        self
    }

    pub fn with_legacy_decrypt_enabled(mut self, enabled: bool) -> Self {
        self.legacy_decrypt_enabled = enabled;
        self
    }
}

/// Assembles materials bundles around a keyring.
pub trait MaterialsManager: Send + Sync {
    fn encryption_materials(
        &self,
        request: EncryptionMaterialsRequest,
    ) -> CryptoResult<EncryptionMaterials>;

    fn decryption_materials(
        &self,
        request: DecryptMaterialsRequest,
    ) -> CryptoResult<DecryptionMaterials>;
}

/// Stateless default policy.
///
/// Encrypt always fixes the active suite. Decrypt takes the suite from the
/// stored envelope, never from the caller, and refuses legacy suites
/// unless the request carries the opt-in.
pub struct DefaultMaterialsManager {
    keyring: Arc<dyn Keyring>,
}

impl DefaultMaterialsManager {
    pub fn new(keyring: Arc<dyn Keyring>) -> Self {
        Self { keyring }
    }
}

impl MaterialsManager for DefaultMaterialsManager {
    fn encryption_materials(
        &self,
        request: EncryptionMaterialsRequest,
    ) -> CryptoResult<EncryptionMaterials> {
        let mut materials =
            EncryptionMaterials::new(AlgorithmSuite::ACTIVE, request.context().clone());
        if let Some(length) = request.plaintext_length() {
            materials = materials.with_plaintext_length(length);
        }

        let materials = self.keyring.on_encrypt(materials)?;

        let data_key = materials.data_key().ok_or_else(|| {
            CryptoError::WrapFailure("keyring returned materials without a data key".to_string())
        })?;
        if data_key.len() != materials.suite().data_key_length() {
            return Err(CryptoError::WrapFailure(format!(
                "keyring produced a {}-byte data key, suite requires {}",
                data_key.len(),
                materials.suite().data_key_length()
            )));
        }
        if materials.encrypted_data_keys().is_empty() {
            return Err(CryptoError::WrapFailure(
                "keyring returned materials without an encrypted data key".to_string(),
            ));
        }
        Ok(materials)
    }

    fn decryption_materials(
        &self,
        request: DecryptMaterialsRequest,
    ) -> CryptoResult<DecryptionMaterials> {
        if let Some(expected) = &request.expected_context {
            // Byte-wise comparison of the canonical serializations.
            if expected.canonical_json() != request.stored_context.canonical_json() {
                return Err(CryptoError::Configuration(
                    "supplied encryption context does not match the stored envelope".to_string(),
                ));
            }
        }
        if request.suite.is_legacy() && !request.legacy_decrypt_enabled {
            return Err(CryptoError::LegacyRefused(format!(
                "object was written with legacy suite {}",
                request.suite.cipher_name()
            )));
        }

        let materials = DecryptionMaterials::new(request.suite, request.stored_context)
            .with_legacy_decrypt_enabled(request.legacy_decrypt_enabled);
        let materials = self
            .keyring
            .on_decrypt(materials, &request.encrypted_data_keys)?;

        if materials.data_key().is_none() {
            return Err(CryptoError::UnwrapFailure(
                "keyring returned materials without a data key".to_string(),
            ));
        }
        Ok(materials)
    }
}
