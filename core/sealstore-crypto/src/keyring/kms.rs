//! Key-service backed keyring.
//!
//! Delegates wrap/unwrap to an out-of-process key management service. The
//! RPC transport lives behind [`KmsClient`]; this keyring only shapes the
//! materials the same way the local keyrings do.

use std::sync::Arc;

use crate::context::EncryptionContext;
use crate::error::{CryptoError, CryptoResult};
use crate::key::{DataKey, VALID_AES_KEY_LENGTHS};
use crate::keyring::{Keyring, UnwrapAttempts};
use crate::materials::{DecryptionMaterials, EncryptedDataKey, EncryptionMaterials};
use crate::random::{OsRandom, SecureRandom};

/// Provider id for service-wrapped keys with context binding.
pub const KMS_CONTEXT_PROVIDER_ID: &str = "kms+context";

/// Seam to the key management service.
///
/// The service is expected to bind the encryption context to the wrap, so
/// a decrypt with a different context must fail on the service side.
pub trait KmsClient: Send + Sync {
    fn encrypt_data_key(
        &self,
        key_id: &str,
        plaintext_key: &[u8],
        context: &EncryptionContext,
    ) -> CryptoResult<Vec<u8>>;

    fn decrypt_data_key(
        &self,
        key_id: &str,
        ciphertext: &[u8],
        context: &EncryptionContext,
    ) -> CryptoResult<Vec<u8>>;
}

/// A keyring that wraps through a remote key service.
pub struct KmsKeyring {
    client: Arc<dyn KmsClient>,
    key_id: String,
    random: Arc<dyn SecureRandom>,
}

impl KmsKeyring {
    pub fn new(client: Arc<dyn KmsClient>, key_id: impl Into<String>) -> Self {
        Self::with_random(client, key_id, Arc::new(OsRandom))
    }

    pub fn with_random(
        client: Arc<dyn KmsClient>,
        key_id: impl Into<String>,
        random: Arc<dyn SecureRandom>,
    ) -> Self {
        Self {
            client,
            key_id: key_id.into(),
            random,
        }
    }
}

impl Keyring for KmsKeyring {
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

        let ciphertext =
            self.client
                .encrypt_data_key(&self.key_id, data_key.as_bytes(), materials.context())?;

        materials.push_encrypted_data_key(
            EncryptedDataKey::new(KMS_CONTEXT_PROVIDER_ID, ciphertext)
                .with_provider_info(self.key_id.clone()),
        );
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
            if provider_id != KMS_CONTEXT_PROVIDER_ID {
                attempts.record_unknown_provider(provider_id);
                continue;
            }
            // The provider info names the key the data key was wrapped
            // under. A candidate wrapped under some other key cannot be
            // opened by this keyring, so skip it rather than asking the
            // service to fail.
            let key_id = edk.key_provider_info().unwrap_or(self.key_id.as_str());
            if key_id != self.key_id {
                attempts.record_failure(
                    provider_id,
                    &CryptoError::UnwrapFailure(format!(
                        "candidate was wrapped under key {key_id:?}, keyring holds {:?}",
                        self.key_id
                    )),
                );
                continue;
            }

            let result = self
                .client
                .decrypt_data_key(key_id, edk.ciphertext(), materials.context())
                .and_then(|plaintext_key| {
                    if VALID_AES_KEY_LENGTHS.contains(&plaintext_key.len()) {
                        Ok(plaintext_key)
                    } else {
                        Err(CryptoError::UnwrapFailure(format!(
                            "key service returned a data key of invalid length {}",
                            plaintext_key.len()
                        )))
                    }
                });
            match result {
                Ok(plaintext_key) => {
                    materials.set_data_key(DataKey::new(plaintext_key));
                    return Ok(materials);
                }
                Err(error) => attempts.record_failure(provider_id, &error),
            }
        }

        Err(attempts.into_error())
    }
}
