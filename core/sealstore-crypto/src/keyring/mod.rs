//! Keyrings: owners of wrapping keys.
//!
//! A keyring wraps a fresh data key on encrypt and, on decrypt, tries each
//! candidate encrypted data key against its closed table of unwrap
//! strategies (active + legacy) until one succeeds.

mod aes;
mod kms;
mod rsa;

pub use self::aes::{AesKeyring, AES_GCM_PROVIDER_ID, AES_RAW_PROVIDER_ID, AES_WRAP_PROVIDER_ID};
pub use self::kms::{KmsClient, KmsKeyring, KMS_CONTEXT_PROVIDER_ID};
pub use self::rsa::{RsaKeyring, RSA_ECB_OAEP_SHA256_PROVIDER_ID, RSA_OAEP_SHA1_PROVIDER_ID};

use crate::error::{CryptoError, CryptoResult};
use crate::materials::{DecryptionMaterials, EncryptedDataKey, EncryptionMaterials};

/// Wraps and unwraps data keys.
///
/// Implementations hold only immutable key material and an immutable
/// strategy table, so one keyring instance may serve concurrent requests.
pub trait Keyring: Send + Sync {
    /// Generates a plaintext data key if the materials lack one and appends
    /// exactly one encrypted data key, wrapped with the active strategy.
    fn on_encrypt(&self, materials: EncryptionMaterials) -> CryptoResult<EncryptionMaterials>;

    /// Tries the candidate encrypted data keys in order; the first strategy
    /// that unwraps one wins. Unknown provider ids are skipped.
    fn on_decrypt(
        &self,
        materials: DecryptionMaterials,
        encrypted_data_keys: &[EncryptedDataKey],
    ) -> CryptoResult<DecryptionMaterials>;
}

/// Bookkeeping for one `on_decrypt` pass over the candidate EDKs.
///
/// Individual failures are collected and folded into a single aggregate
/// error so that callers cannot distinguish which strategy failed or why.
pub(crate) struct UnwrapAttempts {
    tried: usize,
    skipped_unknown: usize,
    refused_legacy: usize,
    causes: Vec<String>,
}

impl UnwrapAttempts {
    pub(crate) fn new() -> Self {
        Self {
            tried: 0,
            skipped_unknown: 0,
            refused_legacy: 0,
            causes: Vec::new(),
        }
    }

    pub(crate) fn record_unknown_provider(&mut self, provider_id: &str) {
        self.skipped_unknown += 1;
        self.causes.push(format!("unknown key provider {provider_id:?}"));
    }

    pub(crate) fn record_legacy_refused(&mut self, provider_id: &str) {
        self.refused_legacy += 1;
        self.causes
            .push(format!("legacy key provider {provider_id:?} requires legacy opt-in"));
    }

    pub(crate) fn record_failure(&mut self, provider_id: &str, error: &CryptoError) {
        self.tried += 1;
        self.causes.push(format!("{provider_id}: {error}"));
    }

    /// Builds the terminal error once every candidate has been exhausted.
    ///
    /// If the only reachable strategies were refused for lack of legacy
    /// opt-in, surface that directly so the caller knows what to enable.
    pub(crate) fn into_error(self) -> CryptoError {
        if self.refused_legacy > 0 && self.tried == 0 {
            return CryptoError::LegacyRefused(
                "all candidate data keys were wrapped with legacy algorithms".to_string(),
            );
        }
        CryptoError::UnwrapFailure(format!(
            "{} candidate(s): {}",
            self.tried + self.skipped_unknown + self.refused_legacy,
            if self.causes.is_empty() {
                "no encrypted data keys present".to_string()
            } else {
                self.causes.join("; ")
            }
        ))
    }
}
