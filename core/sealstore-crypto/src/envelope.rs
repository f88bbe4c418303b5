//! Object envelope metadata codec.
//!
//! Encodes the wrapped key, IV, algorithm parameters, and encryption
//! context into the object's user metadata, and parses them back on read.
//! Key names are fixed for wire compatibility with existing envelopes.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::context::EncryptionContext;
use crate::error::{CryptoError, CryptoResult};
use crate::materials::EncryptedDataKey;
use crate::suite::{AlgorithmSuite, VALID_TAG_LENGTHS_BITS};

/// Legacy v1 wrapped-key field.
pub const KEY_V1: &str = "x-amz-key";
/// Current wrapped-key field.
pub const KEY_V2: &str = "x-amz-key-v2";
/// Content IV, base64.
pub const IV: &str = "x-amz-iv";
/// Encryption context as a compact sorted JSON object.
pub const MATDESC: &str = "x-amz-matdesc";
/// Key-provider id of the wrapped key.
pub const WRAP_ALG: &str = "x-amz-wrap-alg";
/// Optional provider info for the wrapped key (the key id for
/// service-wrapped keys).
pub const KEY_PROVIDER_INFO: &str = "x-amz-key-provider-info";
/// Content suite cipher name.
pub const CEK_ALG: &str = "x-amz-cek-alg";
/// Authentication tag length in bits, decimal string.
pub const TAG_LEN: &str = "x-amz-tag-len";
/// Plaintext length, used to size legacy reads.
pub const UNENCRYPTED_CONTENT_LENGTH: &str = "x-amz-unencrypted-content-length";

/// The parsed (or to-be-written) envelope of one stored object.
#[derive(Clone, Debug)]
pub struct ObjectEnvelope {
    pub encrypted_data_key: EncryptedDataKey,
    pub iv: Vec<u8>,
    pub suite: AlgorithmSuite,
    pub context: EncryptionContext,
    pub tag_length_bits: usize,
    pub unencrypted_content_length: Option<u64>,
}

impl ObjectEnvelope {
    /// Merges the envelope fields into a metadata map, overwriting any
    /// stale envelope keys already present.
    pub fn encode_into(&self, metadata: &mut HashMap<String, String>) {
        metadata.remove(KEY_V1);
        metadata.insert(KEY_V2.to_string(), BASE64.encode(self.encrypted_data_key.ciphertext()));
        metadata.insert(IV.to_string(), BASE64.encode(&self.iv));
        metadata.insert(MATDESC.to_string(), self.context.canonical_json());
        metadata.insert(
            WRAP_ALG.to_string(),
            self.encrypted_data_key.key_provider_id().to_string(),
        );
        match self.encrypted_data_key.key_provider_info() {
            Some(info) => {
                metadata.insert(KEY_PROVIDER_INFO.to_string(), info.to_string());
            }
            None => {
                metadata.remove(KEY_PROVIDER_INFO);
            }
        }
        metadata.insert(CEK_ALG.to_string(), self.suite.cipher_name().to_string());
        metadata.insert(TAG_LEN.to_string(), self.tag_length_bits.to_string());
        if let Some(length) = self.unencrypted_content_length {
            metadata.insert(UNENCRYPTED_CONTENT_LENGTH.to_string(), length.to_string());
        }
    }

    /// Parses an envelope out of object metadata.
    ///
    /// Returns `Ok(None)` when neither key field is present: the object is
    /// simply not client-encrypted. A v1 envelope (no `x-amz-cek-alg`) maps
    /// to the legacy CBC suite, and a missing wrap algorithm means the
    /// historical raw-AES wrap.
    pub fn decode(metadata: &HashMap<String, String>) -> CryptoResult<Option<ObjectEnvelope>> {
        let (wrapped_key_b64, v2) = match (metadata.get(KEY_V2), metadata.get(KEY_V1)) {
            (Some(v2), _) => (v2, true),
            (None, Some(v1)) => (v1, false),
            (None, None) => return Ok(None),
        };

        let wrapped_key = BASE64.decode(wrapped_key_b64).map_err(|e| {
            CryptoError::TamperedEnvelope(format!("wrapped key is not valid base64: {e}"))
        })?;

        let iv_b64 = metadata
            .get(IV)
            .ok_or_else(|| CryptoError::TamperedEnvelope("envelope is missing the IV".to_string()))?;
        let iv = BASE64
            .decode(iv_b64)
            .map_err(|e| CryptoError::TamperedEnvelope(format!("IV is not valid base64: {e}")))?;

        let suite = match metadata.get(CEK_ALG) {
            Some(name) => AlgorithmSuite::from_cipher_name(name).ok_or_else(|| {
                CryptoError::Configuration(format!("unknown content encryption algorithm {name:?}"))
            })?,
            // v1 envelopes never wrote a cek-alg; they are CBC.
            None => AlgorithmSuite::AesCbc,
        };
        if iv.len() != suite.iv_length() {
            return Err(CryptoError::TamperedEnvelope(format!(
                "IV length {} does not match suite {}",
                iv.len(),
                suite.cipher_name()
            )));
        }

        let key_provider_id = match metadata.get(WRAP_ALG) {
            Some(id) => id.clone(),
            None if !v2 => crate::keyring::AES_RAW_PROVIDER_ID.to_string(),
            None => {
                return Err(CryptoError::TamperedEnvelope(
                    "envelope is missing the wrap algorithm".to_string(),
                ))
            }
        };

        let context = match metadata.get(MATDESC) {
            Some(json) => EncryptionContext::from_json(json)?,
            None => EncryptionContext::new(),
        };

        let tag_length_bits = if suite == AlgorithmSuite::AesGcm {
            match metadata.get(TAG_LEN) {
                Some(text) => {
                    let bits: usize = text.parse().map_err(|_| {
                        CryptoError::TamperedEnvelope(format!("unparseable tag length {text:?}"))
                    })?;
                    if !VALID_TAG_LENGTHS_BITS.contains(&bits) {
                        return Err(CryptoError::TamperedEnvelope(format!(
                            "tag length {bits} bits is outside the valid set"
                        )));
                    }
                    bits
                }
                None => suite.tag_length_bits(),
            }
        } else {
            0
        };

        let unencrypted_content_length = match metadata.get(UNENCRYPTED_CONTENT_LENGTH) {
            Some(text) => Some(text.parse().map_err(|_| {
                CryptoError::TamperedEnvelope(format!("unparseable content length {text:?}"))
            })?),
            None => None,
        };

        let mut encrypted_data_key = EncryptedDataKey::new(key_provider_id, wrapped_key);
        if let Some(info) = metadata.get(KEY_PROVIDER_INFO) {
            encrypted_data_key = encrypted_data_key.with_provider_info(info.clone());
        }

        Ok(Some(ObjectEnvelope {
            encrypted_data_key,
            iv,
            suite,
            context,
            tag_length_bits,
            unencrypted_content_length,
        }))
    }
}
