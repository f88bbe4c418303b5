//! Put/Get pipelines.
//!
//! Orchestrates materials manager, content strategy, envelope codec, and
//! the object store. On PUT, every cryptographic step completes before the
//! store is touched, so a failure never leaves a partial object behind.

use std::collections::HashMap;
use std::sync::Arc;

use sealstore_crypto::{
    strategy_for_suite, AesGcmContentStrategy, AlgorithmSuite, ContentCryptoStrategy, CryptoError,
    DecryptMaterialsRequest, EncryptionContext, EncryptionMaterialsRequest, MaterialsManager,
    ObjectEnvelope, OsRandom, SecureRandom,
};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::store::{ByteRange, ObjectStore};

/// A PUT of one object.
#[derive(Clone, Debug)]
pub struct PutObjectRequest {
    pub key: String,
    pub metadata: HashMap<String, String>,
    pub context: EncryptionContext,
}

impl PutObjectRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            metadata: HashMap::new(),
            context: EncryptionContext::new(),
        }
    }

    pub fn with_context(mut self, context: EncryptionContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A GET of one object.
#[derive(Clone, Debug)]
pub struct GetObjectRequest {
    pub key: String,
    /// Context the caller expects; verified against the stored envelope.
    pub expected_context: Option<EncryptionContext>,
    /// Ciphertext byte range. Only legacy CTR objects support this.
    pub range: Option<ByteRange>,
}

impl GetObjectRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            expected_context: None,
            range: None,
        }
    }

    pub fn with_expected_context(mut self, context: EncryptionContext) -> Self {
        self.expected_context = Some(context);
        self
    }

    pub fn with_range(mut self, range: ByteRange) -> Self {
        self.range = Some(range);
        self
    }
}

#[derive(Clone, Debug)]
pub struct PutObjectOutput {
    pub ciphertext_length: u64,
}

#[derive(Debug)]
pub struct GetObjectOutput {
    pub plaintext: Vec<u8>,
    pub metadata: HashMap<String, String>,
    pub suite: AlgorithmSuite,
}

/// The client-side encrypting object client.
pub struct SealstoreClient {
    store: Arc<dyn ObjectStore>,
    manager: Arc<dyn MaterialsManager>,
    random: Arc<dyn SecureRandom>,
    config: ClientConfig,
}

impl SealstoreClient {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        manager: Arc<dyn MaterialsManager>,
        config: ClientConfig,
    ) -> Self {
        Self::with_random(store, manager, config, Arc::new(OsRandom))
    }

    pub fn with_random(
        store: Arc<dyn ObjectStore>,
        manager: Arc<dyn MaterialsManager>,
        config: ClientConfig,
        random: Arc<dyn SecureRandom>,
    ) -> Self {
        Self {
            store,
            manager,
            random,
            config,
        }
    }

    /// Encrypts and uploads one object.
    pub async fn put_object(
        &self,
        request: PutObjectRequest,
        body: &[u8],
    ) -> ClientResult<PutObjectOutput> {
        let materials_request = EncryptionMaterialsRequest::new(request.context)
            .with_plaintext_length(body.len() as u64);
        let materials = self.manager.encryption_materials(materials_request)?;

        let strategy = AesGcmContentStrategy::with_random(self.random.clone());
        let content = strategy.encrypt_content(&materials, body)?;

        let envelope = ObjectEnvelope {
            encrypted_data_key: materials.encrypted_data_keys()[0].clone(),
            iv: content.iv.clone(),
            suite: materials.suite(),
            context: materials.context().clone(),
            tag_length_bits: materials.suite().tag_length_bits(),
            unencrypted_content_length: Some(body.len() as u64),
        };
        let mut metadata = request.metadata;
        envelope.encode_into(&mut metadata);

        let ciphertext_length = content.ciphertext_length();
        self.store
            .put_object(&request.key, metadata, content.ciphertext)
            .await?;

        debug!(
            "put {} ({} plaintext bytes, {ciphertext_length} ciphertext bytes)",
            request.key,
            body.len()
        );
        Ok(PutObjectOutput { ciphertext_length })
    }

    /// Downloads and decrypts one object.
    pub async fn get_object(&self, request: GetObjectRequest) -> ClientResult<GetObjectOutput> {
        let stored = self.store.get_object(&request.key, request.range).await?;

        let envelope = ObjectEnvelope::decode(&stored.metadata)?
            .ok_or_else(|| ClientError::NotEncrypted(request.key.clone()))?;

        if request.range.is_some() && envelope.suite != AlgorithmSuite::AesCtr {
            return Err(ClientError::Crypto(CryptoError::Configuration(format!(
                "ranged reads are not supported for suite {}",
                envelope.suite.cipher_name()
            ))));
        }

        let mut materials_request = DecryptMaterialsRequest::new(
            envelope.suite,
            envelope.context.clone(),
            vec![envelope.encrypted_data_key.clone()],
        )
        .with_legacy_decrypt_enabled(self.config.legacy_decrypt_enabled);
        if let Some(expected) = request.expected_context {
            materials_request = materials_request.with_expected_context(expected);
        }
        let materials = self.manager.decryption_materials(materials_request)?;

        let strategy = strategy_for_suite(envelope.suite, self.random.clone());
        let plaintext = match request.range {
            Some(range) => strategy.decrypt_content_range(
                &materials,
                &envelope.iv,
                &stored.body,
                range.start,
            )?,
            None => {
                let plaintext = strategy.decrypt_content(
                    &materials,
                    &envelope.iv,
                    &stored.body,
                    envelope.tag_length_bits,
                )?;
                if let Some(expected) = envelope.unencrypted_content_length {
                    if plaintext.len() as u64 != expected {
                        return Err(ClientError::Crypto(CryptoError::TamperedEnvelope(format!(
                            "decrypted length {} does not match the recorded length {expected}",
                            plaintext.len()
                        ))));
                    }
                }
                plaintext
            }
        };

        debug!("got {} ({} plaintext bytes)", request.key, plaintext.len());
        Ok(GetObjectOutput {
            plaintext,
            metadata: stored.metadata,
            suite: envelope.suite,
        })
    }
}
