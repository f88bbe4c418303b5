//! Shared test helpers: an in-memory object store and legacy fixtures.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sealstore_client::{ByteRange, ClientError, ClientResult, ObjectStore, StoredObject};

type Object = (HashMap<String, String>, Vec<u8>);

/// In-memory [`ObjectStore`] with S3-style inclusive range reads.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Object>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plants a pre-built object, bypassing the encrypting pipeline. Used
    /// to stage envelopes written by older clients.
    pub fn insert_raw(&self, key: &str, metadata: HashMap<String, String>, body: Vec<u8>) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (metadata, body));
    }

    pub fn metadata_of(&self, key: &str) -> HashMap<String, String> {
        self.objects.lock().unwrap()[key].0.clone()
    }

    pub fn body_of(&self, key: &str) -> Vec<u8> {
        self.objects.lock().unwrap()[key].1.clone()
    }

    /// Rewrites one metadata value in place, simulating tampering.
    pub fn tamper_metadata(&self, key: &str, field: &str, value: &str) {
        let mut objects = self.objects.lock().unwrap();
        let (metadata, _) = objects.get_mut(key).unwrap();
        metadata.insert(field.to_string(), value.to_string());
    }

    /// Flips one bit of the stored body.
    pub fn tamper_body(&self, key: &str, index: usize) {
        let mut objects = self.objects.lock().unwrap();
        let (_, body) = objects.get_mut(key).unwrap();
        body[index] ^= 0x01;
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        key: &str,
        metadata: HashMap<String, String>,
        body: Vec<u8>,
    ) -> ClientResult<()> {
        self.insert_raw(key, metadata, body);
        Ok(())
    }

    async fn get_object(&self, key: &str, range: Option<ByteRange>) -> ClientResult<StoredObject> {
        let objects = self.objects.lock().unwrap();
        let (metadata, body) = objects
            .get(key)
            .ok_or_else(|| ClientError::Io(format!("no such key {key:?}")))?;

        let body = match range {
            Some(range) => {
                let start = range.start as usize;
                if start >= body.len() {
                    return Err(ClientError::Io(format!("range start {start} past end")));
                }
                let end = (range.end as usize).min(body.len() - 1);
                body[start..=end].to_vec()
            }
            None => body.clone(),
        };

        Ok(StoredObject {
            metadata: metadata.clone(),
            body,
        })
    }
}
