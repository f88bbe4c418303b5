//! Caller-supplied encryption context.
//!
//! A non-secret string map bound to each crypto operation. Insertion order
//! is irrelevant for equality; the canonical serialization (compact JSON,
//! keys sorted ascending by code point) is what gets stored in object
//! metadata and compared byte-wise on decrypt.

use crate::error::{CryptoError, CryptoResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Context key reserved for internal suite binding; callers may not set it.
pub const RESERVED_CONTEXT_KEY: &str = "aws:x-amz-cek-alg";

/// An immutable-after-build map of UTF-8 key/value pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptionContext {
    entries: BTreeMap<String, String>,
}

impl EncryptionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from key/value pairs, rejecting the reserved key.
    pub fn from_pairs<I, K, V>(pairs: I) -> CryptoResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut ctx = Self::new();
        for (k, v) in pairs {
            ctx.insert(k.into(), v.into())?;
        }
        Ok(ctx)
    }

    /// Adds a pair. The reserved suite-binding key is refused.
    pub fn insert(&mut self, key: String, value: String) -> CryptoResult<()> {
        if key == RESERVED_CONTEXT_KEY {
            return Err(CryptoError::Configuration(format!(
                "encryption context key {RESERVED_CONTEXT_KEY} is reserved"
            )));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical form: compact JSON with keys sorted ascending by code point.
    ///
    /// A `BTreeMap` already iterates in sorted order, so `serde_json` emits
    /// the canonical ordering directly.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(&self.entries).expect("string map serialization cannot fail")
    }

    /// Parses a stored `x-amz-matdesc` JSON object.
    pub fn from_json(json: &str) -> CryptoResult<Self> {
        let entries: BTreeMap<String, String> = serde_json::from_str(json).map_err(|e| {
            CryptoError::TamperedEnvelope(format!("material description is not a JSON string map: {e}"))
        })?;
        Ok(Self { entries })
    }
}
