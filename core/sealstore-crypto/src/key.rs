//! Key material handles with explicit zeroization.
//!
//! Plaintext data keys and symmetric wrapping keys live in owning buffers
//! that overwrite their memory on drop and never appear in debug output.

use crate::error::{CryptoError, CryptoResult};
use crate::random::SecureRandom;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Valid AES key lengths in bytes.
pub const VALID_AES_KEY_LENGTHS: [usize; 3] = [16, 24, 32];

/// A one-shot symmetric key used to encrypt a single object's content.
///
/// The buffer is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DataKey {
    bytes: Vec<u8>,
}

impl DataKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Draws a fresh data key of the given length from the RNG.
    pub fn generate(length: usize, random: &dyn SecureRandom) -> Self {
        let mut bytes = vec![0u8; length];
        random.fill(&mut bytes);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataKey(REDACTED)")
    }
}

/// A long-lived symmetric AES wrapping key. Read-only after construction,
/// zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AesWrappingKey {
    bytes: Vec<u8>,
}

impl AesWrappingKey {
    /// Validates that the key is a legal AES key (128/192/256 bits).
    pub fn new(bytes: Vec<u8>) -> CryptoResult<Self> {
        if !VALID_AES_KEY_LENGTHS.contains(&bytes.len()) {
            return Err(CryptoError::Configuration(format!(
                "invalid AES wrapping key length {}, expecting one of {:?} bytes",
                bytes.len(),
                VALID_AES_KEY_LENGTHS
            )));
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for AesWrappingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AesWrappingKey(REDACTED)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::OsRandom;

    #[test]
    fn generate_draws_requested_length() {
        let dk = DataKey::generate(32, &OsRandom);
        assert_eq!(dk.len(), 32);
    }

    #[test]
    fn debug_does_not_leak_bytes() {
        let dk = DataKey::new(vec![0xAB; 32]);
        let out = format!("{dk:?}");
        assert!(out.contains("REDACTED"));
        assert!(!out.contains("171"));
    }

    #[test]
    fn zeroize_overwrites_buffer() {
        let mut dk = DataKey::new(vec![0xAB; 32]);
        dk.zeroize();
        assert!(dk.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn wrapping_key_rejects_bad_lengths() {
        assert!(AesWrappingKey::new(vec![0u8; 16]).is_ok());
        assert!(AesWrappingKey::new(vec![0u8; 24]).is_ok());
        assert!(AesWrappingKey::new(vec![0u8; 32]).is_ok());
        assert!(AesWrappingKey::new(vec![0u8; 20]).is_err());
        assert!(AesWrappingKey::new(vec![]).is_err());
    }
}
