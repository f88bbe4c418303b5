//! Injectable source of cryptographic randomness.
//!
//! Keyrings and content strategies draw IVs and data keys through this
//! seam so tests can substitute a deterministic source. The default is the
//! operating system RNG.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

/// A thread-safe source of cryptographically secure random bytes.
pub trait SecureRandom: Send + Sync {
    fn fill(&self, dest: &mut [u8]);
}

/// The operating system RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill(&self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}

/// Adapts a [`SecureRandom`] to the `rand_core` traits required by the
/// RSA padding implementation.
pub(crate) struct RandCompat<'a>(pub &'a dyn SecureRandom);

impl RngCore for RandCompat<'_> {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.0.fill(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.0.fill(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.fill(dest);
        Ok(())
    }
}

impl CryptoRng for RandCompat<'_> {}
