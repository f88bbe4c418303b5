//! Closed registry of content algorithm suites.
//!
//! Exactly one suite is active (allowed on the write path); the rest exist
//! so that objects written by older clients can still be read.

/// A content encryption algorithm suite and its constants.
///
/// The set is closed: decoding an unknown cipher name fails rather than
/// falling back to a default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlgorithmSuite {
    /// AES-256-GCM, 12-byte IV, 16-byte tag, no KDF. The only suite
    /// permitted on encrypt.
    AesGcm,
    /// AES-256-CBC with PKCS#5 padding, 16-byte IV. Legacy, unauthenticated.
    AesCbc,
    /// AES-256-CTR, 16-byte IV. Legacy, unauthenticated.
    AesCtr,
}

impl AlgorithmSuite {
    /// The suite new objects are written with.
    pub const ACTIVE: AlgorithmSuite = AlgorithmSuite::AesGcm;

    /// Stable numeric identifier.
    pub fn id(&self) -> u16 {
        match self {
            AlgorithmSuite::AesCbc => 0x0070,
            AlgorithmSuite::AesCtr => 0x0071,
            AlgorithmSuite::AesGcm => 0x0078,
        }
    }

    /// Cipher name as stored in `x-amz-cek-alg` and bound into key wraps.
    pub fn cipher_name(&self) -> &'static str {
        match self {
            AlgorithmSuite::AesGcm => "AES/GCM/NoPadding",
            AlgorithmSuite::AesCbc => "AES/CBC/PKCS5Padding",
            AlgorithmSuite::AesCtr => "AES/CTR/NoPadding",
        }
    }

    /// Algorithm of the data key itself.
    pub fn data_key_algorithm(&self) -> &'static str {
        "AES"
    }

    /// Data key length in bytes.
    pub fn data_key_length(&self) -> usize {
        32
    }

    /// Content IV length in bytes.
    pub fn iv_length(&self) -> usize {
        match self {
            AlgorithmSuite::AesGcm => 12,
            AlgorithmSuite::AesCbc | AlgorithmSuite::AesCtr => 16,
        }
    }

    /// Authentication tag length in bytes (0 for unauthenticated suites).
    pub fn tag_length(&self) -> usize {
        match self {
            AlgorithmSuite::AesGcm => 16,
            AlgorithmSuite::AesCbc | AlgorithmSuite::AesCtr => 0,
        }
    }

    /// Authentication tag length in bits.
    pub fn tag_length_bits(&self) -> usize {
        self.tag_length() * 8
    }

    /// Legacy suites are allowed on read only.
    pub fn is_legacy(&self) -> bool {
        !matches!(self, AlgorithmSuite::AesGcm)
    }

    /// Resolves a stored cipher name back to a suite.
    pub fn from_cipher_name(name: &str) -> Option<AlgorithmSuite> {
        match name {
            "AES/GCM/NoPadding" => Some(AlgorithmSuite::AesGcm),
            "AES/CBC/PKCS5Padding" => Some(AlgorithmSuite::AesCbc),
            "AES/CTR/NoPadding" => Some(AlgorithmSuite::AesCtr),
            _ => None,
        }
    }
}

/// Tag lengths (in bits) a stored GCM envelope is allowed to declare.
pub const VALID_TAG_LENGTHS_BITS: [usize; 5] = [96, 104, 112, 120, 128];
