//! # Hashing Utilities
//!
//! Two hash functions, two jobs:
//!
//! - **BLAKE3** backs every consensus digest that gets signed or referenced:
//!   signature hashes and transaction IDs. Fast, and immune to length
//!   extension without the double-hash dance.
//!
//! - **SHA-256** derives unlock hashes (addresses) and their checksums. The
//!   address format is meant to be reproducible by wallets and explorers
//!   that only ship a SHA-2 implementation, so it stays on the boring hash.
//!
//! Both produce 32-byte digests, wrapped in [`Hash`] so a digest can't be
//! confused with an arbitrary byte slice at an API boundary.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use crate::encoding::{Decode, Decoder, Encode, Encoder, EncodingError};

/// Digest length in bytes, shared by BLAKE3 and SHA-256.
pub const HASH_SIZE: usize = 32;

/// Errors from parsing a hex-encoded digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid digest length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// A 32-byte cryptographic digest.
///
/// Rendered as lowercase hex in text form and as 32 raw bytes in the
/// binary wire form.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Wraps raw digest bytes.
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Borrows the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Returns `true` for the all-zero digest.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, HashError> {
        let bytes = hex::decode(s).map_err(|e| HashError::InvalidHex(e.to_string()))?;
        if bytes.len() != HASH_SIZE {
            return Err(HashError::InvalidLength {
                expected: HASH_SIZE,
                got: bytes.len(),
            });
        }
        let mut out = [0u8; HASH_SIZE];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(de::Error::custom)
    }
}

impl Encode for Hash {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write_raw(&self.0);
    }
}

impl Decode for Hash {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Self(dec.read_array::<HASH_SIZE>()?))
    }
}

/// SHA-256 digest as a fixed-size array.
///
/// # Example
///
/// ```
/// use coinmint_protocol::crypto::hash::sha256_array;
///
/// let digest = sha256_array(b"coinmint");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha256_array(data: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; HASH_SIZE];
    output.copy_from_slice(&result);
    output
}

/// BLAKE3 digest of `data`.
///
/// The workhorse for signature hashes and transaction IDs.
pub fn blake3_hash(data: &[u8]) -> Hash {
    Hash(*blake3::hash(data).as_bytes())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
