//! Unlock hashes: the address form of a condition.
//!
//! ```text
//! text   = hex(type) ‖ hex(hash) ‖ hex(checksum)      78 characters
//! binary = type (1 byte) ‖ hash (32 bytes)
//!
//! checksum        = SHA-256(type ‖ hash)[..6]
//! pubkey hash     = SHA-256(ed25519 specifier ‖ key)
//! ```

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::crypto::hash::{sha256_array, Hash, HASH_SIZE};
use crate::crypto::keys::{PublicKey, ED25519_SPECIFIER};
use crate::encoding::{Decode, Decoder, Encode, Encoder, EncodingError};

/// Length of the checksum appended to the text form.
pub const UNLOCK_HASH_CHECKSUM_SIZE: usize = 6;

/// Length of the text form in characters.
pub const UNLOCK_HASH_STRING_LENGTH: usize = 2 * (1 + HASH_SIZE + UNLOCK_HASH_CHECKSUM_SIZE);

/// Errors from parsing the text form of an unlock hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnlockHashError {
    #[error("invalid unlock hash length: expected {UNLOCK_HASH_STRING_LENGTH} characters, got {0}")]
    InvalidLength(usize),

    #[error("invalid unlock hash hex: {0}")]
    InvalidHex(String),

    #[error("unknown unlock type {0}")]
    UnknownType(u8),

    #[error("unlock hash checksum mismatch")]
    ChecksumMismatch,
}

/// The kind of authority an unlock hash commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum UnlockType {
    Nil = 0,
    /// Hash of a single Ed25519 public key.
    PubKey = 1,
    /// Hash of an atomic swap contract.
    AtomicSwap = 2,
    /// Hash of a multi-signature condition.
    MultiSig = 3,
}

impl TryFrom<u8> for UnlockType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Nil),
            1 => Ok(Self::PubKey),
            2 => Ok(Self::AtomicSwap),
            3 => Ok(Self::MultiSig),
            other => Err(other),
        }
    }
}

impl fmt::Display for UnlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::PubKey => write!(f, "pubkey"),
            Self::AtomicSwap => write!(f, "atomicswap"),
            Self::MultiSig => write!(f, "multisig"),
        }
    }
}

/// A typed 32-byte commitment to whoever may fulfill a condition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnlockHash {
    pub unlock_type: UnlockType,
    pub hash: Hash,
}

impl UnlockHash {
    pub const fn new(unlock_type: UnlockType, hash: Hash) -> Self {
        Self { unlock_type, hash }
    }

    /// The nil unlock hash: type 0, all-zero hash.
    pub const fn nil() -> Self {
        Self::new(UnlockType::Nil, Hash::from_bytes([0u8; HASH_SIZE]))
    }

    /// Derives the PubKey unlock hash of an Ed25519 public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let mut preimage = Vec::with_capacity(16 + 32);
        preimage.extend_from_slice(ED25519_SPECIFIER.as_bytes());
        preimage.extend_from_slice(public_key.as_bytes());
        Self::new(UnlockType::PubKey, Hash::from_bytes(sha256_array(&preimage)))
    }

    fn checksum(&self) -> [u8; UNLOCK_HASH_CHECKSUM_SIZE] {
        let mut preimage = Vec::with_capacity(1 + HASH_SIZE);
        preimage.push(self.unlock_type as u8);
        preimage.extend_from_slice(self.hash.as_bytes());
        let digest = sha256_array(&preimage);
        let mut out = [0u8; UNLOCK_HASH_CHECKSUM_SIZE];
        out.copy_from_slice(&digest[..UNLOCK_HASH_CHECKSUM_SIZE]);
        out
    }
}

impl Default for UnlockHash {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Display for UnlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}{}{}",
            self.unlock_type as u8,
            self.hash.to_hex(),
            hex::encode(self.checksum())
        )
    }
}

impl fmt::Debug for UnlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnlockHash({})", self)
    }
}

impl FromStr for UnlockHash {
    type Err = UnlockHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != UNLOCK_HASH_STRING_LENGTH {
            return Err(UnlockHashError::InvalidLength(s.len()));
        }
        let bytes = hex::decode(s).map_err(|e| UnlockHashError::InvalidHex(e.to_string()))?;
        let unlock_type = UnlockType::try_from(bytes[0]).map_err(UnlockHashError::UnknownType)?;
        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&bytes[1..1 + HASH_SIZE]);
        let uh = Self::new(unlock_type, Hash::from_bytes(hash));
        if uh.checksum()[..] != bytes[1 + HASH_SIZE..] {
            return Err(UnlockHashError::ChecksumMismatch);
        }
        Ok(uh)
    }
}

impl Serialize for UnlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UnlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl Encode for UnlockHash {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write_u8(self.unlock_type as u8);
        enc.write_raw(self.hash.as_bytes());
    }
}

impl Decode for UnlockHash {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        let raw_type = dec.read_u8()?;
        let unlock_type =
            UnlockType::try_from(raw_type).map_err(|value| EncodingError::UnknownDiscriminant {
                what: "unlock type",
                value,
            })?;
        let hash = Hash::from_bytes(dec.read_array::<HASH_SIZE>()?);
        Ok(Self::new(unlock_type, hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::Keypair;
    use crate::encoding::{decode_exact, encode_to_vec};

    // Seed sha256("coinmint devnet minter key"); the devnet genesis minter.
    const DEV_SEED_HEX: &str = "81be556309aad969cc3cd49d75e66a8d639a27b76f345e3f93d5b5ec178060e9";
    const DEV_UNLOCK_HASH: &str =
        "01760c8e399d29db362fc150b5367f215124bbb17dd4978e771edf0fd16f098e5c67a9e4e2ce1a";

    #[test]
    fn pubkey_unlock_hash_matches_reference_vector() {
        let kp = Keypair::from_hex(DEV_SEED_HEX).unwrap();
        let uh = UnlockHash::from_public_key(&kp.public_key());
        assert_eq!(uh.to_string(), DEV_UNLOCK_HASH);
    }

    #[test]
    fn string_roundtrip() {
        let uh: UnlockHash = DEV_UNLOCK_HASH.parse().unwrap();
        assert_eq!(uh.unlock_type, UnlockType::PubKey);
        assert_eq!(uh.to_string(), DEV_UNLOCK_HASH);
    }

    #[test]
    fn nil_unlock_hash_text_form() {
        let text = UnlockHash::nil().to_string();
        assert_eq!(text.len(), UNLOCK_HASH_STRING_LENGTH);
        assert!(text.starts_with("00"));
        assert_eq!(text.parse::<UnlockHash>().unwrap(), UnlockHash::nil());
    }

    #[test]
    fn checksum_mismatch_is_detected() {
        let mut text = DEV_UNLOCK_HASH.to_string();
        text.replace_range(76..78, "00");
        assert_eq!(
            text.parse::<UnlockHash>(),
            Err(UnlockHashError::ChecksumMismatch)
        );
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert_eq!(
            "0102".parse::<UnlockHash>(),
            Err(UnlockHashError::InvalidLength(4))
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut text = DEV_UNLOCK_HASH.to_string();
        text.replace_range(0..2, "09");
        assert_eq!(text.parse::<UnlockHash>(), Err(UnlockHashError::UnknownType(9)));
    }

    #[test]
    fn binary_form_is_type_then_hash() {
        let uh: UnlockHash = DEV_UNLOCK_HASH.parse().unwrap();
        let bytes = encode_to_vec(&uh);
        assert_eq!(bytes.len(), 33);
        assert_eq!(bytes[0], 1);
        assert_eq!(decode_exact::<UnlockHash>(&bytes).unwrap(), uh);
    }
}
