//! # Key Management
//!
//! Ed25519 keypairs, public keys and signatures as they appear inside mint
//! fulfillments.
//!
//! ## Wire shapes
//!
//! - A [`PublicKey`] is written as `ed25519:<64 hex chars>` in text form and
//!   as a 16-byte algorithm specifier followed by a length-prefixed key in
//!   binary form. The algorithm prefix leaves room for future schemes
//!   without a format break.
//! - A [`Signature`] is 64 bytes: hex in text form, length-prefixed in
//!   binary form.
//!
//! ## Security considerations
//!
//! - Keys are generated from `OsRng`.
//! - Verification is strict (`verify_strict`): malleable and small-order
//!   signatures are rejected. Consensus code can't afford two nodes
//!   disagreeing about an edge-case signature.
//! - Secret key bytes never reach `Debug` output or logs.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::encoding::{Decode, Decoder, Encode, Encoder, EncodingError};
use crate::transaction::types::Specifier;

/// Algorithm specifier for Ed25519 keys, NUL-padded to 16 bytes.
pub const ED25519_SPECIFIER: Specifier = Specifier::from_str_padded("ed25519");

/// Text prefix for Ed25519 public keys.
const ED25519_PREFIX: &str = "ed25519";

/// Ed25519 public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Errors that can occur during key operations.
///
/// Intentionally terse about *why* secret material was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes")]
    InvalidSecretKey,

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid signature: expected {SIGNATURE_LENGTH} bytes, got {0}")]
    InvalidSignatureLength(usize),
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// An Ed25519 signing keypair.
///
/// Deliberately not `Serialize`: exporting a secret should be a conscious
/// call to [`Keypair::secret_key_bytes`], not a side effect of a JSON dump.
///
/// # Examples
///
/// ```
/// use coinmint_protocol::crypto::keys::Keypair;
///
/// let kp = Keypair::generate();
/// let sig = kp.sign(b"mint 100 coins");
/// assert!(kp.public_key().verify(b"mint 100 coins", &sig));
/// ```
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded 32-byte seed.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// Returns the public key associated with this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message. Deterministic per RFC 8032.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    /// Exports the raw 32-byte secret seed. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair(pub={})", self.public_key())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// An Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    /// Wraps raw key bytes without curve validation.
    ///
    /// Invalid points are caught at verification time, where they simply
    /// fail to verify.
    pub const fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Strict Ed25519 verification of `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&signature.0);
        verifying_key.verify_strict(message, &sig).is_ok()
    }

    fn from_key_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] = slice.try_into().map_err(|_| {
            KeyError::InvalidPublicKey(format!(
                "expected {} bytes, got {}",
                PUBLIC_KEY_LENGTH,
                slice.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", ED25519_PREFIX, hex::encode(self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl std::str::FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, key_hex) = s
            .split_once(':')
            .ok_or_else(|| KeyError::InvalidPublicKey(format!("missing algorithm prefix in {s:?}")))?;
        if algorithm != ED25519_PREFIX {
            return Err(KeyError::UnsupportedAlgorithm(algorithm.to_string()));
        }
        let bytes =
            hex::decode(key_hex).map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        Self::from_key_slice(&bytes)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl Encode for PublicKey {
    fn encode_to(&self, enc: &mut Encoder) {
        ED25519_SPECIFIER.encode_to(enc);
        enc.write_bytes(&self.0);
    }
}

impl Decode for PublicKey {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        let algorithm = Specifier::decode_from(dec)?;
        if algorithm != ED25519_SPECIFIER {
            return Err(EncodingError::Invalid(format!(
                "unsupported key algorithm {algorithm}"
            )));
        }
        let key = dec.read_bytes()?;
        PublicKey::from_key_slice(key).map_err(|e| EncodingError::Invalid(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Wraps raw signature bytes.
    pub const fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parses a signature from a slice, enforcing the 64-byte length.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; SIGNATURE_LENGTH] = slice
            .try_into()
            .map_err(|_| KeyError::InvalidSignatureLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Lowercase hex, 128 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(de::Error::custom)?;
        Signature::try_from_slice(&bytes).map_err(de::Error::custom)
    }
}

impl Encode for Signature {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write_bytes(&self.0);
    }
}

impl Decode for Signature {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        let bytes = dec.read_bytes()?;
        Signature::try_from_slice(bytes).map_err(|e| EncodingError::Invalid(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{decode_exact, encode_to_vec};

    #[test]
    fn sign_and_verify() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"hello");
        assert!(kp.public_key().verify(b"hello", &sig));
        assert!(!kp.public_key().verify(b"hellp", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = kp1.sign(b"msg");
        assert!(!kp2.public_key().verify(b"msg", &sig));
    }

    #[test]
    fn seed_is_deterministic() {
        let a = Keypair::from_seed(&[7u8; 32]);
        let b = Keypair::from_seed(&[7u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.sign(b"m"), b.sign(b"m"));
    }

    #[test]
    fn from_hex_matches_from_seed() {
        let kp = Keypair::from_hex(&"11".repeat(32)).unwrap();
        assert_eq!(kp.public_key(), Keypair::from_seed(&[0x11; 32]).public_key());
        assert!(matches!(
            Keypair::from_hex("1234"),
            Err(KeyError::InvalidSecretKey)
        ));
    }

    #[test]
    fn public_key_text_form() {
        let kp = Keypair::from_seed(&[1u8; 32]);
        let pk = kp.public_key();
        let text = pk.to_string();
        assert!(text.starts_with("ed25519:"));
        assert_eq!(text.len(), "ed25519:".len() + 64);
        assert_eq!(text.parse::<PublicKey>().unwrap(), pk);
    }

    #[test]
    fn public_key_rejects_unknown_algorithm() {
        let text = format!("secp256k1:{}", "00".repeat(32));
        assert!(matches!(
            text.parse::<PublicKey>(),
            Err(KeyError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn public_key_binary_form() {
        let pk = Keypair::from_seed(&[2u8; 32]).public_key();
        let bytes = encode_to_vec(&pk);
        // 16-byte specifier, 8-byte length, 32-byte key.
        assert_eq!(bytes.len(), 16 + 8 + 32);
        assert_eq!(&bytes[..7], b"ed25519");
        assert_eq!(decode_exact::<PublicKey>(&bytes).unwrap(), pk);
    }

    #[test]
    fn signature_length_is_enforced() {
        assert!(matches!(
            Signature::try_from_slice(&[0u8; 63]),
            Err(KeyError::InvalidSignatureLength(63))
        ));
    }

    #[test]
    fn debug_never_prints_secret() {
        let kp = Keypair::from_seed(&[9u8; 32]);
        let dbg = format!("{:?}", kp);
        assert!(!dbg.contains(&hex::encode([9u8; 32])));
    }
}
