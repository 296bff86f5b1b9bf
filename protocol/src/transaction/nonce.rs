//! The 8-byte uniqueness token carried by mint transactions.
//!
//! Mint transactions spend no inputs, so without a nonce two mints of the
//! same amount to the same address would hash to the same id. The author
//! draws the nonce at random; validators only insist that it is not zero.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::encoding::{Decode, Decoder, Encode, Encoder, EncodingError};

/// Nonce length in bytes.
pub const NONCE_SIZE: usize = 8;

/// Errors from decoding the text form of a nonce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NonceError {
    #[error("invalid nonce encoding: {0}")]
    InvalidEncoding(String),

    #[error("invalid nonce length: expected {NONCE_SIZE} bytes, got {got}")]
    InvalidLength { got: usize },
}

/// An 8-byte transaction nonce.
///
/// Raw bytes in binary form, base64 in JSON.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TransactionNonce([u8; NONCE_SIZE]);

impl TransactionNonce {
    pub const fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Draws a fresh nonce from the OS RNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }

    /// The all-zero nonce is never valid on chain.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; NONCE_SIZE]
    }

    /// Parses the base64 text form, insisting on exactly eight bytes.
    pub fn from_base64(s: &str) -> Result<Self, NonceError> {
        let bytes = BASE64
            .decode(s)
            .map_err(|e| NonceError::InvalidEncoding(e.to_string()))?;
        let arr: [u8; NONCE_SIZE] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| NonceError::InvalidLength { got: bytes.len() })?;
        Ok(Self(arr))
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }
}

/// Parses the `nonce` field of a JSON transaction body ahead of the rest.
///
/// A bad nonce then surfaces as a [`NonceError`] instead of disappearing
/// into a generic JSON error. Absent or non-string fields are left to serde.
pub(crate) fn check_json_nonce(data: &serde_json::Value) -> Result<(), NonceError> {
    if let Some(text) = data.get("nonce").and_then(serde_json::Value::as_str) {
        TransactionNonce::from_base64(text)?;
    }
    Ok(())
}

impl fmt::Debug for TransactionNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionNonce({})", hex::encode(self.0))
    }
}

impl Serialize for TransactionNonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for TransactionNonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(de::Error::custom)
    }
}

impl Encode for TransactionNonce {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write_raw(&self.0);
    }
}

impl Decode for TransactionNonce {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Self(dec.read_array::<NONCE_SIZE>()?))
    }
}
