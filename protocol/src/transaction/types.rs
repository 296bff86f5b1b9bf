//! Core value types shared by every transaction kind.
//!
//! Small and `Copy` where possible. Amounts are integers in the smallest
//! unit; there is no floating point anywhere near money.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::condition::{UnlockCondition, UnlockFulfillment};
use crate::config;
use crate::crypto::hash::Hash;
use crate::encoding::{Decode, Decoder, Encode, Encoder, EncodingError};

/// Block height, counted from genesis at 0.
pub type BlockHeight = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Identifier of a coin or block-stake output.
pub type OutputId = Hash;

// ---------------------------------------------------------------------------
// Specifier
// ---------------------------------------------------------------------------

/// Length of a [`Specifier`] in bytes.
pub const SPECIFIER_SIZE: usize = 16;

/// A fixed 16-byte tag, NUL-padded ASCII.
///
/// Specifiers go at the front of hash pre-images so that two different kinds
/// of object can never produce the same digest input.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Specifier([u8; SPECIFIER_SIZE]);

impl Specifier {
    /// Builds a specifier from a short ASCII tag at compile time.
    ///
    /// A tag longer than 16 bytes fails const evaluation.
    pub const fn from_str_padded(tag: &str) -> Self {
        let bytes = tag.as_bytes();
        assert!(bytes.len() <= SPECIFIER_SIZE, "specifier tag too long");
        let mut out = [0u8; SPECIFIER_SIZE];
        let mut i = 0;
        while i < bytes.len() {
            out[i] = bytes[i];
            i += 1;
        }
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; SPECIFIER_SIZE] {
        &self.0
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(SPECIFIER_SIZE);
        write!(f, "{}", String::from_utf8_lossy(&self.0[..end]))
    }
}

impl fmt::Debug for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Specifier({:?})", self.to_string())
    }
}

impl Encode for Specifier {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write_raw(&self.0);
    }
}

impl Decode for Specifier {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Self(dec.read_array::<SPECIFIER_SIZE>()?))
    }
}

/// Prefixes the id pre-image of a coin creation transaction.
pub const SPECIFIER_COIN_CREATION: Specifier = Specifier::from_str_padded("coin mint tx");

/// Prefixes the id pre-image of a minter definition transaction.
pub const SPECIFIER_MINTER_DEFINITION: Specifier = Specifier::from_str_padded("minter defin tx");

/// Prefixes the id pre-image of a base (v0/v1) transaction.
pub const SPECIFIER_STANDARD_TRANSACTION: Specifier = Specifier::from_str_padded("transaction");

/// Prefixes the derivation of a coin output id.
pub const SPECIFIER_COIN_OUTPUT: Specifier = Specifier::from_str_padded("coin output");

/// Prefixes the derivation of a block-stake output id.
pub const SPECIFIER_BLOCK_STAKE_OUTPUT: Specifier = Specifier::from_str_padded("blstake output");

// ---------------------------------------------------------------------------
// TransactionVersion
// ---------------------------------------------------------------------------

/// The version tag leading every transaction envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionVersion(pub u8);

impl TransactionVersion {
    pub const LEGACY: Self = Self(config::TRANSACTION_VERSION_LEGACY);
    pub const STANDARD: Self = Self(config::TRANSACTION_VERSION_STANDARD);
    pub const MINTER_DEFINITION: Self = Self(config::TRANSACTION_VERSION_MINTER_DEFINITION);
    pub const COIN_CREATION: Self = Self(config::TRANSACTION_VERSION_COIN_CREATION);
}

impl fmt::Display for TransactionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Encode for TransactionVersion {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write_u8(self.0);
    }
}

impl Decode for TransactionVersion {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Self(dec.read_u8()?))
    }
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// An amount of coins in the smallest unit.
///
/// Written as a decimal string in JSON so that values above 2^53 survive
/// JavaScript tooling.
///
/// # Examples
///
/// ```
/// use coinmint_protocol::transaction::types::Currency;
///
/// let fee = Currency::new(100);
/// assert_eq!(serde_json::to_string(&fee).unwrap(), "\"100\"");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Currency(u64);

impl Currency {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl From<u64> for Currency {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Currency {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl Encode for Currency {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write_u64(self.0);
    }
}

impl Decode for Currency {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Self(dec.read_u64()?))
    }
}

// ---------------------------------------------------------------------------
// Outputs and inputs
// ---------------------------------------------------------------------------

/// A value locked behind a condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinOutput {
    pub value: Currency,
    pub condition: UnlockCondition,
}

impl CoinOutput {
    pub fn new(value: Currency, condition: UnlockCondition) -> Self {
        Self { value, condition }
    }
}

impl Encode for CoinOutput {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write(&self.value).write(&self.condition);
    }
}

impl Decode for CoinOutput {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            value: dec.read()?,
            condition: dec.read()?,
        })
    }
}

/// A reference to a spent output plus the evidence that unlocks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinInput {
    #[serde(rename = "parentid")]
    pub parent_id: OutputId,
    pub fulfillment: UnlockFulfillment,
}

impl Encode for CoinInput {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write(&self.parent_id).write(&self.fulfillment);
    }
}

impl Decode for CoinInput {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            parent_id: dec.read()?,
            fulfillment: dec.read()?,
        })
    }
}

/// Block stakes share the coin output layout.
pub type BlockStakeOutput = CoinOutput;

/// Block stakes share the coin input layout.
pub type BlockStakeInput = CoinInput;

/// Serde adapter for opaque byte blobs: standard base64 strings.
pub(crate) mod base64_bytes {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<T: AsRef<[u8]>, S: Serializer>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => BASE64.decode(s).map_err(de::Error::custom),
            None => Ok(Vec::new()),
        }
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
    fn specifiers_are_nul_padded() {
        let bytes = SPECIFIER_COIN_CREATION.as_bytes();
        assert_eq!(&bytes[..12], b"coin mint tx");
        assert!(bytes[12..].iter().all(|&b| b == 0));
        assert_eq!(SPECIFIER_MINTER_DEFINITION.to_string(), "minter defin tx");
    }

    #[test]
    fn specifiers_are_distinct() {
        assert_ne!(SPECIFIER_COIN_CREATION, SPECIFIER_MINTER_DEFINITION);
        assert_ne!(SPECIFIER_COIN_CREATION, SPECIFIER_STANDARD_TRANSACTION);
    }

    #[test]
    fn version_tags() {
        assert_eq!(TransactionVersion::LEGACY.0, 0);
        assert_eq!(TransactionVersion::STANDARD.0, 1);
        assert_eq!(TransactionVersion::MINTER_DEFINITION.0, 128);
        assert_eq!(TransactionVersion::COIN_CREATION.0, 129);
    }

    #[test]
    fn currency_is_a_decimal_string_in_json() {
        let c = Currency::new(18_446_744_073_709_551_615);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"18446744073709551615\"");
        assert_eq!(serde_json::from_str::<Currency>(&json).unwrap(), c);
        assert!(serde_json::from_str::<Currency>("\"-1\"").is_err());
    }

    #[test]
    fn currency_checked_add_overflows_to_none() {
        assert_eq!(Currency::new(1).checked_add(Currency::new(2)), Some(Currency::new(3)));
        assert_eq!(Currency::new(u64::MAX).checked_add(Currency::new(1)), None);
    }

    #[test]
    fn coin_output_binary_layout() {
        let out = CoinOutput::new(Currency::new(100), UnlockCondition::Nil);
        let bytes = encode_to_vec(&out);
        // 8-byte value, 1-byte condition type, 8-byte empty payload length.
        assert_eq!(bytes.len(), 8 + 1 + 8);
        assert_eq!(&bytes[..8], &100u64.to_le_bytes());
        assert_eq!(decode_exact::<CoinOutput>(&bytes).unwrap(), out);
    }
}
