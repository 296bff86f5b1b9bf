//! # Unlock Conditions
//!
//! An [`UnlockCondition`] says who may authorise something; an
//! [`UnlockFulfillment`] is the evidence presented against it. Mint
//! transactions use the same pair to decide who may create coins, so
//! everything in here is consensus code.
//!
//! ```text
//! unlock_hash.rs  UnlockHash, the address form of a condition
//! fulfillment.rs  UnlockFulfillment variants
//! signer.rs       KeySigner, the Ed25519 signing callback
//! ```
//!
//! ## Two questions
//!
//! - [`UnlockCondition::is_standard`]: may this shape be relayed and mined
//!   at all? Depends on block height (multi-signature activates late on the
//!   standard network).
//! - [`UnlockCondition::fulfill`]: does this evidence satisfy the condition
//!   for this transaction, at this height and time?
//!
//! Signatures never cover raw transactions. The caller supplies a
//! [`SignatureHasher`] that turns a signer's public key into the 32-byte
//! digest that key must have signed.

pub mod fulfillment;
pub mod signer;
pub mod unlock_hash;

pub use fulfillment::{
    FulfillmentType, MultiSignatureFulfillment, PublicKeySignaturePair,
    SingleSignatureFulfillment, UnlockFulfillment,
};
pub use signer::KeySigner;
pub use unlock_hash::{UnlockHash, UnlockHashError, UnlockType};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::crypto::hash::{sha256_array, Hash};
use crate::crypto::keys::PublicKey;
use crate::encoding::{decode_exact, encode_to_vec, Decode, Decoder, Encode, Encoder, EncodingError};
use crate::transaction::types::{BlockHeight, Timestamp};

/// Lock times below this value are block heights; at or above, Unix seconds.
pub const LOCKTIME_THRESHOLD: u64 = 500_000_000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a condition is not standard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("unlock hash of type {0} is not a standard condition")]
    NonStandardUnlockType(UnlockType),

    #[error("time lock of zero is not allowed")]
    ZeroLockTime,

    #[error("time locks cannot wrap another time lock")]
    NestedTimeLock,

    #[error("multi-signature conditions activate at height {activation_height}, block is at {height}")]
    MultiSignatureNotActive {
        height: BlockHeight,
        activation_height: BlockHeight,
    },

    #[error("multi-signature condition lists no unlock hashes")]
    EmptyMultiSignature,

    #[error("multi-signature threshold {min_signatures} is invalid for {keys} keys")]
    InvalidSignatureThreshold { min_signatures: u64, keys: usize },

    #[error("multi-signature member of type {0} is not a public key")]
    NonPubKeyMultiSignatureMember(UnlockType),

    #[error("unlock hash {0} listed twice")]
    DuplicateUnlockHash(UnlockHash),
}

/// Why a fulfillment does not satisfy a condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FulfillmentError {
    #[error("{fulfillment} fulfillment cannot satisfy a {condition} condition")]
    UnexpectedFulfillment {
        condition: ConditionType,
        fulfillment: FulfillmentType,
    },

    #[error("public key hashes to {got}, condition requires {expected}")]
    UnlockHashMismatch { expected: UnlockHash, got: UnlockHash },

    #[error("signature by {public_key} does not verify")]
    InvalidSignature { public_key: PublicKey },

    #[error("unlock hashes of type {0} cannot be fulfilled here")]
    UnsupportedUnlockType(UnlockType),

    #[error("condition is locked until {lock_time}")]
    TimeLocked { lock_time: u64 },

    #[error("time locks cannot wrap another time lock")]
    NestedTimeLock,

    #[error("{public_key} is not a member of the multi-signature condition")]
    UnauthorizedKey { public_key: PublicKey },

    #[error("{public_key} signed more than once")]
    DuplicateSignature { public_key: PublicKey },

    #[error("{got} valid signatures, {required} required")]
    InsufficientSignatures { required: u64, got: u64 },

    #[error("none of the signing keys is authorised by the condition")]
    NoMatchingKey,
}

// ---------------------------------------------------------------------------
// Contexts
// ---------------------------------------------------------------------------

/// Produces the digest a given public key is expected to sign.
///
/// Implemented by every transaction kind over its own signature pre-image.
pub trait SignatureHasher {
    fn signature_hash(&self, public_key: &PublicKey) -> Hash;
}

/// Chain position and signature pre-image for a fulfillment check.
#[derive(Clone, Copy)]
pub struct FulfillContext<'a> {
    pub block_height: BlockHeight,
    pub block_time: Timestamp,
    pub hasher: &'a dyn SignatureHasher,
}

/// Chain position for a standardness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardContext {
    pub block_height: BlockHeight,
    pub multisig_activation_height: BlockHeight,
}

// ---------------------------------------------------------------------------
// Condition types
// ---------------------------------------------------------------------------

/// Type byte of a condition in both wire forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConditionType {
    Nil = 0,
    UnlockHash = 1,
    TimeLock = 3,
    MultiSignature = 4,
}

impl TryFrom<u8> for ConditionType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Nil),
            1 => Ok(Self::UnlockHash),
            3 => Ok(Self::TimeLock),
            4 => Ok(Self::MultiSignature),
            other => Err(other),
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::UnlockHash => write!(f, "unlockhash"),
            Self::TimeLock => write!(f, "timelock"),
            Self::MultiSignature => write!(f, "multisig"),
        }
    }
}

/// Wraps another condition until a height or time is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLockCondition {
    #[serde(rename = "locktime")]
    pub lock_time: u64,
    pub condition: Box<UnlockCondition>,
}

/// Requires signatures from at least `min_signatures` of the listed keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSignatureCondition {
    #[serde(rename = "unlockhashes")]
    pub unlock_hashes: Vec<UnlockHash>,
    #[serde(rename = "minimumsignaturecount")]
    pub min_signatures: u64,
}

impl MultiSignatureCondition {
    /// Order-independent address of the condition.
    pub fn unlock_hash(&self) -> UnlockHash {
        let mut sorted = self.unlock_hashes.clone();
        sorted.sort();
        let mut enc = Encoder::new();
        enc.write(&self.min_signatures).write(&sorted);
        UnlockHash::new(
            UnlockType::MultiSig,
            Hash::from_bytes(sha256_array(&enc.finish())),
        )
    }
}

#[derive(Serialize, Deserialize)]
struct UnlockHashData {
    #[serde(rename = "unlockhash")]
    unlock_hash: UnlockHash,
}

/// A predicate over who may authorise a value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UnlockCondition {
    /// Anyone with any valid signature.
    #[default]
    Nil,
    UnlockHash(UnlockHash),
    TimeLock(TimeLockCondition),
    MultiSignature(MultiSignatureCondition),
}

impl UnlockCondition {
    /// Single-key condition for `public_key`.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self::UnlockHash(UnlockHash::from_public_key(public_key))
    }

    pub fn multi_signature(unlock_hashes: Vec<UnlockHash>, min_signatures: u64) -> Self {
        Self::MultiSignature(MultiSignatureCondition {
            unlock_hashes,
            min_signatures,
        })
    }

    pub fn time_lock(lock_time: u64, condition: UnlockCondition) -> Self {
        Self::TimeLock(TimeLockCondition {
            lock_time,
            condition: Box::new(condition),
        })
    }

    pub fn condition_type(&self) -> ConditionType {
        match self {
            Self::Nil => ConditionType::Nil,
            Self::UnlockHash(_) => ConditionType::UnlockHash,
            Self::TimeLock(_) => ConditionType::TimeLock,
            Self::MultiSignature(_) => ConditionType::MultiSignature,
        }
    }

    /// The address this condition pays to. Time locks are transparent.
    pub fn unlock_hash(&self) -> UnlockHash {
        match self {
            Self::Nil => UnlockHash::nil(),
            Self::UnlockHash(uh) => *uh,
            Self::TimeLock(tl) => tl.condition.unlock_hash(),
            Self::MultiSignature(ms) => ms.unlock_hash(),
        }
    }

    /// Whether the network relays and mines this condition shape.
    pub fn is_standard(&self, ctx: &StandardContext) -> Result<(), ConditionError> {
        match self {
            Self::Nil => Ok(()),
            Self::UnlockHash(uh) => match uh.unlock_type {
                UnlockType::PubKey | UnlockType::AtomicSwap => Ok(()),
                other => Err(ConditionError::NonStandardUnlockType(other)),
            },
            Self::TimeLock(tl) => {
                if tl.lock_time == 0 {
                    return Err(ConditionError::ZeroLockTime);
                }
                if matches!(*tl.condition, Self::TimeLock(_)) {
                    return Err(ConditionError::NestedTimeLock);
                }
                tl.condition.is_standard(ctx)
            }
            Self::MultiSignature(ms) => {
                if ctx.block_height < ctx.multisig_activation_height {
                    return Err(ConditionError::MultiSignatureNotActive {
                        height: ctx.block_height,
                        activation_height: ctx.multisig_activation_height,
                    });
                }
                if ms.unlock_hashes.is_empty() {
                    return Err(ConditionError::EmptyMultiSignature);
                }
                if ms.min_signatures == 0 || ms.min_signatures > ms.unlock_hashes.len() as u64 {
                    return Err(ConditionError::InvalidSignatureThreshold {
                        min_signatures: ms.min_signatures,
                        keys: ms.unlock_hashes.len(),
                    });
                }
                let mut seen = HashSet::with_capacity(ms.unlock_hashes.len());
                for uh in &ms.unlock_hashes {
                    if uh.unlock_type != UnlockType::PubKey {
                        return Err(ConditionError::NonPubKeyMultiSignatureMember(uh.unlock_type));
                    }
                    if !seen.insert(*uh) {
                        return Err(ConditionError::DuplicateUnlockHash(*uh));
                    }
                }
                Ok(())
            }
        }
    }

    /// Checks `fulfillment` against this condition.
    pub fn fulfill(
        &self,
        fulfillment: &UnlockFulfillment,
        ctx: &FulfillContext<'_>,
    ) -> Result<(), FulfillmentError> {
        match self {
            Self::Nil => {
                let single = self.expect_single(fulfillment)?;
                verify_single(single, ctx)
            }
            Self::UnlockHash(uh) => match uh.unlock_type {
                UnlockType::PubKey => {
                    let single = self.expect_single(fulfillment)?;
                    let got = UnlockHash::from_public_key(&single.public_key);
                    if got != *uh {
                        return Err(FulfillmentError::UnlockHashMismatch { expected: *uh, got });
                    }
                    verify_single(single, ctx)
                }
                other => Err(FulfillmentError::UnsupportedUnlockType(other)),
            },
            Self::TimeLock(tl) => {
                let reached = if tl.lock_time < LOCKTIME_THRESHOLD {
                    ctx.block_height >= tl.lock_time
                } else {
                    ctx.block_time >= tl.lock_time
                };
                if !reached {
                    return Err(FulfillmentError::TimeLocked {
                        lock_time: tl.lock_time,
                    });
                }
                if matches!(*tl.condition, Self::TimeLock(_)) {
                    return Err(FulfillmentError::NestedTimeLock);
                }
                tl.condition.fulfill(fulfillment, ctx)
            }
            Self::MultiSignature(ms) => {
                let UnlockFulfillment::MultiSignature(multi) = fulfillment else {
                    return Err(FulfillmentError::UnexpectedFulfillment {
                        condition: ConditionType::MultiSignature,
                        fulfillment: fulfillment.fulfillment_type(),
                    });
                };
                let members: HashSet<&UnlockHash> = ms.unlock_hashes.iter().collect();
                let mut signed = HashSet::with_capacity(multi.pairs.len());
                for pair in &multi.pairs {
                    let uh = UnlockHash::from_public_key(&pair.public_key);
                    if !members.contains(&uh) {
                        return Err(FulfillmentError::UnauthorizedKey {
                            public_key: pair.public_key,
                        });
                    }
                    if !signed.insert(uh) {
                        return Err(FulfillmentError::DuplicateSignature {
                            public_key: pair.public_key,
                        });
                    }
                    let digest = ctx.hasher.signature_hash(&pair.public_key);
                    if !pair.public_key.verify(digest.as_bytes(), &pair.signature) {
                        return Err(FulfillmentError::InvalidSignature {
                            public_key: pair.public_key,
                        });
                    }
                }
                let got = signed.len() as u64;
                if got < ms.min_signatures {
                    return Err(FulfillmentError::InsufficientSignatures {
                        required: ms.min_signatures,
                        got,
                    });
                }
                Ok(())
            }
        }
    }

    fn expect_single<'f>(
        &self,
        fulfillment: &'f UnlockFulfillment,
    ) -> Result<&'f SingleSignatureFulfillment, FulfillmentError> {
        match fulfillment {
            UnlockFulfillment::SingleSignature(single) => Ok(single),
            other => Err(FulfillmentError::UnexpectedFulfillment {
                condition: self.condition_type(),
                fulfillment: other.fulfillment_type(),
            }),
        }
    }
}

fn verify_single(
    single: &SingleSignatureFulfillment,
    ctx: &FulfillContext<'_>,
) -> Result<(), FulfillmentError> {
    let digest = ctx.hasher.signature_hash(&single.public_key);
    if single.public_key.verify(digest.as_bytes(), &single.signature) {
        Ok(())
    } else {
        Err(FulfillmentError::InvalidSignature {
            public_key: single.public_key,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire forms
// ---------------------------------------------------------------------------

/// `{"type": N, "data": {...}}`, with `data` absent for nil variants.
#[derive(Serialize)]
pub(crate) struct TaggedRef<'a, T: Serialize> {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a T>,
}

#[derive(Deserialize)]
pub(crate) struct TaggedValue {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub data: serde_json::Value,
}

pub(crate) fn data_from_value<T, E>(data: serde_json::Value) -> Result<T, E>
where
    T: serde::de::DeserializeOwned,
    E: de::Error,
{
    serde_json::from_value(data).map_err(E::custom)
}

impl Serialize for UnlockCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = self.condition_type() as u8;
        match self {
            Self::Nil => TaggedRef::<()> { kind, data: None }.serialize(serializer),
            Self::UnlockHash(uh) => TaggedRef {
                kind,
                data: Some(&UnlockHashData { unlock_hash: *uh }),
            }
            .serialize(serializer),
            Self::TimeLock(tl) => TaggedRef { kind, data: Some(tl) }.serialize(serializer),
            Self::MultiSignature(ms) => TaggedRef { kind, data: Some(ms) }.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for UnlockCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tagged = TaggedValue::deserialize(deserializer)?;
        match ConditionType::try_from(tagged.kind) {
            Ok(ConditionType::Nil) => Ok(Self::Nil),
            Ok(ConditionType::UnlockHash) => {
                let data: UnlockHashData = data_from_value::<_, D::Error>(tagged.data)?;
                Ok(Self::UnlockHash(data.unlock_hash))
            }
            Ok(ConditionType::TimeLock) => {
                let tl: TimeLockCondition = data_from_value::<_, D::Error>(tagged.data)?;
                if matches!(*tl.condition, Self::TimeLock(_)) {
                    return Err(de::Error::custom("time lock nested in a time lock"));
                }
                Ok(Self::TimeLock(tl))
            }
            Ok(ConditionType::MultiSignature) => {
                Ok(Self::MultiSignature(data_from_value::<_, D::Error>(tagged.data)?))
            }
            Err(other) => Err(de::Error::custom(format!("unknown condition type {other}"))),
        }
    }
}

impl Encode for UnlockCondition {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write_u8(self.condition_type() as u8);
        let payload = match self {
            Self::Nil => Vec::new(),
            Self::UnlockHash(uh) => encode_to_vec(uh),
            Self::TimeLock(tl) => {
                let mut inner = Encoder::new();
                inner.write(&tl.lock_time).write(tl.condition.as_ref());
                inner.finish()
            }
            Self::MultiSignature(ms) => {
                let mut inner = Encoder::new();
                inner.write(&ms.min_signatures).write(&ms.unlock_hashes);
                inner.finish()
            }
        };
        enc.write_bytes(&payload);
    }
}

impl Decode for UnlockCondition {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        let raw_type = dec.read_u8()?;
        let payload = dec.read_bytes()?;
        match ConditionType::try_from(raw_type) {
            Ok(ConditionType::Nil) => {
                if !payload.is_empty() {
                    return Err(EncodingError::TrailingBytes(payload.len()));
                }
                Ok(Self::Nil)
            }
            Ok(ConditionType::UnlockHash) => Ok(Self::UnlockHash(decode_exact(payload)?)),
            Ok(ConditionType::TimeLock) => {
                // The inner type byte sits right after the lock time. Refuse a
                // nested lock before recursing so depth stays bounded.
                if payload.get(8) == Some(&(ConditionType::TimeLock as u8)) {
                    return Err(EncodingError::Invalid("time lock nested in a time lock".into()));
                }
                let mut inner = Decoder::new(payload);
                let lock_time = inner.read_u64()?;
                let condition = inner.read::<UnlockCondition>()?;
                inner.finish()?;
                Ok(Self::time_lock(lock_time, condition))
            }
            Ok(ConditionType::MultiSignature) => {
                let mut inner = Decoder::new(payload);
                let min_signatures = inner.read_u64()?;
                let unlock_hashes = inner.read::<Vec<UnlockHash>>()?;
                inner.finish()?;
                Ok(Self::multi_signature(unlock_hashes, min_signatures))
            }
            Err(value) => Err(EncodingError::UnknownDiscriminant {
                what: "condition type",
                value,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::blake3_hash;
    use crate::crypto::keys::Keypair;

    /// Every key signs the same fixed digest.
    struct FixedHasher(Hash);

    impl SignatureHasher for FixedHasher {
        fn signature_hash(&self, _public_key: &PublicKey) -> Hash {
            self.0
        }
    }

    fn hasher() -> FixedHasher {
        FixedHasher(blake3_hash(b"condition tests"))
    }

    fn ctx(hasher: &FixedHasher, block_height: u64) -> FulfillContext<'_> {
        FulfillContext {
            block_height,
            block_time: 1_600_000_000,
            hasher,
        }
    }

    fn single(kp: &Keypair, h: &FixedHasher) -> UnlockFulfillment {
        UnlockFulfillment::SingleSignature(SingleSignatureFulfillment {
            public_key: kp.public_key(),
            signature: kp.sign(h.0.as_bytes()),
        })
    }

    fn pair(kp: &Keypair, h: &FixedHasher) -> PublicKeySignaturePair {
        PublicKeySignaturePair {
            public_key: kp.public_key(),
            signature: kp.sign(h.0.as_bytes()),
        }
    }

    fn keys(n: u8) -> Vec<Keypair> {
        (1..=n).map(|i| Keypair::from_seed(&[i; 32])).collect()
    }

    fn multisig(keys: &[Keypair], min: u64) -> UnlockCondition {
        UnlockCondition::multi_signature(
            keys.iter().map(|k| UnlockHash::from_public_key(&k.public_key())).collect(),
            min,
        )
    }

    const STD: StandardContext = StandardContext {
        block_height: 100,
        multisig_activation_height: 0,
    };

    #[test]
    fn pubkey_condition_accepts_matching_signature() {
        let h = hasher();
        let kp = Keypair::from_seed(&[1; 32]);
        let cond = UnlockCondition::from_public_key(&kp.public_key());
        cond.fulfill(&single(&kp, &h), &ctx(&h, 0)).unwrap();
    }

    #[test]
    fn pubkey_condition_rejects_other_key() {
        let h = hasher();
        let owner = Keypair::from_seed(&[1; 32]);
        let thief = Keypair::from_seed(&[2; 32]);
        let cond = UnlockCondition::from_public_key(&owner.public_key());
        match cond.fulfill(&single(&thief, &h), &ctx(&h, 0)) {
            Err(FulfillmentError::UnlockHashMismatch { .. }) => {}
            other => panic!("expected UnlockHashMismatch, got {:?}", other),
        }
    }

    #[test]
    fn pubkey_condition_rejects_bad_signature() {
        let h = hasher();
        let kp = Keypair::from_seed(&[1; 32]);
        let cond = UnlockCondition::from_public_key(&kp.public_key());
        let forged = UnlockFulfillment::SingleSignature(SingleSignatureFulfillment {
            public_key: kp.public_key(),
            signature: kp.sign(b"something else"),
        });
        match cond.fulfill(&forged, &ctx(&h, 0)) {
            Err(FulfillmentError::InvalidSignature { .. }) => {}
            other => panic!("expected InvalidSignature, got {:?}", other),
        }
    }

    #[test]
    fn nil_fulfillment_never_satisfies() {
        let h = hasher();
        let kp = Keypair::from_seed(&[1; 32]);
        let cond = UnlockCondition::from_public_key(&kp.public_key());
        match cond.fulfill(&UnlockFulfillment::Nil, &ctx(&h, 0)) {
            Err(FulfillmentError::UnexpectedFulfillment {
                condition: ConditionType::UnlockHash,
                fulfillment: FulfillmentType::Nil,
            }) => {}
            other => panic!("expected UnexpectedFulfillment, got {:?}", other),
        }
    }

    #[test]
    fn nil_condition_accepts_any_signer() {
        let h = hasher();
        let kp = Keypair::from_seed(&[5; 32]);
        UnlockCondition::Nil.fulfill(&single(&kp, &h), &ctx(&h, 0)).unwrap();
    }

    #[test]
    fn multisig_threshold_is_enforced() {
        let h = hasher();
        let ks = keys(3);
        let cond = multisig(&ks, 2);

        let one = UnlockFulfillment::MultiSignature(MultiSignatureFulfillment {
            pairs: vec![pair(&ks[0], &h)],
        });
        match cond.fulfill(&one, &ctx(&h, 0)) {
            Err(FulfillmentError::InsufficientSignatures { required: 2, got: 1 }) => {}
            other => panic!("expected InsufficientSignatures, got {:?}", other),
        }

        let two = UnlockFulfillment::MultiSignature(MultiSignatureFulfillment {
            pairs: vec![pair(&ks[2], &h), pair(&ks[0], &h)],
        });
        cond.fulfill(&two, &ctx(&h, 0)).unwrap();
    }

    #[test]
    fn multisig_rejects_duplicate_signer() {
        let h = hasher();
        let ks = keys(3);
        let cond = multisig(&ks, 2);
        let dup = UnlockFulfillment::MultiSignature(MultiSignatureFulfillment {
            pairs: vec![pair(&ks[0], &h), pair(&ks[0], &h)],
        });
        match cond.fulfill(&dup, &ctx(&h, 0)) {
            Err(FulfillmentError::DuplicateSignature { .. }) => {}
            other => panic!("expected DuplicateSignature, got {:?}", other),
        }
    }

    #[test]
    fn multisig_rejects_outsider() {
        let h = hasher();
        let ks = keys(4);
        let cond = multisig(&ks[..3], 1);
        let outsider = UnlockFulfillment::MultiSignature(MultiSignatureFulfillment {
            pairs: vec![pair(&ks[3], &h)],
        });
        match cond.fulfill(&outsider, &ctx(&h, 0)) {
            Err(FulfillmentError::UnauthorizedKey { .. }) => {}
            other => panic!("expected UnauthorizedKey, got {:?}", other),
        }
    }

    #[test]
    fn multisig_unlock_hash_ignores_key_order() {
        let ks = keys(3);
        let a = multisig(&ks, 2);
        let mut reversed: Vec<Keypair> = ks.clone();
        reversed.reverse();
        let b = multisig(&reversed, 2);
        assert_eq!(a.unlock_hash(), b.unlock_hash());
        assert_eq!(a.unlock_hash().unlock_type, UnlockType::MultiSig);
        assert_ne!(a.unlock_hash(), multisig(&ks, 3).unlock_hash());
    }

    #[test]
    fn time_lock_by_height() {
        let h = hasher();
        let kp = Keypair::from_seed(&[1; 32]);
        let cond = UnlockCondition::time_lock(50, UnlockCondition::from_public_key(&kp.public_key()));
        match cond.fulfill(&single(&kp, &h), &ctx(&h, 49)) {
            Err(FulfillmentError::TimeLocked { lock_time: 50 }) => {}
            other => panic!("expected TimeLocked, got {:?}", other),
        }
        cond.fulfill(&single(&kp, &h), &ctx(&h, 50)).unwrap();
    }

    #[test]
    fn time_lock_by_timestamp() {
        let h = hasher();
        let kp = Keypair::from_seed(&[1; 32]);
        let cond = UnlockCondition::time_lock(
            1_700_000_000,
            UnlockCondition::from_public_key(&kp.public_key()),
        );
        // Context time is 1_600_000_000.
        assert!(matches!(
            cond.fulfill(&single(&kp, &h), &ctx(&h, 10_000_000)),
            Err(FulfillmentError::TimeLocked { .. })
        ));
    }

    #[test]
    fn standardness_rules() {
        let ks = keys(3);
        UnlockCondition::Nil.is_standard(&STD).unwrap();
        UnlockCondition::from_public_key(&ks[0].public_key()).is_standard(&STD).unwrap();
        multisig(&ks, 3).is_standard(&STD).unwrap();

        let ms_hash = UnlockCondition::UnlockHash(multisig(&ks, 2).unlock_hash());
        assert_eq!(
            ms_hash.is_standard(&STD),
            Err(ConditionError::NonStandardUnlockType(UnlockType::MultiSig))
        );
        assert!(matches!(
            multisig(&ks, 4).is_standard(&STD),
            Err(ConditionError::InvalidSignatureThreshold { min_signatures: 4, keys: 3 })
        ));
        assert!(matches!(
            multisig(&ks, 0).is_standard(&STD),
            Err(ConditionError::InvalidSignatureThreshold { .. })
        ));
    }

    #[test]
    fn multisig_is_gated_by_activation_height() {
        let ks = keys(2);
        let early = StandardContext {
            block_height: 41_999,
            multisig_activation_height: 42_000,
        };
        match multisig(&ks, 1).is_standard(&early) {
            Err(ConditionError::MultiSignatureNotActive { height: 41_999, activation_height: 42_000 }) => {}
            other => panic!("expected MultiSignatureNotActive, got {:?}", other),
        }
    }

    #[test]
    fn nested_time_lock_is_not_standard() {
        let nested = UnlockCondition::time_lock(5, UnlockCondition::time_lock(6, UnlockCondition::Nil));
        assert_eq!(nested.is_standard(&STD), Err(ConditionError::NestedTimeLock));
    }

    #[test]
    fn json_shapes() {
        let ks = keys(2);
        assert_eq!(serde_json::to_string(&UnlockCondition::Nil).unwrap(), r#"{"type":0}"#);

        let uh = UnlockHash::from_public_key(&ks[0].public_key());
        let json = serde_json::to_value(UnlockCondition::UnlockHash(uh)).unwrap();
        assert_eq!(json["type"], 1);
        assert_eq!(json["data"]["unlockhash"], uh.to_string());

        let ms = multisig(&ks, 2);
        let json = serde_json::to_value(&ms).unwrap();
        assert_eq!(json["type"], 4);
        assert_eq!(json["data"]["minimumsignaturecount"], 2);
        assert_eq!(json["data"]["unlockhashes"].as_array().unwrap().len(), 2);

        let tl = UnlockCondition::time_lock(9, ms.clone());
        let json = serde_json::to_value(&tl).unwrap();
        assert_eq!(json["type"], 3);
        assert_eq!(json["data"]["locktime"], 9);
        assert_eq!(serde_json::from_value::<UnlockCondition>(json).unwrap(), tl);
    }

    #[test]
    fn json_nil_accepts_null_data() {
        let cond: UnlockCondition = serde_json::from_str(r#"{"type":0,"data":null}"#).unwrap();
        assert_eq!(cond, UnlockCondition::Nil);
    }

    #[test]
    fn json_rejects_unknown_type() {
        assert!(serde_json::from_str::<UnlockCondition>(r#"{"type":2,"data":{}}"#).is_err());
    }

    #[test]
    fn binary_forms_decode() {
        let ks = keys(3);
        for cond in [
            UnlockCondition::Nil,
            UnlockCondition::from_public_key(&ks[0].public_key()),
            multisig(&ks, 2),
            UnlockCondition::time_lock(77, multisig(&ks, 1)),
        ] {
            let bytes = encode_to_vec(&cond);
            assert_eq!(bytes[0], cond.condition_type() as u8);
            assert_eq!(decode_exact::<UnlockCondition>(&bytes).unwrap(), cond);
        }
    }

    #[test]
    fn binary_rejects_nested_time_lock() {
        let nested = UnlockCondition::time_lock(5, UnlockCondition::time_lock(6, UnlockCondition::Nil));
        match decode_exact::<UnlockCondition>(&encode_to_vec(&nested)) {
            Err(EncodingError::Invalid(_)) => {}
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn deep_time_lock_chain_fails_without_recursing() {
        // Hand-built so the encoder's own recursion is not exercised.
        let mut bytes = encode_to_vec(&UnlockCondition::Nil);
        for depth in 0..1_000u64 {
            let mut payload = Encoder::new();
            payload.write_u64(depth);
            payload.write_raw(&bytes);
            let mut enc = Encoder::new();
            enc.write_u8(ConditionType::TimeLock as u8);
            enc.write_bytes(&payload.finish());
            bytes = enc.finish();
        }
        assert!(decode_exact::<UnlockCondition>(&bytes).is_err());
    }

    #[test]
    fn json_rejects_nested_time_lock() {
        let nested = UnlockCondition::time_lock(5, UnlockCondition::time_lock(6, UnlockCondition::Nil));
        let json = serde_json::to_string(&nested).unwrap();
        assert!(serde_json::from_str::<UnlockCondition>(&json).is_err());
    }

    #[test]
    fn binary_rejects_unknown_type() {
        let mut enc = Encoder::new();
        enc.write_u8(2);
        enc.write_bytes(&[]);
        match decode_exact::<UnlockCondition>(&enc.finish()) {
            Err(EncodingError::UnknownDiscriminant { value: 2, .. }) => {}
            other => panic!("expected UnknownDiscriminant, got {:?}", other),
        }
    }
}
