//! Signing callback for fulfillments.
//!
//! Transaction controllers do not hold keys. They hand the fulfillment
//! template, the condition it must satisfy and a [`SignatureHasher`] to a
//! callback; [`KeySigner`] is the callback backed by in-memory Ed25519 keys.
//!
//! Multi-signature fulfillments are signed incrementally: each party runs
//! its own signer over the same template and appends its pairs, until the
//! threshold is met.

use super::{
    ConditionType, FulfillmentError, MultiSignatureFulfillment, PublicKeySignaturePair,
    SignatureHasher, SingleSignatureFulfillment, UnlockCondition, UnlockFulfillment, UnlockHash,
};
use crate::crypto::keys::Keypair;

/// Signs fulfillments with a fixed set of Ed25519 keys.
#[derive(Debug, Clone, Default)]
pub struct KeySigner {
    keys: Vec<Keypair>,
}

impl KeySigner {
    pub fn new(keys: Vec<Keypair>) -> Self {
        Self { keys }
    }

    pub fn single(key: Keypair) -> Self {
        Self { keys: vec![key] }
    }

    pub fn keys(&self) -> &[Keypair] {
        &self.keys
    }

    /// Fills `fulfillment` so that it (further) satisfies `condition`.
    ///
    /// Single-key and nil conditions replace the fulfillment outright.
    /// Multi-signature conditions keep existing pairs and add one per
    /// authorised key that has not signed yet.
    pub fn sign(
        &self,
        fulfillment: &mut UnlockFulfillment,
        condition: &UnlockCondition,
        hasher: &dyn SignatureHasher,
    ) -> Result<(), FulfillmentError> {
        let target = match condition {
            UnlockCondition::TimeLock(tl) => tl.condition.as_ref(),
            other => other,
        };
        match target {
            UnlockCondition::Nil => {
                let key = self.keys.first().ok_or(FulfillmentError::NoMatchingKey)?;
                *fulfillment = sign_single(key, hasher);
                Ok(())
            }
            UnlockCondition::UnlockHash(uh) => {
                let key = self
                    .keys
                    .iter()
                    .find(|k| UnlockHash::from_public_key(&k.public_key()) == *uh)
                    .ok_or(FulfillmentError::NoMatchingKey)?;
                *fulfillment = sign_single(key, hasher);
                Ok(())
            }
            UnlockCondition::MultiSignature(ms) => {
                if fulfillment.is_nil() {
                    *fulfillment =
                        UnlockFulfillment::MultiSignature(MultiSignatureFulfillment::default());
                }
                let multi = match fulfillment {
                    UnlockFulfillment::MultiSignature(multi) => multi,
                    other => {
                        return Err(FulfillmentError::UnexpectedFulfillment {
                            condition: ConditionType::MultiSignature,
                            fulfillment: other.fulfillment_type(),
                        })
                    }
                };
                let mut authorised = 0usize;
                for key in &self.keys {
                    let public_key = key.public_key();
                    if !ms.unlock_hashes.contains(&UnlockHash::from_public_key(&public_key)) {
                        continue;
                    }
                    authorised += 1;
                    if multi.pairs.iter().any(|p| p.public_key == public_key) {
                        continue;
                    }
                    let digest = hasher.signature_hash(&public_key);
                    multi.pairs.push(PublicKeySignaturePair {
                        public_key,
                        signature: key.sign(digest.as_bytes()),
                    });
                }
                if authorised == 0 {
                    return Err(FulfillmentError::NoMatchingKey);
                }
                Ok(())
            }
            UnlockCondition::TimeLock(_) => Err(FulfillmentError::NestedTimeLock),
        }
    }
}

fn sign_single(key: &Keypair, hasher: &dyn SignatureHasher) -> UnlockFulfillment {
    let public_key = key.public_key();
    let digest = hasher.signature_hash(&public_key);
    UnlockFulfillment::SingleSignature(SingleSignatureFulfillment {
        public_key,
        signature: key.sign(digest.as_bytes()),
    })
}
