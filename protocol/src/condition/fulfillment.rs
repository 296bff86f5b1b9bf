//! Fulfillments: the evidence half of a condition check.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::{data_from_value, TaggedRef, TaggedValue};
use crate::crypto::keys::{PublicKey, Signature};
use crate::encoding::{Decode, Decoder, Encode, Encoder, EncodingError};

/// Type byte of a fulfillment in both wire forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FulfillmentType {
    Nil = 0,
    SingleSignature = 1,
    MultiSignature = 3,
}

impl TryFrom<u8> for FulfillmentType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Nil),
            1 => Ok(Self::SingleSignature),
            3 => Ok(Self::MultiSignature),
            other => Err(other),
        }
    }
}

impl fmt::Display for FulfillmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::SingleSignature => write!(f, "single-signature"),
            Self::MultiSignature => write!(f, "multi-signature"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleSignatureFulfillment {
    #[serde(rename = "publickey")]
    pub public_key: PublicKey,
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeySignaturePair {
    #[serde(rename = "publickey")]
    pub public_key: PublicKey,
    pub signature: Signature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiSignatureFulfillment {
    pub pairs: Vec<PublicKeySignaturePair>,
}

/// Evidence presented against an [`UnlockCondition`](super::UnlockCondition).
///
/// `Nil` is the unsigned template; it satisfies nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UnlockFulfillment {
    #[default]
    Nil,
    SingleSignature(SingleSignatureFulfillment),
    MultiSignature(MultiSignatureFulfillment),
}

impl UnlockFulfillment {
    pub fn fulfillment_type(&self) -> FulfillmentType {
        match self {
            Self::Nil => FulfillmentType::Nil,
            Self::SingleSignature(_) => FulfillmentType::SingleSignature,
            Self::MultiSignature(_) => FulfillmentType::MultiSignature,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }
}

impl Serialize for UnlockFulfillment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = self.fulfillment_type() as u8;
        match self {
            Self::Nil => TaggedRef::<()> { kind, data: None }.serialize(serializer),
            Self::SingleSignature(s) => TaggedRef { kind, data: Some(s) }.serialize(serializer),
            Self::MultiSignature(m) => TaggedRef { kind, data: Some(m) }.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for UnlockFulfillment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tagged = TaggedValue::deserialize(deserializer)?;
        match FulfillmentType::try_from(tagged.kind) {
            Ok(FulfillmentType::Nil) => Ok(Self::Nil),
            Ok(FulfillmentType::SingleSignature) => Ok(Self::SingleSignature(
                data_from_value::<_, D::Error>(tagged.data)?,
            )),
            Ok(FulfillmentType::MultiSignature) => Ok(Self::MultiSignature(
                data_from_value::<_, D::Error>(tagged.data)?,
            )),
            Err(other) => Err(de::Error::custom(format!("unknown fulfillment type {other}"))),
        }
    }
}

impl Encode for PublicKeySignaturePair {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write(&self.public_key).write(&self.signature);
    }
}

impl Decode for PublicKeySignaturePair {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            public_key: dec.read()?,
            signature: dec.read()?,
        })
    }
}

impl Encode for UnlockFulfillment {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write_u8(self.fulfillment_type() as u8);
        let mut inner = Encoder::new();
        match self {
            Self::Nil => {}
            Self::SingleSignature(s) => {
                inner.write(&s.public_key).write(&s.signature);
            }
            Self::MultiSignature(m) => {
                inner.write(&m.pairs);
            }
        }
        enc.write_bytes(&inner.finish());
    }
}

impl Decode for UnlockFulfillment {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        let raw_type = dec.read_u8()?;
        let mut inner = Decoder::new(dec.read_bytes()?);
        let fulfillment = match FulfillmentType::try_from(raw_type) {
            Ok(FulfillmentType::Nil) => Self::Nil,
            Ok(FulfillmentType::SingleSignature) => {
                Self::SingleSignature(SingleSignatureFulfillment {
                    public_key: inner.read()?,
                    signature: inner.read()?,
                })
            }
            Ok(FulfillmentType::MultiSignature) => {
                Self::MultiSignature(MultiSignatureFulfillment { pairs: inner.read()? })
            }
            Err(value) => {
                return Err(EncodingError::UnknownDiscriminant {
                    what: "fulfillment type",
                    value,
                })
            }
        };
        inner.finish()?;
        Ok(fulfillment)
    }
}
