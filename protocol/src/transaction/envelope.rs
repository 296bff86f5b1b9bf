//! The generic transaction envelope.
//!
//! ```text
//! binary:  version (u8) ‖ kind-specific body
//! json:    {"version": <u8>, "data": {...kind-specific fields...}}
//! ```
//!
//! Decoding either form goes through the
//! [`TransactionRegistry`](super::registry::TransactionRegistry), which
//! refuses version tags it has no controller for.

use serde::{Serialize, Serializer};

use super::coin_creation::CoinCreationTransaction;
use super::error::TransactionError;
use super::minter_definition::MinterDefinitionTransaction;
use super::nonce::TransactionNonce;
use super::registry::RegistryError;
use super::standard::StandardTransaction;
use super::types::{BlockStakeInput, BlockStakeOutput, CoinInput, CoinOutput, Currency, TransactionVersion};
use crate::condition::{UnlockCondition, UnlockFulfillment};
use crate::crypto::hash::{blake3_hash, Hash};
use crate::encoding::{encode_to_vec, Encode, Encoder};

/// Fails with [`TransactionError::ForbiddenField`] when `present`.
pub(crate) fn forbid(kind: &'static str, field: &'static str, present: bool) -> Result<(), TransactionError> {
    if present {
        return Err(TransactionError::ForbiddenField { kind, field });
    }
    Ok(())
}

/// Kind-specific fields that do not fit the generic shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionExtension {
    CoinCreation {
        nonce: TransactionNonce,
        mint_fulfillment: UnlockFulfillment,
    },
    MinterDefinition {
        nonce: TransactionNonce,
        mint_fulfillment: UnlockFulfillment,
        mint_condition: UnlockCondition,
    },
}

/// The shape every transaction kind can be flattened into.
///
/// Converting back with `TryFrom` is where a kind refuses fields it does not
/// allow, e.g. inputs on a coin creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionData {
    pub coin_inputs: Vec<CoinInput>,
    pub coin_outputs: Vec<CoinOutput>,
    pub block_stake_inputs: Vec<BlockStakeInput>,
    pub block_stake_outputs: Vec<BlockStakeOutput>,
    pub miner_fees: Vec<Currency>,
    pub arbitrary_data: Vec<u8>,
    pub extension: Option<TransactionExtension>,
}

/// A transaction of any registered kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    /// Version 0.
    Legacy(StandardTransaction),
    /// Version 1.
    Standard(StandardTransaction),
    /// Version 128.
    MinterDefinition(MinterDefinitionTransaction),
    /// Version 129.
    CoinCreation(CoinCreationTransaction),
}

impl Transaction {
    pub fn version(&self) -> TransactionVersion {
        match self {
            Transaction::Legacy(_) => TransactionVersion::LEGACY,
            Transaction::Standard(_) => TransactionVersion::STANDARD,
            Transaction::MinterDefinition(_) => TransactionVersion::MINTER_DEFINITION,
            Transaction::CoinCreation(_) => TransactionVersion::COIN_CREATION,
        }
    }

    /// Input to the transaction id hash.
    pub fn id_preimage(&self) -> Vec<u8> {
        match self {
            Transaction::Legacy(tx) => tx.id_preimage(TransactionVersion::LEGACY),
            Transaction::Standard(tx) => tx.id_preimage(TransactionVersion::STANDARD),
            Transaction::MinterDefinition(tx) => tx.id_preimage(),
            Transaction::CoinCreation(tx) => tx.id_preimage(),
        }
    }

    /// Content-addressed identifier.
    pub fn id(&self) -> Hash {
        blake3_hash(&self.id_preimage())
    }

    /// Flattens into the generic shape.
    pub fn to_data(&self) -> TransactionData {
        match self {
            Transaction::Legacy(tx) | Transaction::Standard(tx) => tx.clone().into(),
            Transaction::MinterDefinition(tx) => tx.clone().into(),
            Transaction::CoinCreation(tx) => tx.clone().into(),
        }
    }

    /// Rebuilds a transaction of kind `version` from the generic shape.
    pub fn from_data(version: TransactionVersion, data: TransactionData) -> Result<Self, TransactionError> {
        match version {
            TransactionVersion::LEGACY => Ok(Transaction::Legacy(data.try_into()?)),
            TransactionVersion::STANDARD => Ok(Transaction::Standard(data.try_into()?)),
            TransactionVersion::MINTER_DEFINITION => Ok(Transaction::MinterDefinition(data.try_into()?)),
            TransactionVersion::COIN_CREATION => Ok(Transaction::CoinCreation(data.try_into()?)),
            TransactionVersion(other) => Err(RegistryError::UnknownVersion(other).into()),
        }
    }

    /// Canonical binary form, version byte included.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode_to_vec(self)
    }

    /// Every miner fee the transaction pays.
    pub fn miner_fees(&self) -> &[Currency] {
        match self {
            Transaction::Legacy(tx) | Transaction::Standard(tx) => &tx.miner_fees,
            Transaction::MinterDefinition(tx) => &tx.miner_fees,
            Transaction::CoinCreation(tx) => &tx.miner_fees,
        }
    }
}

impl Encode for Transaction {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write(&self.version());
        match self {
            Transaction::Legacy(tx) | Transaction::Standard(tx) => tx.encode_to(enc),
            Transaction::MinterDefinition(tx) => tx.encode_to(enc),
            Transaction::CoinCreation(tx) => tx.encode_to(enc),
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: TransactionVersion,
    data: &'a T,
}

impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let version = self.version();
        match self {
            Transaction::Legacy(data) | Transaction::Standard(data) => {
                EnvelopeRef { version, data }.serialize(serializer)
            }
            Transaction::MinterDefinition(data) => EnvelopeRef { version, data }.serialize(serializer),
            Transaction::CoinCreation(data) => EnvelopeRef { version, data }.serialize(serializer),
        }
    }
}

impl From<CoinCreationTransaction> for Transaction {
    fn from(tx: CoinCreationTransaction) -> Self {
        Transaction::CoinCreation(tx)
    }
}

impl From<MinterDefinitionTransaction> for Transaction {
    fn from(tx: MinterDefinitionTransaction) -> Self {
        Transaction::MinterDefinition(tx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::error::ErrorKind;

    fn coin_creation() -> CoinCreationTransaction {
        CoinCreationTransaction {
            nonce: TransactionNonce::from_bytes([1, 0, 0, 0, 0, 0, 0, 0]),
            mint_fulfillment: UnlockFulfillment::Nil,
            coin_outputs: vec![CoinOutput::new(Currency::new(100), UnlockCondition::Nil)],
            miner_fees: vec![Currency::new(1)],
            arbitrary_data: Vec::new(),
        }
    }

    #[test]
    fn binary_envelope_leads_with_version() {
        let tx = Transaction::from(coin_creation());
        let bytes = tx.to_bytes();
        assert_eq!(bytes[0], 129);
        assert_eq!(&bytes[1..], encode_to_vec(&coin_creation()).as_slice());
    }

    #[test]
    fn json_envelope() {
        let json = serde_json::to_value(Transaction::from(coin_creation())).unwrap();
        assert_eq!(json["version"], 129);
        assert_eq!(json["data"]["nonce"], "AQAAAAAAAAA=");
        assert_eq!(json["data"]["coinoutputs"][0]["value"], "100");
    }

    #[test]
    fn id_matches_kind_id() {
        let inner = coin_creation();
        assert_eq!(Transaction::from(inner.clone()).id(), inner.id());
    }

    #[test]
    fn legacy_and_standard_ids_differ() {
        let base = StandardTransaction {
            miner_fees: vec![Currency::new(1)],
            ..StandardTransaction::default()
        };
        assert_ne!(
            Transaction::Legacy(base.clone()).id(),
            Transaction::Standard(base).id()
        );
    }

    #[test]
    fn data_roundtrip_through_every_kind() {
        let txs = [
            Transaction::Standard(StandardTransaction {
                miner_fees: vec![Currency::new(3)],
                ..StandardTransaction::default()
            }),
            Transaction::from(coin_creation()),
            Transaction::from(MinterDefinitionTransaction {
                nonce: TransactionNonce::from_bytes([5; 8]),
                mint_fulfillment: UnlockFulfillment::Nil,
                mint_condition: UnlockCondition::Nil,
                miner_fees: vec![Currency::new(1)],
                arbitrary_data: b"x".to_vec(),
            }),
        ];
        for tx in txs {
            assert_eq!(Transaction::from_data(tx.version(), tx.to_data()).unwrap(), tx);
        }
    }

    #[test]
    fn extension_on_a_base_kind_is_structural() {
        let data = Transaction::from(coin_creation()).to_data();
        let err = Transaction::from_data(TransactionVersion::STANDARD, data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralViolation);
    }

    #[test]
    fn unknown_version_in_from_data() {
        match Transaction::from_data(TransactionVersion(7), TransactionData::default()) {
            Err(TransactionError::Registry(RegistryError::UnknownVersion(7))) => {}
            other => panic!("expected UnknownVersion, got {:?}", other),
        }
    }

    #[test]
    fn forbid_only_fires_when_present() {
        forbid("k", "f", false).unwrap();
        assert!(matches!(
            forbid("k", "f", true),
            Err(TransactionError::ForbiddenField { kind: "k", field: "f" })
        ));
    }
}
