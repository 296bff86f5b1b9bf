//! Coin creation: new coins, authorised by the mint condition.
//!
//! ```text
//! binary body = nonce (8 raw bytes)
//!             ‖ mint fulfillment
//!             ‖ coin outputs   (sequence)
//!             ‖ miner fees     (sequence)
//!             ‖ arbitrary data (byte blob)
//!
//! signature hash = BLAKE3(version ‖ "coin mint tx" ‖ nonce ‖ extra objects
//!                         ‖ coin outputs ‖ miner fees ‖ arbitrary data)
//! id pre-image   = "coin mint tx" ‖ binary body
//! ```
//!
//! The fulfillment is left out of its own signature hash: it is what the
//! signers produce, so it can't be part of what they sign.

use serde::{Deserialize, Serialize};
use std::mem;

use super::envelope::{forbid, TransactionData, TransactionExtension};
use super::error::TransactionError;
use super::nonce::{check_json_nonce, TransactionNonce};
use super::types::{base64_bytes, CoinOutput, Currency, TransactionVersion, SPECIFIER_COIN_CREATION};
use super::validation::{
    check_arbitrary_data, check_miner_fees, check_outputs, check_size, reject, ValidationConstants,
    ValidationContext,
};
use crate::condition::{FulfillmentError, SignatureHasher, UnlockCondition, UnlockFulfillment};
use crate::crypto::hash::{blake3_hash, Hash};
use crate::crypto::keys::PublicKey;
use crate::encoding::{encode_to_vec, Decode, Decoder, Encode, Encoder, EncodingError};
use crate::mint::MintConditionSource;

const KIND: &str = "coin creation";

/// Mints `coin_outputs` into existence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinCreationTransaction {
    pub nonce: TransactionNonce,
    #[serde(rename = "mintfulfillment")]
    pub mint_fulfillment: UnlockFulfillment,
    #[serde(rename = "coinoutputs", default)]
    pub coin_outputs: Vec<CoinOutput>,
    #[serde(rename = "minerfees", default)]
    pub miner_fees: Vec<Currency>,
    #[serde(
        rename = "arbitrarydata",
        default,
        skip_serializing_if = "Vec::is_empty",
        with = "base64_bytes"
    )]
    pub arbitrary_data: Vec<u8>,
}

impl CoinCreationTransaction {
    /// An unsigned draft with a fresh random nonce.
    pub fn draft(coin_outputs: Vec<CoinOutput>, miner_fees: Vec<Currency>, arbitrary_data: Vec<u8>) -> Self {
        Self {
            nonce: TransactionNonce::random(),
            mint_fulfillment: UnlockFulfillment::Nil,
            coin_outputs,
            miner_fees,
            arbitrary_data,
        }
    }

    /// Digest that signers of this transaction sign.
    pub fn signature_hash_with(&self, extra_objects: &[&dyn Encode]) -> Hash {
        let mut enc = Encoder::new();
        enc.write(&TransactionVersion::COIN_CREATION)
            .write(&SPECIFIER_COIN_CREATION)
            .write(&self.nonce);
        for obj in extra_objects {
            obj.encode_to(&mut enc);
        }
        enc.write(&self.coin_outputs).write(&self.miner_fees);
        enc.write_bytes(&self.arbitrary_data);
        blake3_hash(&enc.finish())
    }

    pub fn id_preimage(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.write(&SPECIFIER_COIN_CREATION).write(self);
        enc.finish()
    }

    pub fn id(&self) -> Hash {
        blake3_hash(&self.id_preimage())
    }

    /// Sum of all coin outputs, `None` on overflow.
    pub fn minted_value(&self) -> Option<Currency> {
        self.coin_outputs
            .iter()
            .try_fold(Currency::zero(), |acc, o| acc.checked_add(o.value))
    }
}

impl SignatureHasher for CoinCreationTransaction {
    fn signature_hash(&self, public_key: &PublicKey) -> Hash {
        self.signature_hash_with(&[public_key])
    }
}

impl Encode for CoinCreationTransaction {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write(&self.nonce)
            .write(&self.mint_fulfillment)
            .write(&self.coin_outputs)
            .write(&self.miner_fees);
        enc.write_bytes(&self.arbitrary_data);
    }
}

impl Decode for CoinCreationTransaction {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            nonce: dec.read()?,
            mint_fulfillment: dec.read()?,
            coin_outputs: dec.read()?,
            miner_fees: dec.read()?,
            arbitrary_data: dec.read_bytes()?.to_vec(),
        })
    }
}

impl From<CoinCreationTransaction> for TransactionData {
    fn from(tx: CoinCreationTransaction) -> Self {
        TransactionData {
            coin_outputs: tx.coin_outputs,
            miner_fees: tx.miner_fees,
            arbitrary_data: tx.arbitrary_data,
            extension: Some(TransactionExtension::CoinCreation {
                nonce: tx.nonce,
                mint_fulfillment: tx.mint_fulfillment,
            }),
            ..TransactionData::default()
        }
    }
}

impl TryFrom<TransactionData> for CoinCreationTransaction {
    type Error = TransactionError;

    fn try_from(data: TransactionData) -> Result<Self, Self::Error> {
        forbid(KIND, "coin inputs", !data.coin_inputs.is_empty())?;
        forbid(KIND, "block stake inputs", !data.block_stake_inputs.is_empty())?;
        forbid(KIND, "block stake outputs", !data.block_stake_outputs.is_empty())?;
        match data.extension {
            Some(TransactionExtension::CoinCreation {
                nonce,
                mint_fulfillment,
            }) => Ok(Self {
                nonce,
                mint_fulfillment,
                coin_outputs: data.coin_outputs,
                miner_fees: data.miner_fees,
                arbitrary_data: data.arbitrary_data,
            }),
            _ => Err(TransactionError::MissingExtension { expected: KIND }),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Operations the registry dispatches to for version 129.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoinCreationController;

impl CoinCreationController {
    pub fn encode_binary(&self, tx: &CoinCreationTransaction) -> Vec<u8> {
        encode_to_vec(tx)
    }

    pub fn decode_binary(&self, dec: &mut Decoder<'_>) -> Result<CoinCreationTransaction, TransactionError> {
        Ok(dec.read()?)
    }

    pub fn encode_json(&self, tx: &CoinCreationTransaction) -> Result<serde_json::Value, TransactionError> {
        Ok(serde_json::to_value(tx)?)
    }

    pub fn decode_json(&self, data: serde_json::Value) -> Result<CoinCreationTransaction, TransactionError> {
        check_json_nonce(&data)?;
        Ok(serde_json::from_value(data)?)
    }

    /// Runs every check, stopping at the first failure.
    ///
    /// 1. encoded size within the block size limit
    /// 2. at least one output and one fee, non-zero nonce
    /// 3. fulfillment satisfies the mint condition at this height
    /// 4. arbitrary data within its limit
    /// 5. every fee at least the nominal minimum
    /// 6. every output non-zero with a standard condition
    pub fn validate(
        &self,
        tx: &CoinCreationTransaction,
        ctx: &ValidationContext,
        constants: &ValidationConstants,
        mint: &dyn MintConditionSource,
    ) -> Result<(), TransactionError> {
        self.run_checks(tx, ctx, constants, mint)
            .map_err(|err| reject(KIND, err))
    }

    fn run_checks(
        &self,
        tx: &CoinCreationTransaction,
        ctx: &ValidationContext,
        constants: &ValidationConstants,
        mint: &dyn MintConditionSource,
    ) -> Result<(), TransactionError> {
        check_size(1 + encode_to_vec(tx).len(), constants.block_size_limit)?;

        if tx.coin_outputs.is_empty() {
            return Err(TransactionError::NoCoinOutputs);
        }
        if tx.miner_fees.is_empty() {
            return Err(TransactionError::NoMinerFees);
        }
        if tx.nonce.is_zero() {
            return Err(TransactionError::NilNonce);
        }

        let condition = mint.mint_condition_at(ctx.block_height)?;
        condition
            .fulfill(&tx.mint_fulfillment, &ctx.fulfill_context(tx))
            .map_err(TransactionError::MintFulfillment)?;

        check_arbitrary_data(&tx.arbitrary_data, constants.arbitrary_data_size_limit)?;
        check_miner_fees(&tx.miner_fees, constants.minimum_miner_fee)?;
        check_outputs(&tx.coin_outputs, &constants.standard_context(ctx.block_height))
    }

    /// Minted coins balance against nothing.
    pub fn validate_coin_outputs(&self, _tx: &CoinCreationTransaction) -> Result<(), TransactionError> {
        Ok(())
    }

    /// Coin creation carries no block stakes.
    pub fn validate_block_stake_outputs(
        &self,
        _tx: &CoinCreationTransaction,
    ) -> Result<(), TransactionError> {
        Ok(())
    }

    /// Hands the mint fulfillment to `sign` together with the mint condition
    /// in force at `block_height`.
    ///
    /// On failure the fulfillment is left as it was.
    pub fn sign_extension<F>(
        &self,
        tx: &mut CoinCreationTransaction,
        mint: &dyn MintConditionSource,
        block_height: u64,
        sign: F,
    ) -> Result<(), TransactionError>
    where
        F: FnOnce(&mut UnlockFulfillment, &UnlockCondition, &dyn SignatureHasher) -> Result<(), FulfillmentError>,
    {
        let condition = mint.mint_condition_at(block_height)?;
        let mut fulfillment = mem::take(&mut tx.mint_fulfillment);
        let original = fulfillment.clone();
        let result = sign(&mut fulfillment, &condition, &*tx);
        tx.mint_fulfillment = if result.is_ok() { fulfillment } else { original };
        result.map_err(TransactionError::Signing)
    }

    pub fn signature_hash(&self, tx: &CoinCreationTransaction, extra_objects: &[&dyn Encode]) -> Hash {
        tx.signature_hash_with(extra_objects)
    }

    pub fn id_preimage(&self, tx: &CoinCreationTransaction) -> Vec<u8> {
        tx.id_preimage()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::KeySigner;
    use crate::crypto::keys::Keypair;
    use crate::encoding::decode_exact;
    use crate::mint::MintStateError;
    use crate::transaction::error::ErrorKind;
    use crate::transaction::types::CoinInput;

    struct FixedMint(UnlockCondition);

    impl MintConditionSource for FixedMint {
        fn mint_condition_at(&self, _height: u64) -> Result<UnlockCondition, MintStateError> {
            Ok(self.0.clone())
        }
    }

    const CONSTANTS: ValidationConstants = ValidationConstants {
        block_size_limit: 2_000_000,
        arbitrary_data_size_limit: 83,
        minimum_miner_fee: Currency::new(1),
        multisig_activation_height: 0,
    };

    fn minter() -> Keypair {
        Keypair::from_seed(&[42; 32])
    }

    fn recipient() -> UnlockCondition {
        UnlockCondition::from_public_key(&Keypair::from_seed(&[7; 32]).public_key())
    }

    fn unsigned(outputs: Vec<u64>) -> CoinCreationTransaction {
        CoinCreationTransaction {
            nonce: TransactionNonce::from_bytes([1, 0, 0, 0, 0, 0, 0, 0]),
            mint_fulfillment: UnlockFulfillment::Nil,
            coin_outputs: outputs
                .into_iter()
                .map(|v| CoinOutput::new(Currency::new(v), recipient()))
                .collect(),
            miner_fees: vec![Currency::new(1)],
            arbitrary_data: Vec::new(),
        }
    }

    fn signed(mut tx: CoinCreationTransaction, mint: &FixedMint) -> CoinCreationTransaction {
        let signer = KeySigner::single(minter());
        CoinCreationController
            .sign_extension(&mut tx, mint, 1, |f, c, h| signer.sign(f, c, h))
            .unwrap();
        tx
    }

    fn mint() -> FixedMint {
        FixedMint(UnlockCondition::from_public_key(&minter().public_key()))
    }

    fn validate(tx: &CoinCreationTransaction, mint: &FixedMint) -> Result<(), TransactionError> {
        CoinCreationController.validate(tx, &ValidationContext::block(5, 0), &CONSTANTS, mint)
    }

    #[test]
    fn signed_transaction_validates() {
        let mint = mint();
        let tx = signed(unsigned(vec![100]), &mint);
        validate(&tx, &mint).unwrap();
    }

    #[test]
    fn unsigned_transaction_is_unauthorized() {
        let err = validate(&unsigned(vec![100]), &mint()).unwrap_err();
        assert!(matches!(err, TransactionError::MintFulfillment(_)));
        assert_eq!(err.kind(), ErrorKind::AuthorizationFailure);
    }

    #[test]
    fn wrong_minter_cannot_sign() {
        let mut tx = unsigned(vec![100]);
        let signer = KeySigner::single(Keypair::from_seed(&[1; 32]));
        match CoinCreationController.sign_extension(&mut tx, &mint(), 1, |f, c, h| signer.sign(f, c, h)) {
            Err(TransactionError::Signing(FulfillmentError::NoMatchingKey)) => {}
            other => panic!("expected Signing(NoMatchingKey), got {:?}", other),
        }
        assert!(tx.mint_fulfillment.is_nil());
    }

    #[test]
    fn zero_nonce_is_rejected_even_when_signed() {
        let mint = mint();
        let mut tx = unsigned(vec![100]);
        tx.nonce = TransactionNonce::default();
        let tx = signed(tx, &mint);
        match validate(&tx, &mint) {
            Err(TransactionError::NilNonce) => {}
            other => panic!("expected NilNonce, got {:?}", other),
        }
    }

    #[test]
    fn zero_output_is_rejected() {
        let mint = mint();
        let tx = signed(unsigned(vec![100, 0]), &mint);
        match validate(&tx, &mint) {
            Err(TransactionError::ZeroOutput { index: 1 }) => {}
            other => panic!("expected ZeroOutput, got {:?}", other),
        }
    }

    #[test]
    fn shape_checks_come_before_authorization() {
        let tx = unsigned(vec![]);
        assert!(matches!(validate(&tx, &mint()), Err(TransactionError::NoCoinOutputs)));

        let mut tx = unsigned(vec![1]);
        tx.miner_fees.clear();
        assert!(matches!(validate(&tx, &mint()), Err(TransactionError::NoMinerFees)));
    }

    #[test]
    fn arbitrary_data_limit_applies_after_authorization() {
        let mint = mint();
        let mut tx = unsigned(vec![100]);
        tx.arbitrary_data = vec![b'x'; 84];
        let tx = signed(tx, &mint);
        assert!(matches!(
            validate(&tx, &mint),
            Err(TransactionError::ArbitraryDataTooLarge { size: 84, limit: 83 })
        ));
    }

    #[test]
    fn fee_below_minimum_is_rejected() {
        let mint = mint();
        let mut tx = unsigned(vec![100]);
        tx.miner_fees = vec![Currency::new(5)];
        let tx = signed(tx, &mint);
        let constants = ValidationConstants {
            minimum_miner_fee: Currency::new(10),
            ..CONSTANTS
        };
        let err = CoinCreationController
            .validate(&tx, &ValidationContext::block(5, 0), &constants, &mint)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);
    }

    #[test]
    fn oversized_transaction_is_rejected_first() {
        let constants = ValidationConstants {
            block_size_limit: 10,
            ..CONSTANTS
        };
        let err = CoinCreationController
            .validate(&unsigned(vec![]), &ValidationContext::block(5, 0), &constants, &mint())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SizeLimitExceeded);
    }

    #[test]
    fn signature_hash_ignores_fulfillment_and_covers_outputs() {
        let mint = mint();
        let tx = unsigned(vec![100]);
        let signed_tx = signed(tx.clone(), &mint);
        let pk = minter().public_key();
        assert_eq!(tx.signature_hash(&pk), signed_tx.signature_hash(&pk));

        let mut changed = tx.clone();
        changed.coin_outputs[0].value = Currency::new(101);
        assert_ne!(tx.signature_hash(&pk), changed.signature_hash(&pk));
    }

    #[test]
    fn signature_hash_preimage_layout() {
        let tx = unsigned(vec![100]);
        let mut expected = vec![129u8];
        expected.extend_from_slice(SPECIFIER_COIN_CREATION.as_bytes());
        expected.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 0]);
        expected.extend_from_slice(&encode_to_vec(&tx.coin_outputs));
        expected.extend_from_slice(&encode_to_vec(&tx.miner_fees));
        expected.extend_from_slice(&encode_to_vec(&tx.arbitrary_data));
        assert_eq!(tx.signature_hash_with(&[]), blake3_hash(&expected));
    }

    #[test]
    fn id_changes_with_nonce() {
        let a = unsigned(vec![100]);
        let mut b = a.clone();
        b.nonce = TransactionNonce::from_bytes([2, 0, 0, 0, 0, 0, 0, 0]);
        assert_ne!(a.id(), b.id());
        assert_eq!(&a.id_preimage()[..16], SPECIFIER_COIN_CREATION.as_bytes());
    }

    #[test]
    fn json_field_names() {
        let mut tx = signed(unsigned(vec![100]), &mint());
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["nonce"], "AQAAAAAAAAA=");
        assert_eq!(json["mintfulfillment"]["type"], 1);
        assert_eq!(json["coinoutputs"][0]["value"], "100");
        assert_eq!(json["minerfees"][0], "1");
        assert!(json.get("arbitrarydata").is_none());

        tx.arbitrary_data = b"monthly mint".to_vec();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["arbitrarydata"], "bW9udGhseSBtaW50");
        assert_eq!(serde_json::from_value::<CoinCreationTransaction>(json).unwrap(), tx);
    }

    #[test]
    fn binary_roundtrip() {
        let tx = signed(unsigned(vec![100, 200]), &mint());
        let bytes = CoinCreationController.encode_binary(&tx);
        assert_eq!(decode_exact::<CoinCreationTransaction>(&bytes).unwrap(), tx);
    }

    #[test]
    fn data_with_inputs_is_a_structural_violation() {
        let mut data = TransactionData::from(unsigned(vec![1]));
        data.coin_inputs.push(CoinInput {
            parent_id: Hash::default(),
            fulfillment: UnlockFulfillment::Nil,
        });
        let err = CoinCreationTransaction::try_from(data).unwrap_err();
        assert!(matches!(
            err,
            TransactionError::ForbiddenField { field: "coin inputs", .. }
        ));
        assert_eq!(err.kind(), ErrorKind::StructuralViolation);
    }

    #[test]
    fn data_roundtrip() {
        let tx = unsigned(vec![1]);
        assert_eq!(CoinCreationTransaction::try_from(TransactionData::from(tx.clone())).unwrap(), tx);
    }

    #[test]
    fn minted_value_sums_outputs() {
        assert_eq!(unsigned(vec![1, 2, 3]).minted_value(), Some(Currency::new(6)));
        assert_eq!(unsigned(vec![u64::MAX, 1]).minted_value(), None);
    }
}
