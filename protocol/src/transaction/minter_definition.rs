//! Minter definition: hands the mint authority to a new condition.
//!
//! ```text
//! binary body = nonce ‖ mint fulfillment ‖ mint condition
//!             ‖ miner fees (sequence) ‖ arbitrary data (byte blob)
//!
//! signature hash = BLAKE3(version ‖ "minter defin tx" ‖ nonce ‖ extra objects
//!                         ‖ mint condition ‖ miner fees ‖ arbitrary data)
//! id pre-image   = "minter defin tx" ‖ binary body
//! ```
//!
//! The fulfillment answers to the condition installed *before* this
//! transaction. The new condition only takes over from the next block.

use serde::{Deserialize, Serialize};
use std::mem;

use super::envelope::{forbid, TransactionData, TransactionExtension};
use super::error::TransactionError;
use super::nonce::{check_json_nonce, TransactionNonce};
use super::types::{base64_bytes, Currency, TransactionVersion, SPECIFIER_MINTER_DEFINITION};
use super::validation::{
    check_arbitrary_data, check_miner_fees, check_size, reject, ValidationConstants,
    ValidationContext,
};
use crate::condition::{
    FulfillmentError, SignatureHasher, UnlockCondition, UnlockFulfillment, UnlockType,
};
use crate::crypto::hash::{blake3_hash, Hash};
use crate::crypto::keys::PublicKey;
use crate::encoding::{encode_to_vec, Decode, Decoder, Encode, Encoder, EncodingError};
use crate::mint::MintConditionSource;

const KIND: &str = "minter definition";

/// Replaces the mint condition with `mint_condition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinterDefinitionTransaction {
    pub nonce: TransactionNonce,
    #[serde(rename = "mintfulfillment")]
    pub mint_fulfillment: UnlockFulfillment,
    #[serde(rename = "mintcondition")]
    pub mint_condition: UnlockCondition,
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

impl MinterDefinitionTransaction {
    /// An unsigned draft with a fresh random nonce.
    pub fn draft(mint_condition: UnlockCondition, miner_fees: Vec<Currency>, arbitrary_data: Vec<u8>) -> Self {
        Self {
            nonce: TransactionNonce::random(),
            mint_fulfillment: UnlockFulfillment::Nil,
            mint_condition,
            miner_fees,
            arbitrary_data,
        }
    }

    pub fn signature_hash_with(&self, extra_objects: &[&dyn Encode]) -> Hash {
        let mut enc = Encoder::new();
        enc.write(&TransactionVersion::MINTER_DEFINITION)
            .write(&SPECIFIER_MINTER_DEFINITION)
            .write(&self.nonce);
        for obj in extra_objects {
            obj.encode_to(&mut enc);
        }
        enc.write(&self.mint_condition).write(&self.miner_fees);
        enc.write_bytes(&self.arbitrary_data);
        blake3_hash(&enc.finish())
    }

    pub fn id_preimage(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.write(&SPECIFIER_MINTER_DEFINITION).write(self);
        enc.finish()
    }

    pub fn id(&self) -> Hash {
        blake3_hash(&self.id_preimage())
    }
}

impl SignatureHasher for MinterDefinitionTransaction {
    fn signature_hash(&self, public_key: &PublicKey) -> Hash {
        self.signature_hash_with(&[public_key])
    }
}

impl Encode for MinterDefinitionTransaction {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write(&self.nonce)
            .write(&self.mint_fulfillment)
            .write(&self.mint_condition)
            .write(&self.miner_fees);
        enc.write_bytes(&self.arbitrary_data);
    }
}

impl Decode for MinterDefinitionTransaction {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            nonce: dec.read()?,
            mint_fulfillment: dec.read()?,
            mint_condition: dec.read()?,
            miner_fees: dec.read()?,
            arbitrary_data: dec.read_bytes()?.to_vec(),
        })
    }
}

impl From<MinterDefinitionTransaction> for TransactionData {
    fn from(tx: MinterDefinitionTransaction) -> Self {
        TransactionData {
            miner_fees: tx.miner_fees,
            arbitrary_data: tx.arbitrary_data,
            extension: Some(TransactionExtension::MinterDefinition {
                nonce: tx.nonce,
                mint_fulfillment: tx.mint_fulfillment,
                mint_condition: tx.mint_condition,
            }),
            ..TransactionData::default()
        }
    }
}

impl TryFrom<TransactionData> for MinterDefinitionTransaction {
    type Error = TransactionError;

    fn try_from(data: TransactionData) -> Result<Self, Self::Error> {
        forbid(KIND, "coin inputs", !data.coin_inputs.is_empty())?;
        forbid(KIND, "coin outputs", !data.coin_outputs.is_empty())?;
        forbid(KIND, "block stake inputs", !data.block_stake_inputs.is_empty())?;
        forbid(KIND, "block stake outputs", !data.block_stake_outputs.is_empty())?;
        match data.extension {
            Some(TransactionExtension::MinterDefinition {
                nonce,
                mint_fulfillment,
                mint_condition,
            }) => Ok(Self {
                nonce,
                mint_fulfillment,
                mint_condition,
                miner_fees: data.miner_fees,
                arbitrary_data: data.arbitrary_data,
            }),
            _ => Err(TransactionError::MissingExtension { expected: KIND }),
        }
    }
}

/// Only a public-key unlock hash or a multi-signature may hold mint authority.
fn check_mint_condition_type(condition: &UnlockCondition) -> Result<(), TransactionError> {
    match condition {
        UnlockCondition::MultiSignature(_) => Ok(()),
        UnlockCondition::UnlockHash(uh) if uh.unlock_type == UnlockType::PubKey => Ok(()),
        UnlockCondition::UnlockHash(uh) => {
            Err(TransactionError::MintConditionNotPubKey(uh.unlock_type))
        }
        other => Err(TransactionError::DisallowedMintConditionType(
            other.condition_type(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Operations the registry dispatches to for version 128.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinterDefinitionController;

impl MinterDefinitionController {
    pub fn encode_binary(&self, tx: &MinterDefinitionTransaction) -> Vec<u8> {
        encode_to_vec(tx)
    }

    pub fn decode_binary(
        &self,
        dec: &mut Decoder<'_>,
    ) -> Result<MinterDefinitionTransaction, TransactionError> {
        Ok(dec.read()?)
    }

    pub fn encode_json(
        &self,
        tx: &MinterDefinitionTransaction,
    ) -> Result<serde_json::Value, TransactionError> {
        Ok(serde_json::to_value(tx)?)
    }

    pub fn decode_json(
        &self,
        data: serde_json::Value,
    ) -> Result<MinterDefinitionTransaction, TransactionError> {
        check_json_nonce(&data)?;
        Ok(serde_json::from_value(data)?)
    }

    /// Size, shape, new condition (standard, then type), authorization
    /// against the current condition, arbitrary data, fees.
    pub fn validate(
        &self,
        tx: &MinterDefinitionTransaction,
        ctx: &ValidationContext,
        constants: &ValidationConstants,
        mint: &dyn MintConditionSource,
    ) -> Result<(), TransactionError> {
        self.run_checks(tx, ctx, constants, mint)
            .map_err(|err| reject(KIND, err))
    }

    fn run_checks(
        &self,
        tx: &MinterDefinitionTransaction,
        ctx: &ValidationContext,
        constants: &ValidationConstants,
        mint: &dyn MintConditionSource,
    ) -> Result<(), TransactionError> {
        check_size(1 + encode_to_vec(tx).len(), constants.block_size_limit)?;

        if tx.miner_fees.is_empty() {
            return Err(TransactionError::NoMinerFees);
        }
        if tx.nonce.is_zero() {
            return Err(TransactionError::NilNonce);
        }

        tx.mint_condition
            .is_standard(&constants.standard_context(ctx.block_height))
            .map_err(TransactionError::NonStandardMintCondition)?;
        check_mint_condition_type(&tx.mint_condition)?;

        let current = mint.mint_condition_at(ctx.block_height)?;
        current
            .fulfill(&tx.mint_fulfillment, &ctx.fulfill_context(tx))
            .map_err(TransactionError::MintFulfillment)?;

        check_arbitrary_data(&tx.arbitrary_data, constants.arbitrary_data_size_limit)?;
        check_miner_fees(&tx.miner_fees, constants.minimum_miner_fee)
    }

    /// Minter definitions move no coins.
    pub fn validate_coin_outputs(&self, _tx: &MinterDefinitionTransaction) -> Result<(), TransactionError> {
        Ok(())
    }

    pub fn validate_block_stake_outputs(
        &self,
        _tx: &MinterDefinitionTransaction,
    ) -> Result<(), TransactionError> {
        Ok(())
    }

    /// Signs against the condition in force at `block_height`, never the
    /// one being installed.
    pub fn sign_extension<F>(
        &self,
        tx: &mut MinterDefinitionTransaction,
        mint: &dyn MintConditionSource,
        block_height: u64,
        sign: F,
    ) -> Result<(), TransactionError>
    where
        F: FnOnce(&mut UnlockFulfillment, &UnlockCondition, &dyn SignatureHasher) -> Result<(), FulfillmentError>,
    {
        let current = mint.mint_condition_at(block_height)?;
        let mut fulfillment = mem::take(&mut tx.mint_fulfillment);
        let original = fulfillment.clone();
        let result = sign(&mut fulfillment, &current, &*tx);
        tx.mint_fulfillment = if result.is_ok() { fulfillment } else { original };
        result.map_err(TransactionError::Signing)
    }

    pub fn signature_hash(&self, tx: &MinterDefinitionTransaction, extra_objects: &[&dyn Encode]) -> Hash {
        tx.signature_hash_with(extra_objects)
    }

    pub fn id_preimage(&self, tx: &MinterDefinitionTransaction) -> Vec<u8> {
        tx.id_preimage()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
