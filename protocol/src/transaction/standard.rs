//! Base transactions (versions 0 and 1) with the early-chain fee override.
//!
//! Only what the fee override needs is here: the value-moving shape, its
//! codec and hashes, and the checks a host runs on it. For the first
//! `fee_grace_height` blocks a *confirmed* transaction only needs non-zero
//! fees; the pool always applies the nominal minimum.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::envelope::{forbid, TransactionData};
use super::error::TransactionError;
use super::types::{
    base64_bytes, BlockHeight, BlockStakeInput, BlockStakeOutput, CoinInput, CoinOutput, Currency,
    OutputId, TransactionVersion, SPECIFIER_STANDARD_TRANSACTION,
};
use super::validation::{
    check_arbitrary_data, check_miner_fees, check_outputs, check_size, reject, sum,
    ValidationConstants, ValidationContext,
};
use crate::condition::SignatureHasher;
use crate::config::GRACE_MINIMUM_MINER_FEE;
use crate::crypto::hash::{blake3_hash, Hash};
use crate::crypto::keys::PublicKey;
use crate::encoding::{encode_to_vec, Decode, Decoder, Encode, Encoder, EncodingError};

const KIND: &str = "standard";

/// A value transfer between coin and block-stake outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardTransaction {
    #[serde(rename = "coininputs", default, skip_serializing_if = "Vec::is_empty")]
    pub coin_inputs: Vec<CoinInput>,
    #[serde(rename = "coinoutputs", default, skip_serializing_if = "Vec::is_empty")]
    pub coin_outputs: Vec<CoinOutput>,
    #[serde(rename = "blockstakeinputs", default, skip_serializing_if = "Vec::is_empty")]
    pub block_stake_inputs: Vec<BlockStakeInput>,
    #[serde(rename = "blockstakeoutputs", default, skip_serializing_if = "Vec::is_empty")]
    pub block_stake_outputs: Vec<BlockStakeOutput>,
    #[serde(rename = "minerfees", default, skip_serializing_if = "Vec::is_empty")]
    pub miner_fees: Vec<Currency>,
    #[serde(
        rename = "arbitrarydata",
        default,
        skip_serializing_if = "Vec::is_empty",
        with = "base64_bytes"
    )]
    pub arbitrary_data: Vec<u8>,
}

impl StandardTransaction {
    /// Digest signed for one input. Input fulfillments are left out.
    pub fn signature_hash_with(&self, version: TransactionVersion, extra_objects: &[&dyn Encode]) -> Hash {
        let mut enc = Encoder::new();
        enc.write(&version);
        for obj in extra_objects {
            obj.encode_to(&mut enc);
        }
        enc.write_u64(self.coin_inputs.len() as u64);
        for input in &self.coin_inputs {
            enc.write(&input.parent_id);
        }
        enc.write(&self.coin_outputs);
        enc.write_u64(self.block_stake_inputs.len() as u64);
        for input in &self.block_stake_inputs {
            enc.write(&input.parent_id);
        }
        enc.write(&self.block_stake_outputs).write(&self.miner_fees);
        enc.write_bytes(&self.arbitrary_data);
        blake3_hash(&enc.finish())
    }

    pub fn id_preimage(&self, version: TransactionVersion) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.write(&SPECIFIER_STANDARD_TRANSACTION).write(&version).write(self);
        enc.finish()
    }

    /// Total of all coin outputs and miner fees.
    pub fn coin_output_sum(&self) -> Result<Currency, TransactionError> {
        sum(self.coin_outputs.iter().map(|o| &o.value).chain(&self.miner_fees))
    }
}

/// Signature hasher for input `input_index` of a standard transaction.
#[derive(Debug, Clone, Copy)]
pub struct InputSignatureHasher<'a> {
    tx: &'a StandardTransaction,
    version: TransactionVersion,
    input_index: u64,
}

impl<'a> InputSignatureHasher<'a> {
    pub fn new(tx: &'a StandardTransaction, version: TransactionVersion, input_index: usize) -> Self {
        Self {
            tx,
            version,
            input_index: input_index as u64,
        }
    }
}

impl SignatureHasher for InputSignatureHasher<'_> {
    fn signature_hash(&self, public_key: &PublicKey) -> Hash {
        self.tx
            .signature_hash_with(self.version, &[&self.input_index, public_key])
    }
}

impl Encode for StandardTransaction {
    fn encode_to(&self, enc: &mut Encoder) {
        enc.write(&self.coin_inputs)
            .write(&self.coin_outputs)
            .write(&self.block_stake_inputs)
            .write(&self.block_stake_outputs)
            .write(&self.miner_fees);
        enc.write_bytes(&self.arbitrary_data);
    }
}

impl Decode for StandardTransaction {
    fn decode_from(dec: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Self {
            coin_inputs: dec.read()?,
            coin_outputs: dec.read()?,
            block_stake_inputs: dec.read()?,
            block_stake_outputs: dec.read()?,
            miner_fees: dec.read()?,
            arbitrary_data: dec.read_bytes()?.to_vec(),
        })
    }
}

impl From<StandardTransaction> for TransactionData {
    fn from(tx: StandardTransaction) -> Self {
        TransactionData {
            coin_inputs: tx.coin_inputs,
            coin_outputs: tx.coin_outputs,
            block_stake_inputs: tx.block_stake_inputs,
            block_stake_outputs: tx.block_stake_outputs,
            miner_fees: tx.miner_fees,
            arbitrary_data: tx.arbitrary_data,
            extension: None,
        }
    }
}

impl TryFrom<TransactionData> for StandardTransaction {
    type Error = TransactionError;

    fn try_from(data: TransactionData) -> Result<Self, Self::Error> {
        forbid(KIND, "a mint extension", data.extension.is_some())?;
        Ok(Self {
            coin_inputs: data.coin_inputs,
            coin_outputs: data.coin_outputs,
            block_stake_inputs: data.block_stake_inputs,
            block_stake_outputs: data.block_stake_outputs,
            miner_fees: data.miner_fees,
            arbitrary_data: data.arbitrary_data,
        })
    }
}

fn check_unique_inputs(inputs: &[CoinInput]) -> Result<(), TransactionError> {
    let mut seen = HashSet::with_capacity(inputs.len());
    for input in inputs {
        if !seen.insert(input.parent_id) {
            return Err(TransactionError::DuplicateInput(input.parent_id));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Controller for versions 0 and 1, carrying the network's fee grace height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardTransactionController {
    pub version: TransactionVersion,
    pub fee_grace_height: BlockHeight,
}

impl StandardTransactionController {
    pub fn new(version: TransactionVersion, fee_grace_height: BlockHeight) -> Self {
        Self {
            version,
            fee_grace_height,
        }
    }

    /// The fee floor in force for `ctx`.
    pub fn minimum_miner_fee(&self, ctx: &ValidationContext, constants: &ValidationConstants) -> Currency {
        if ctx.confirmed && ctx.block_height < self.fee_grace_height {
            GRACE_MINIMUM_MINER_FEE
        } else {
            constants.minimum_miner_fee
        }
    }

    pub fn encode_binary(&self, tx: &StandardTransaction) -> Vec<u8> {
        encode_to_vec(tx)
    }

    pub fn decode_binary(&self, dec: &mut Decoder<'_>) -> Result<StandardTransaction, TransactionError> {
        Ok(dec.read()?)
    }

    pub fn encode_json(&self, tx: &StandardTransaction) -> Result<serde_json::Value, TransactionError> {
        Ok(serde_json::to_value(tx)?)
    }

    pub fn decode_json(&self, data: serde_json::Value) -> Result<StandardTransaction, TransactionError> {
        Ok(serde_json::from_value(data)?)
    }

    pub fn validate(
        &self,
        tx: &StandardTransaction,
        ctx: &ValidationContext,
        constants: &ValidationConstants,
    ) -> Result<(), TransactionError> {
        self.run_checks(tx, ctx, constants)
            .map_err(|err| reject(KIND, err))
    }

    fn run_checks(
        &self,
        tx: &StandardTransaction,
        ctx: &ValidationContext,
        constants: &ValidationConstants,
    ) -> Result<(), TransactionError> {
        check_size(1 + encode_to_vec(tx).len(), constants.block_size_limit)?;
        check_arbitrary_data(&tx.arbitrary_data, constants.arbitrary_data_size_limit)?;
        check_unique_inputs(&tx.coin_inputs)?;
        check_unique_inputs(&tx.block_stake_inputs)?;
        check_miner_fees(&tx.miner_fees, self.minimum_miner_fee(ctx, constants))?;

        let standard = constants.standard_context(ctx.block_height);
        check_outputs(&tx.coin_outputs, &standard)?;
        check_outputs(&tx.block_stake_outputs, &standard)
    }

    /// Coin inputs must exist in `spent`, be fulfilled, and cover outputs
    /// plus fees exactly.
    pub fn validate_coin_outputs(
        &self,
        tx: &StandardTransaction,
        spent: &HashMap<OutputId, CoinOutput>,
        ctx: &ValidationContext,
    ) -> Result<(), TransactionError> {
        let inputs = self.check_inputs(tx, &tx.coin_inputs, spent, ctx)?;
        let outputs = tx.coin_output_sum()?;
        if inputs != outputs {
            return Err(reject(KIND, TransactionError::UnbalancedValue { inputs, outputs }));
        }
        Ok(())
    }

    /// Block stakes balance without fees.
    pub fn validate_block_stake_outputs(
        &self,
        tx: &StandardTransaction,
        spent: &HashMap<OutputId, BlockStakeOutput>,
        ctx: &ValidationContext,
    ) -> Result<(), TransactionError> {
        let inputs = self.check_inputs(tx, &tx.block_stake_inputs, spent, ctx)?;
        let outputs = sum(tx.block_stake_outputs.iter().map(|o| &o.value))?;
        if inputs != outputs {
            return Err(reject(KIND, TransactionError::UnbalancedValue { inputs, outputs }));
        }
        Ok(())
    }

    fn check_inputs(
        &self,
        tx: &StandardTransaction,
        inputs: &[CoinInput],
        spent: &HashMap<OutputId, CoinOutput>,
        ctx: &ValidationContext,
    ) -> Result<Currency, TransactionError> {
        let mut total = Currency::zero();
        for (index, input) in inputs.iter().enumerate() {
            let parent = spent
                .get(&input.parent_id)
                .ok_or(TransactionError::UnknownOutput(input.parent_id))
                .map_err(|err| reject(KIND, err))?;
            let hasher = InputSignatureHasher::new(tx, self.version, index);
            parent
                .condition
                .fulfill(&input.fulfillment, &ctx.fulfill_context(&hasher))
                .map_err(|source| reject(KIND, TransactionError::InputFulfillment { index, source }))?;
            total = total
                .checked_add(parent.value)
                .ok_or(TransactionError::ValueOverflow)?;
        }
        Ok(total)
    }

    /// Base transactions carry no extension to sign.
    pub fn sign_extension(&self, _tx: &mut StandardTransaction) -> Result<(), TransactionError> {
        Ok(())
    }

    pub fn signature_hash(&self, tx: &StandardTransaction, extra_objects: &[&dyn Encode]) -> Hash {
        tx.signature_hash_with(self.version, extra_objects)
    }

    pub fn id_preimage(&self, tx: &StandardTransaction) -> Vec<u8> {
        tx.id_preimage(self.version)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
