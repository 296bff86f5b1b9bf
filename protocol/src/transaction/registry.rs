//! Version tag → controller dispatch.
//!
//! The registry is filled once for a network and then only read, so it
//! needs no locking: share it behind an `Arc` or a plain reference.
//!
//! | tag | controller                         |
//! |-----|------------------------------------|
//! | 0   | standard (legacy), fee override    |
//! | 1   | standard, fee override             |
//! | 128 | minter definition                  |
//! | 129 | coin creation                      |

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

use super::coin_creation::CoinCreationController;
use super::envelope::Transaction;
use super::error::TransactionError;
use super::minter_definition::MinterDefinitionController;
use super::standard::StandardTransactionController;
use super::types::{CoinOutput, OutputId, TransactionVersion};
use super::validation::{ValidationConstants, ValidationContext};
use crate::condition::{FulfillmentError, SignatureHasher, UnlockCondition, UnlockFulfillment};
use crate::config::NetworkConfig;
use crate::crypto::hash::Hash;
use crate::encoding::{Decoder, Encode, Encoder};
use crate::mint::MintConditionSource;

/// Errors from registry lookups and registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no controller registered for transaction version {0}")]
    UnknownVersion(u8),

    #[error("cannot register a version {controller} controller under tag {tag}")]
    TagMismatch { tag: u8, controller: u8 },
}

/// The operation bundle for one transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionController {
    Standard(StandardTransactionController),
    MinterDefinition(MinterDefinitionController),
    CoinCreation(CoinCreationController),
}

impl TransactionController {
    /// The version tag this controller handles.
    pub fn version(&self) -> TransactionVersion {
        match self {
            Self::Standard(c) => c.version,
            Self::MinterDefinition(_) => TransactionVersion::MINTER_DEFINITION,
            Self::CoinCreation(_) => TransactionVersion::COIN_CREATION,
        }
    }

    fn mismatch(&self, tx: &Transaction) -> TransactionError {
        TransactionError::VersionMismatch {
            expected: self.version(),
            got: tx.version(),
        }
    }

    fn owns(&self, tx: &Transaction) -> Result<(), TransactionError> {
        if tx.version() != self.version() {
            return Err(self.mismatch(tx));
        }
        Ok(())
    }

    /// Kind-specific body, without the version byte.
    pub fn encode_binary(&self, tx: &Transaction) -> Result<Vec<u8>, TransactionError> {
        self.owns(tx)?;
        match (self, tx) {
            (Self::Standard(c), Transaction::Legacy(t) | Transaction::Standard(t)) => Ok(c.encode_binary(t)),
            (Self::MinterDefinition(c), Transaction::MinterDefinition(t)) => Ok(c.encode_binary(t)),
            (Self::CoinCreation(c), Transaction::CoinCreation(t)) => Ok(c.encode_binary(t)),
            _ => Err(self.mismatch(tx)),
        }
    }

    /// Reads a kind-specific body; the version byte is already consumed.
    pub fn decode_binary(&self, dec: &mut Decoder<'_>) -> Result<Transaction, TransactionError> {
        match self {
            Self::Standard(c) => {
                let tx = c.decode_binary(dec)?;
                Ok(if c.version == TransactionVersion::LEGACY {
                    Transaction::Legacy(tx)
                } else {
                    Transaction::Standard(tx)
                })
            }
            Self::MinterDefinition(c) => Ok(Transaction::MinterDefinition(c.decode_binary(dec)?)),
            Self::CoinCreation(c) => Ok(Transaction::CoinCreation(c.decode_binary(dec)?)),
        }
    }

    pub fn encode_json(&self, tx: &Transaction) -> Result<serde_json::Value, TransactionError> {
        self.owns(tx)?;
        match (self, tx) {
            (Self::Standard(c), Transaction::Legacy(t) | Transaction::Standard(t)) => c.encode_json(t),
            (Self::MinterDefinition(c), Transaction::MinterDefinition(t)) => c.encode_json(t),
            (Self::CoinCreation(c), Transaction::CoinCreation(t)) => c.encode_json(t),
            _ => Err(self.mismatch(tx)),
        }
    }

    /// Reads the `data` member of a JSON envelope.
    pub fn decode_json(&self, data: serde_json::Value) -> Result<Transaction, TransactionError> {
        match self {
            Self::Standard(c) => {
                let tx = c.decode_json(data)?;
                Ok(if c.version == TransactionVersion::LEGACY {
                    Transaction::Legacy(tx)
                } else {
                    Transaction::Standard(tx)
                })
            }
            Self::MinterDefinition(c) => Ok(Transaction::MinterDefinition(c.decode_json(data)?)),
            Self::CoinCreation(c) => Ok(Transaction::CoinCreation(c.decode_json(data)?)),
        }
    }

    pub fn validate(
        &self,
        tx: &Transaction,
        ctx: &ValidationContext,
        constants: &ValidationConstants,
        mint: &dyn MintConditionSource,
    ) -> Result<(), TransactionError> {
        self.owns(tx)?;
        match (self, tx) {
            (Self::Standard(c), Transaction::Legacy(t) | Transaction::Standard(t)) => {
                c.validate(t, ctx, constants)
            }
            (Self::MinterDefinition(c), Transaction::MinterDefinition(t)) => {
                c.validate(t, ctx, constants, mint)
            }
            (Self::CoinCreation(c), Transaction::CoinCreation(t)) => c.validate(t, ctx, constants, mint),
            _ => Err(self.mismatch(tx)),
        }
    }

    /// `spent` maps every coin output the transaction spends.
    pub fn validate_coin_outputs(
        &self,
        tx: &Transaction,
        spent: &HashMap<OutputId, CoinOutput>,
        ctx: &ValidationContext,
    ) -> Result<(), TransactionError> {
        self.owns(tx)?;
        match (self, tx) {
            (Self::Standard(c), Transaction::Legacy(t) | Transaction::Standard(t)) => {
                c.validate_coin_outputs(t, spent, ctx)
            }
            (Self::MinterDefinition(c), Transaction::MinterDefinition(t)) => c.validate_coin_outputs(t),
            (Self::CoinCreation(c), Transaction::CoinCreation(t)) => c.validate_coin_outputs(t),
            _ => Err(self.mismatch(tx)),
        }
    }

    pub fn validate_block_stake_outputs(
        &self,
        tx: &Transaction,
        spent: &HashMap<OutputId, CoinOutput>,
        ctx: &ValidationContext,
    ) -> Result<(), TransactionError> {
        self.owns(tx)?;
        match (self, tx) {
            (Self::Standard(c), Transaction::Legacy(t) | Transaction::Standard(t)) => {
                c.validate_block_stake_outputs(t, spent, ctx)
            }
            (Self::MinterDefinition(c), Transaction::MinterDefinition(t)) => {
                c.validate_block_stake_outputs(t)
            }
            (Self::CoinCreation(c), Transaction::CoinCreation(t)) => c.validate_block_stake_outputs(t),
            _ => Err(self.mismatch(tx)),
        }
    }

    /// Fills the mint fulfillment of a mint-class transaction through `sign`.
    pub fn sign_extension<F>(
        &self,
        tx: &mut Transaction,
        mint: &dyn MintConditionSource,
        block_height: u64,
        sign: F,
    ) -> Result<(), TransactionError>
    where
        F: FnOnce(&mut UnlockFulfillment, &UnlockCondition, &dyn SignatureHasher) -> Result<(), FulfillmentError>,
    {
        self.owns(tx)?;
        let mismatch = self.mismatch(tx);
        match (self, tx) {
            (Self::Standard(c), Transaction::Legacy(t) | Transaction::Standard(t)) => c.sign_extension(t),
            (Self::MinterDefinition(c), Transaction::MinterDefinition(t)) => {
                c.sign_extension(t, mint, block_height, sign)
            }
            (Self::CoinCreation(c), Transaction::CoinCreation(t)) => {
                c.sign_extension(t, mint, block_height, sign)
            }
            _ => Err(mismatch),
        }
    }

    pub fn signature_hash(
        &self,
        tx: &Transaction,
        extra_objects: &[&dyn Encode],
    ) -> Result<Hash, TransactionError> {
        self.owns(tx)?;
        match (self, tx) {
            (Self::Standard(c), Transaction::Legacy(t) | Transaction::Standard(t)) => {
                Ok(c.signature_hash(t, extra_objects))
            }
            (Self::MinterDefinition(c), Transaction::MinterDefinition(t)) => {
                Ok(c.signature_hash(t, extra_objects))
            }
            (Self::CoinCreation(c), Transaction::CoinCreation(t)) => Ok(c.signature_hash(t, extra_objects)),
            _ => Err(self.mismatch(tx)),
        }
    }

    pub fn id_preimage(&self, tx: &Transaction) -> Result<Vec<u8>, TransactionError> {
        self.owns(tx)?;
        match (self, tx) {
            (Self::Standard(c), Transaction::Legacy(t) | Transaction::Standard(t)) => Ok(c.id_preimage(t)),
            (Self::MinterDefinition(c), Transaction::MinterDefinition(t)) => Ok(c.id_preimage(t)),
            (Self::CoinCreation(c), Transaction::CoinCreation(t)) => Ok(c.id_preimage(t)),
            _ => Err(self.mismatch(tx)),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    version: TransactionVersion,
    #[serde(default)]
    data: serde_json::Value,
}

/// Maps version tags to controllers.
#[derive(Debug, Clone, Default)]
pub struct TransactionRegistry {
    controllers: BTreeMap<u8, TransactionController>,
}

impl TransactionRegistry {
    /// An empty registry. Anything looked up in it is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry for `config`: base kinds with the network's fee grace
    /// height, then both mint kinds.
    pub fn for_network(config: &NetworkConfig) -> Self {
        let mut registry = Self::new();
        let controllers = [
            TransactionController::Standard(StandardTransactionController::new(
                TransactionVersion::LEGACY,
                config.fee_grace_height,
            )),
            TransactionController::Standard(StandardTransactionController::new(
                TransactionVersion::STANDARD,
                config.fee_grace_height,
            )),
            TransactionController::MinterDefinition(MinterDefinitionController),
            TransactionController::CoinCreation(CoinCreationController),
        ];
        for controller in controllers {
            registry.insert(controller);
        }
        registry
    }

    /// Stores `controller` under `version`, returning the one it replaces.
    pub fn register(
        &mut self,
        version: TransactionVersion,
        controller: TransactionController,
    ) -> Result<Option<TransactionController>, RegistryError> {
        if controller.version() != version {
            return Err(RegistryError::TagMismatch {
                tag: version.0,
                controller: controller.version().0,
            });
        }
        Ok(self.insert(controller))
    }

    fn insert(&mut self, controller: TransactionController) -> Option<TransactionController> {
        let version = controller.version();
        let previous = self.controllers.insert(version.0, controller);
        debug!(%version, replaced = previous.is_some(), "transaction controller registered");
        previous
    }

    pub fn lookup(&self, version: TransactionVersion) -> Result<&TransactionController, RegistryError> {
        self.controllers
            .get(&version.0)
            .ok_or(RegistryError::UnknownVersion(version.0))
    }

    /// Registered version tags, ascending.
    pub fn versions(&self) -> Vec<TransactionVersion> {
        self.controllers.keys().map(|&v| TransactionVersion(v)).collect()
    }

    fn controller_for(&self, tx: &Transaction) -> Result<&TransactionController, TransactionError> {
        Ok(self.lookup(tx.version())?)
    }

    /// Decodes a binary envelope. Every byte must be consumed.
    pub fn decode_binary(&self, bytes: &[u8]) -> Result<Transaction, TransactionError> {
        let mut dec = Decoder::new(bytes);
        let version: TransactionVersion = dec.read()?;
        let tx = self.lookup(version)?.decode_binary(&mut dec)?;
        dec.finish()?;
        Ok(tx)
    }

    /// Decodes a `{"version": .., "data": {..}}` document.
    pub fn decode_json(&self, text: &str) -> Result<Transaction, TransactionError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        self.lookup(envelope.version)?.decode_json(envelope.data)
    }

    pub fn encode_binary(&self, tx: &Transaction) -> Result<Vec<u8>, TransactionError> {
        let body = self.controller_for(tx)?.encode_binary(tx)?;
        let mut enc = Encoder::with_capacity(1 + body.len());
        enc.write(&tx.version());
        enc.write_raw(&body);
        Ok(enc.finish())
    }

    pub fn encode_json(&self, tx: &Transaction) -> Result<serde_json::Value, TransactionError> {
        let data = self.controller_for(tx)?.encode_json(tx)?;
        Ok(serde_json::json!({ "version": tx.version(), "data": data }))
    }

    pub fn validate(
        &self,
        tx: &Transaction,
        ctx: &ValidationContext,
        constants: &ValidationConstants,
        mint: &dyn MintConditionSource,
    ) -> Result<(), TransactionError> {
        self.controller_for(tx)?.validate(tx, ctx, constants, mint)
    }

    pub fn validate_coin_outputs(
        &self,
        tx: &Transaction,
        spent: &HashMap<OutputId, CoinOutput>,
        ctx: &ValidationContext,
    ) -> Result<(), TransactionError> {
        self.controller_for(tx)?.validate_coin_outputs(tx, spent, ctx)
    }

    pub fn validate_block_stake_outputs(
        &self,
        tx: &Transaction,
        spent: &HashMap<OutputId, CoinOutput>,
        ctx: &ValidationContext,
    ) -> Result<(), TransactionError> {
        self.controller_for(tx)?.validate_block_stake_outputs(tx, spent, ctx)
    }

    pub fn sign_extension<F>(
        &self,
        tx: &mut Transaction,
        mint: &dyn MintConditionSource,
        block_height: u64,
        sign: F,
    ) -> Result<(), TransactionError>
    where
        F: FnOnce(&mut UnlockFulfillment, &UnlockCondition, &dyn SignatureHasher) -> Result<(), FulfillmentError>,
    {
        let controller = *self.lookup(tx.version())?;
        controller.sign_extension(tx, mint, block_height, sign)
    }

    pub fn signature_hash(
        &self,
        tx: &Transaction,
        extra_objects: &[&dyn Encode],
    ) -> Result<Hash, TransactionError> {
        self.controller_for(tx)?.signature_hash(tx, extra_objects)
    }

    pub fn id_preimage(&self, tx: &Transaction) -> Result<Vec<u8>, TransactionError> {
        self.controller_for(tx)?.id_preimage(tx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
