//! # Mint Authority
//!
//! Exactly one mint condition is live at any block height. Genesis seeds it;
//! each confirmed minter definition supersedes it from the next block on.
//! Validation only ever reads it, and only at the height of the block being
//! validated.
//!
//! ```text
//! height:     0 (genesis)     5            9
//!             ├───────────────┼────────────┼───────────▶
//! condition:  G               D1 (tx @ 5)  D2 (tx @ 9)
//!
//! mint_condition_at(5)  == G    blocks strictly below 5 decide
//! mint_condition_at(6)  == D1
//! mint_condition_at(10) == D2
//! ```
//!
//! [`MintConditionStore`] is the consensus-set subscriber's side of this:
//! block confirmation calls [`MintConditionStore::apply_block`], rollback
//! calls [`MintConditionStore::revert_block`], and validators read through
//! the [`MintConditionSource`] trait. Reads take a shared lock and return
//! owned values, so a validator never observes a half-applied block.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::condition::UnlockCondition;
use crate::crypto::hash::Hash;
use crate::encoding::{decode_exact, encode_to_vec};
use crate::transaction::envelope::Transaction;
use crate::transaction::types::BlockHeight;

/// Errors from the mint authority store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MintStateError {
    #[error("mint condition at height {requested} is unknown, tip is {tip}")]
    HeightUnavailable {
        requested: BlockHeight,
        tip: BlockHeight,
    },

    #[error("cannot apply block {got}, next block is {expected}")]
    NonSequentialApply {
        expected: BlockHeight,
        got: BlockHeight,
    },

    #[error("cannot revert block {got}, tip is {tip}")]
    NonSequentialRevert { tip: BlockHeight, got: BlockHeight },

    #[error("the genesis block cannot be reverted")]
    CannotRevertGenesis,

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Read access to the mint condition, addressed by height.
pub trait MintConditionSource: Send + Sync {
    /// The condition a transaction in block `height` must satisfy.
    fn mint_condition_at(&self, height: BlockHeight) -> Result<UnlockCondition, MintStateError>;
}

/// A mint condition installed by a confirmed minter definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintDefinition {
    pub height: BlockHeight,
    pub transaction_id: Hash,
    pub condition: UnlockCondition,
}

#[derive(Debug)]
struct StoreState {
    genesis: UnlockCondition,
    /// Ordered by height; several entries may share a height.
    definitions: Vec<MintDefinition>,
    tip: BlockHeight,
}

impl StoreState {
    fn condition_at(&self, height: BlockHeight) -> Result<UnlockCondition, MintStateError> {
        if height > self.tip.saturating_add(1) {
            return Err(MintStateError::HeightUnavailable {
                requested: height,
                tip: self.tip,
            });
        }
        let condition = self
            .definitions
            .iter()
            .rev()
            .find(|d| d.height < height)
            .map(|d| &d.condition)
            .unwrap_or(&self.genesis);
        Ok(condition.clone())
    }
}

/// Height-versioned history of the mint condition.
#[derive(Debug)]
pub struct MintConditionStore {
    state: RwLock<StoreState>,
}

impl MintConditionStore {
    /// A store holding only the genesis block.
    pub fn new(genesis: UnlockCondition) -> Self {
        Self {
            state: RwLock::new(StoreState {
                genesis,
                definitions: Vec::new(),
                tip: 0,
            }),
        }
    }

    /// Height of the last applied block.
    pub fn tip(&self) -> BlockHeight {
        self.state.read().tip
    }

    pub fn genesis_condition(&self) -> UnlockCondition {
        self.state.read().genesis.clone()
    }

    /// The condition the next block's transactions must satisfy.
    pub fn current(&self) -> UnlockCondition {
        let state = self.state.read();
        state
            .definitions
            .last()
            .map(|d| d.condition.clone())
            .unwrap_or_else(|| state.genesis.clone())
    }

    pub fn definitions(&self) -> Vec<MintDefinition> {
        self.state.read().definitions.clone()
    }

    /// Records the minter definitions of block `height`.
    ///
    /// The block must directly follow the tip. Transactions are assumed
    /// validated; only minter definitions are looked at. Returns how many
    /// definitions the block carried.
    pub fn apply_block(
        &self,
        height: BlockHeight,
        transactions: &[Transaction],
    ) -> Result<usize, MintStateError> {
        let mut state = self.state.write();
        if state.tip.checked_add(1) != Some(height) {
            return Err(MintStateError::NonSequentialApply {
                expected: state.tip.saturating_add(1),
                got: height,
            });
        }
        let mut installed = 0;
        for tx in transactions {
            if let Transaction::MinterDefinition(def) = tx {
                let transaction_id = tx.id();
                info!(
                    height,
                    tx_id = %transaction_id,
                    condition = %def.mint_condition.unlock_hash(),
                    "mint condition installed"
                );
                state.definitions.push(MintDefinition {
                    height,
                    transaction_id,
                    condition: def.mint_condition.clone(),
                });
                installed += 1;
            }
        }
        state.tip = height;
        Ok(installed)
    }

    /// Undoes block `height`, which must be the tip.
    pub fn revert_block(&self, height: BlockHeight) -> Result<usize, MintStateError> {
        let mut state = self.state.write();
        if height == 0 {
            return Err(MintStateError::CannotRevertGenesis);
        }
        if height != state.tip {
            return Err(MintStateError::NonSequentialRevert {
                tip: state.tip,
                got: height,
            });
        }
        let keep = state
            .definitions
            .iter()
            .position(|d| d.height >= height)
            .unwrap_or(state.definitions.len());
        let removed = state.definitions.split_off(keep);
        for def in &removed {
            info!(height, tx_id = %def.transaction_id, "mint condition rolled back");
        }
        state.tip = height - 1;
        Ok(removed.len())
    }

    /// Serializes the full history with bincode.
    pub fn snapshot(&self) -> Result<Vec<u8>, MintStateError> {
        let state = self.state.read();
        let snapshot = Snapshot {
            genesis: encode_to_vec(&state.genesis),
            tip: state.tip,
            definitions: state
                .definitions
                .iter()
                .map(|d| SnapshotEntry {
                    height: d.height,
                    transaction_id: *d.transaction_id.as_bytes(),
                    condition: encode_to_vec(&d.condition),
                })
                .collect(),
        };
        bincode::serialize(&snapshot).map_err(|e| MintStateError::Snapshot(e.to_string()))
    }

    /// Rebuilds a store from [`snapshot`](Self::snapshot) output.
    pub fn restore(bytes: &[u8]) -> Result<Self, MintStateError> {
        let snapshot: Snapshot =
            bincode::deserialize(bytes).map_err(|e| MintStateError::Snapshot(e.to_string()))?;
        let decode = |raw: &[u8]| {
            decode_exact::<UnlockCondition>(raw).map_err(|e| MintStateError::Snapshot(e.to_string()))
        };
        if snapshot.tip == BlockHeight::MAX {
            return Err(MintStateError::Snapshot("tip height leaves no next block".into()));
        }
        let mut definitions = Vec::with_capacity(snapshot.definitions.len());
        let mut previous = 0;
        for entry in &snapshot.definitions {
            if entry.height == 0 || entry.height < previous || entry.height > snapshot.tip {
                return Err(MintStateError::Snapshot(format!(
                    "definition height {} out of order",
                    entry.height
                )));
            }
            previous = entry.height;
            definitions.push(MintDefinition {
                height: entry.height,
                transaction_id: Hash::from_bytes(entry.transaction_id),
                condition: decode(&entry.condition)?,
            });
        }
        Ok(Self {
            state: RwLock::new(StoreState {
                genesis: decode(&snapshot.genesis)?,
                definitions,
                tip: snapshot.tip,
            }),
        })
    }
}

impl MintConditionSource for MintConditionStore {
    fn mint_condition_at(&self, height: BlockHeight) -> Result<UnlockCondition, MintStateError> {
        self.state.read().condition_at(height)
    }
}

/// On-disk form. Conditions keep their canonical encoding so a snapshot
/// never depends on serde's view of them.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    genesis: Vec<u8>,
    tip: BlockHeight,
    definitions: Vec<SnapshotEntry>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
    height: BlockHeight,
    transaction_id: [u8; 32],
    condition: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{UnlockFulfillment, UnlockHash};
    use crate::crypto::keys::Keypair;
    use crate::transaction::minter_definition::MinterDefinitionTransaction;
    use crate::transaction::nonce::TransactionNonce;
    use crate::transaction::types::Currency;

    fn key_condition(seed: u8) -> UnlockCondition {
        UnlockCondition::from_public_key(&Keypair::from_seed(&[seed; 32]).public_key())
    }

    fn definition(seed: u8) -> Transaction {
        Transaction::MinterDefinition(MinterDefinitionTransaction {
            nonce: TransactionNonce::from_bytes([seed, 1, 2, 3, 4, 5, 6, 7]),
            mint_fulfillment: UnlockFulfillment::Nil,
            mint_condition: key_condition(seed),
            miner_fees: vec![Currency::new(1)],
            arbitrary_data: Vec::new(),
        })
    }

    #[test]
    fn genesis_applies_until_a_definition_confirms() {
        let store = MintConditionStore::new(key_condition(1));
        store.apply_block(1, &[]).unwrap();
        assert_eq!(store.apply_block(2, &[definition(2)]).unwrap(), 1);
        store.apply_block(3, &[]).unwrap();

        assert_eq!(store.mint_condition_at(1).unwrap(), key_condition(1));
        assert_eq!(store.mint_condition_at(2).unwrap(), key_condition(1));
        assert_eq!(store.mint_condition_at(3).unwrap(), key_condition(2));
        assert_eq!(store.mint_condition_at(4).unwrap(), key_condition(2));
        assert_eq!(store.current(), key_condition(2));
    }

    #[test]
    fn later_definition_in_the_same_block_wins() {
        let store = MintConditionStore::new(key_condition(1));
        store.apply_block(1, &[definition(2), definition(3)]).unwrap();
        assert_eq!(store.mint_condition_at(2).unwrap(), key_condition(3));
    }

    #[test]
    fn future_heights_are_unavailable() {
        let store = MintConditionStore::new(key_condition(1));
        store.apply_block(1, &[]).unwrap();
        assert_eq!(
            store.mint_condition_at(3),
            Err(MintStateError::HeightUnavailable { requested: 3, tip: 1 })
        );
    }

    #[test]
    fn blocks_apply_in_order() {
        let store = MintConditionStore::new(key_condition(1));
        assert_eq!(
            store.apply_block(2, &[]),
            Err(MintStateError::NonSequentialApply { expected: 1, got: 2 })
        );
    }

    #[test]
    fn revert_restores_the_previous_condition() {
        let store = MintConditionStore::new(key_condition(1));
        store.apply_block(1, &[definition(2)]).unwrap();
        store.apply_block(2, &[definition(3)]).unwrap();

        assert_eq!(store.revert_block(2).unwrap(), 1);
        assert_eq!(store.tip(), 1);
        assert_eq!(store.current(), key_condition(2));

        assert_eq!(store.revert_block(1).unwrap(), 1);
        assert_eq!(store.current(), key_condition(1));
        assert_eq!(store.revert_block(0), Err(MintStateError::CannotRevertGenesis));
    }

    #[test]
    fn revert_must_target_the_tip() {
        let store = MintConditionStore::new(key_condition(1));
        store.apply_block(1, &[]).unwrap();
        store.apply_block(2, &[]).unwrap();
        assert_eq!(
            store.revert_block(1),
            Err(MintStateError::NonSequentialRevert { tip: 2, got: 1 })
        );
    }

    #[test]
    fn snapshot_restores_full_history() {
        let store = MintConditionStore::new(key_condition(1));
        store.apply_block(1, &[definition(2)]).unwrap();
        store.apply_block(2, &[]).unwrap();

        let restored = MintConditionStore::restore(&store.snapshot().unwrap()).unwrap();
        assert_eq!(restored.tip(), 2);
        assert_eq!(restored.definitions(), store.definitions());
        assert_eq!(restored.genesis_condition(), key_condition(1));
        assert_eq!(restored.mint_condition_at(3).unwrap(), key_condition(2));
    }

    #[test]
    fn snapshot_with_last_possible_tip_is_rejected() {
        let snapshot = Snapshot {
            genesis: encode_to_vec(&UnlockCondition::Nil),
            tip: BlockHeight::MAX,
            definitions: Vec::new(),
        };
        let bytes = bincode::serialize(&snapshot).unwrap();
        match MintConditionStore::restore(&bytes) {
            Err(MintStateError::Snapshot(_)) => {}
            other => panic!("expected Snapshot error, got {:?}", other),
        }
    }

    #[test]
    fn garbage_snapshot_is_rejected() {
        assert!(matches!(
            MintConditionStore::restore(&[1, 2, 3]),
            Err(MintStateError::Snapshot(_))
        ));
    }

    #[test]
    fn definition_records_transaction_id() {
        let store = MintConditionStore::new(key_condition(1));
        let tx = definition(2);
        store.apply_block(1, std::slice::from_ref(&tx)).unwrap();
        let defs = store.definitions();
        assert_eq!(defs[0].transaction_id, tx.id());
        assert_eq!(defs[0].condition.unlock_hash(), UnlockHash::from_public_key(
            &Keypair::from_seed(&[2; 32]).public_key()
        ));
    }

    #[test]
    fn concurrent_readers_see_consistent_values() {
        use std::sync::Arc;
        let store = Arc::new(MintConditionStore::new(key_condition(1)));
        store.apply_block(1, &[definition(2)]).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.mint_condition_at(2).unwrap())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), key_condition(2));
        }
    }
}
