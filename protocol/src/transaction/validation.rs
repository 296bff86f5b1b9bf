//! Validation context and the checks every transaction kind shares.
//!
//! Validation is a pure function of the transaction, the chain position and
//! a read-only view of the mint authority. Nothing here mutates shared state,
//! so any number of transactions can be validated concurrently.

use tracing::debug;

use super::error::TransactionError;
use super::types::{BlockHeight, CoinOutput, Currency, Timestamp};
use crate::condition::{FulfillContext, SignatureHasher, StandardContext};

/// Where on the chain a transaction is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    /// Height of the block that would contain the transaction.
    pub block_height: BlockHeight,
    /// Timestamp of that block.
    pub block_time: Timestamp,
    /// `true` when validating a transaction already inside a block, `false`
    /// when admitting it to the pending pool.
    pub confirmed: bool,
}

impl ValidationContext {
    /// Context for admitting a transaction to the pending pool.
    pub fn pool(block_height: BlockHeight, block_time: Timestamp) -> Self {
        Self {
            block_height,
            block_time,
            confirmed: false,
        }
    }

    /// Context for a transaction inside a block.
    pub fn block(block_height: BlockHeight, block_time: Timestamp) -> Self {
        Self {
            block_height,
            block_time,
            confirmed: true,
        }
    }

    pub(crate) fn fulfill_context<'a>(&self, hasher: &'a dyn SignatureHasher) -> FulfillContext<'a> {
        FulfillContext {
            block_height: self.block_height,
            block_time: self.block_time,
            hasher,
        }
    }
}

/// Network limits applied during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationConstants {
    pub block_size_limit: usize,
    pub arbitrary_data_size_limit: usize,
    pub minimum_miner_fee: Currency,
    pub multisig_activation_height: BlockHeight,
}

impl ValidationConstants {
    pub fn standard_context(&self, block_height: BlockHeight) -> StandardContext {
        StandardContext {
            block_height,
            multisig_activation_height: self.multisig_activation_height,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared checks
// ---------------------------------------------------------------------------

/// Logs a rejection at debug level and passes the error through.
pub(crate) fn reject(kind: &'static str, err: TransactionError) -> TransactionError {
    debug!(kind, check = ?err.kind(), error = %err, "transaction rejected");
    err
}

pub(crate) fn check_size(size: usize, limit: usize) -> Result<(), TransactionError> {
    if size > limit {
        return Err(TransactionError::TransactionTooLarge { size, limit });
    }
    Ok(())
}

pub(crate) fn check_arbitrary_data(data: &[u8], limit: usize) -> Result<(), TransactionError> {
    if data.len() > limit {
        return Err(TransactionError::ArbitraryDataTooLarge {
            size: data.len(),
            limit,
        });
    }
    Ok(())
}

pub(crate) fn check_miner_fees(fees: &[Currency], minimum: Currency) -> Result<(), TransactionError> {
    for (index, fee) in fees.iter().enumerate() {
        if *fee < minimum {
            return Err(TransactionError::MinerFeeTooLow {
                index,
                fee: *fee,
                minimum,
            });
        }
    }
    Ok(())
}

/// Every output non-zero, then every output condition standard.
pub(crate) fn check_outputs(
    outputs: &[CoinOutput],
    ctx: &StandardContext,
) -> Result<(), TransactionError> {
    if let Some(index) = outputs.iter().position(|o| o.value.is_zero()) {
        return Err(TransactionError::ZeroOutput { index });
    }
    for (index, output) in outputs.iter().enumerate() {
        output
            .condition
            .is_standard(ctx)
            .map_err(|source| TransactionError::NonStandardCondition { index, source })?;
    }
    Ok(())
}

/// Sums currencies, failing on overflow.
pub(crate) fn sum<'a>(values: impl IntoIterator<Item = &'a Currency>) -> Result<Currency, TransactionError> {
    values
        .into_iter()
        .try_fold(Currency::zero(), |acc, v| acc.checked_add(*v))
        .ok_or(TransactionError::ValueOverflow)
}
