//! Transaction errors and their taxonomy.
//!
//! Every validation failure is a distinct [`TransactionError`] variant so the
//! caller can tell exactly which check failed. [`TransactionError::kind`]
//! folds the variants into the five classes a host usually branches on.

use std::fmt;
use thiserror::Error;

use super::nonce::NonceError;
use super::registry::RegistryError;
use super::types::{Currency, OutputId, TransactionVersion};
use crate::condition::{ConditionError, ConditionType, FulfillmentError, UnlockType};
use crate::encoding::EncodingError;
use crate::mint::MintStateError;

/// Coarse classification of a [`TransactionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The bytes or document could not be turned into a transaction.
    MalformedEncoding,
    /// Inputs, outputs or extension fields the kind does not allow.
    StructuralViolation,
    /// A fulfillment does not satisfy its condition.
    AuthorizationFailure,
    /// Fees, zero outputs, non-standard conditions, nil nonce.
    PolicyViolation,
    /// Transaction or arbitrary data too large.
    SizeLimitExceeded,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MalformedEncoding => "malformed encoding",
            Self::StructuralViolation => "structural violation",
            Self::AuthorizationFailure => "authorization failure",
            Self::PolicyViolation => "policy violation",
            Self::SizeLimitExceeded => "size limit exceeded",
        };
        f.write_str(name)
    }
}

/// Errors from decoding, validating, signing or hashing a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    // -- malformed encoding ------------------------------------------------

    #[error("binary decoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("json decoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed nonce: {0}")]
    Nonce(#[from] NonceError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("controller for version {expected} was handed a version {got} transaction")]
    VersionMismatch {
        expected: TransactionVersion,
        got: TransactionVersion,
    },

    // -- structural violations ---------------------------------------------

    #[error("{kind} transactions cannot carry {field}")]
    ForbiddenField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("transaction data carries no {expected} extension")]
    MissingExtension { expected: &'static str },

    #[error("coin creation requires at least one coin output")]
    NoCoinOutputs,

    #[error("transaction requires at least one miner fee")]
    NoMinerFees,

    #[error("output {0} is spent twice")]
    DuplicateInput(OutputId),

    #[error("input spends unknown output {0}")]
    UnknownOutput(OutputId),

    // -- authorization failures --------------------------------------------

    #[error("mint fulfillment does not satisfy the mint condition: {0}")]
    MintFulfillment(#[source] FulfillmentError),

    #[error("mint condition unavailable: {0}")]
    MintConditionUnavailable(#[from] MintStateError),

    #[error("input {index} fulfillment rejected: {source}")]
    InputFulfillment {
        index: usize,
        #[source]
        source: FulfillmentError,
    },

    #[error("signing failed: {0}")]
    Signing(#[source] FulfillmentError),

    // -- policy violations -------------------------------------------------

    #[error("nonce must not be zero")]
    NilNonce,

    #[error("miner fee {index} is {fee}, minimum is {minimum}")]
    MinerFeeTooLow {
        index: usize,
        fee: Currency,
        minimum: Currency,
    },

    #[error("output {index} has zero value")]
    ZeroOutput { index: usize },

    #[error("output {index} has a non-standard condition: {source}")]
    NonStandardCondition {
        index: usize,
        #[source]
        source: ConditionError,
    },

    #[error("new mint condition is not standard: {0}")]
    NonStandardMintCondition(#[source] ConditionError),

    #[error("condition type {0} cannot be used as a mint condition")]
    DisallowedMintConditionType(ConditionType),

    #[error("single-key mint condition must be a public key unlock hash, got {0}")]
    MintConditionNotPubKey(UnlockType),

    #[error("inputs total {inputs}, outputs and fees total {outputs}")]
    UnbalancedValue { inputs: Currency, outputs: Currency },

    #[error("value sum overflows")]
    ValueOverflow,

    // -- size limits -------------------------------------------------------

    #[error("transaction is {size} bytes, limit is {limit}")]
    TransactionTooLarge { size: usize, limit: usize },

    #[error("arbitrary data is {size} bytes, limit is {limit}")]
    ArbitraryDataTooLarge { size: usize, limit: usize },
}

impl TransactionError {
    pub fn kind(&self) -> ErrorKind {
        use TransactionError::*;
        match self {
            Encoding(_) | Json(_) | Nonce(_) | Registry(_) | VersionMismatch { .. } => {
                ErrorKind::MalformedEncoding
            }
            ForbiddenField { .. }
            | MissingExtension { .. }
            | NoCoinOutputs
            | NoMinerFees
            | DuplicateInput(_)
            | UnknownOutput(_) => ErrorKind::StructuralViolation,
            MintFulfillment(_)
            | MintConditionUnavailable(_)
            | InputFulfillment { .. }
            | Signing(_) => ErrorKind::AuthorizationFailure,
            NilNonce
            | MinerFeeTooLow { .. }
            | ZeroOutput { .. }
            | NonStandardCondition { .. }
            | NonStandardMintCondition(_)
            | DisallowedMintConditionType(_)
            | MintConditionNotPubKey(_)
            | UnbalancedValue { .. }
            | ValueOverflow => ErrorKind::PolicyViolation,
            TransactionTooLarge { .. } | ArbitraryDataTooLarge { .. } => {
                ErrorKind::SizeLimitExceeded
            }
        }
    }
}
