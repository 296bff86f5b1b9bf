//! # Transaction Module
//!
//! Everything a host ledger needs to carry, check and identify the two
//! mint-class transaction kinds, plus just enough of the base kinds to apply
//! the early-chain fee override to them.
//!
//! ## Architecture
//!
//! ```text
//! types.rs             — Specifiers, versions, currency, coin inputs/outputs
//! nonce.rs             — 8-byte uniqueness token for input-less transactions
//! envelope.rs          — Transaction sum type, generic data shape, ids
//! coin_creation.rs     — Version 129: mint new coins
//! minter_definition.rs — Version 128: hand mint authority to a new condition
//! standard.rs          — Versions 0/1: value transfer with fee override
//! registry.rs          — Version tag → controller dispatch
//! validation.rs        — Context, network limits, shared checks
//! error.rs             — TransactionError and its five-way taxonomy
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Draft** — build a [`CoinCreationTransaction`] or
//!    [`MinterDefinitionTransaction`]; `draft` picks a random nonce.
//! 2. **Sign** — [`TransactionRegistry::sign_extension`] hands the mint
//!    fulfillment and the condition in force to a signing callback, usually
//!    a [`KeySigner`](crate::condition::KeySigner).
//! 3. **Validate** — [`TransactionRegistry::validate`] against the block
//!    context and a height-consistent [`MintConditionSource`](crate::mint::MintConditionSource).
//! 4. **Confirm** — the block's minter definitions reach the
//!    [`MintConditionStore`](crate::mint::MintConditionStore).
//!
//! ## Design Decisions
//!
//! - The kinds are a closed enum. Unknown version tags are refused at
//!   lookup, never cast at runtime.
//! - Validation never writes. A failed check leaves every shared resource
//!   exactly as it was.
//! - Signature hashes and ids are BLAKE3 over hand-ordered canonical bytes;
//!   the order is consensus and must not drift.

pub mod coin_creation;
pub mod envelope;
pub mod error;
pub mod minter_definition;
pub mod nonce;
pub mod registry;
pub mod standard;
pub mod types;
pub mod validation;

pub use coin_creation::{CoinCreationController, CoinCreationTransaction};
pub use envelope::{Transaction, TransactionData, TransactionExtension};
pub use error::{ErrorKind, TransactionError};
pub use minter_definition::{MinterDefinitionController, MinterDefinitionTransaction};
pub use nonce::{NonceError, TransactionNonce, NONCE_SIZE};
pub use registry::{RegistryError, TransactionController, TransactionRegistry};
pub use standard::{InputSignatureHasher, StandardTransaction, StandardTransactionController};
pub use types::{BlockHeight, CoinInput, CoinOutput, Currency, OutputId, Specifier, Timestamp, TransactionVersion};
pub use validation::{ValidationConstants, ValidationContext};
