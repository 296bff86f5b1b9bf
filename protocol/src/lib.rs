// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Coinmint Protocol — Core Library
//!
//! Governance-controlled minting for a UTXO ledger. One designated
//! authority, the *mint condition*, may create coins and may hand that
//! authority to someone else. Everybody else gets to watch.
//!
//! Everything here is consensus code: two implementations that disagree on
//! a single encoded byte fork the chain. So the encodings are spelled out by
//! hand, the validation order is fixed, and nothing mutates during
//! validation.
//!
//! ## Architecture
//!
//! - **encoding** — Canonical binary codec. Little-endian, length-prefixed.
//! - **crypto** — Ed25519 keys, BLAKE3 and SHA-256.
//! - **condition** — Unlock conditions, fulfillments and the key signer.
//! - **transaction** — The envelope, the mint kinds, the base kinds, the registry.
//! - **mint** — Height-addressed history of the mint condition.
//! - **config** — Consensus constants and network profiles.
//! - **bootstrap** — Explicit per-process setup for one network.
//!
//! ## Design Philosophy
//!
//! 1. Determinism over convenience. Hash pre-images are written out byte by byte.
//! 2. No panics on input. Malformed bytes, JSON or constants are errors.
//! 3. If it touches money, it has tests. Plural.

pub mod bootstrap;
pub mod condition;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod mint;
pub mod transaction;

pub use bootstrap::{bootstrap, Network};
pub use config::{NetworkConfig, NetworkProfile};
pub use transaction::{Transaction, TransactionError, TransactionRegistry};
