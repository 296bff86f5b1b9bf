//! # Cryptographic Primitives
//!
//! Two things live here: hashes and Ed25519 keys. Both are thin, typed
//! wrappers around audited crates. If you're tempted to optimize these
//! functions, please reconsider. Then go read about timing attacks.
//!
//! - **Ed25519** for signatures, verified strictly.
//! - **BLAKE3** for transaction ids and signature hashes.
//! - **SHA-256** for unlock hashes and their checksums.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, sha256_array, Hash, HashError};
pub use keys::{KeyError, Keypair, PublicKey, Signature};
