//! # Network Configuration & Constants
//!
//! Every consensus number lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! These values define the DNA of each network. Changing one after launch
//! forks the chain, so the per-network heights below are stored as literals
//! rather than recomputed at startup. The tests prove the literals match the
//! day-count formulas they came from.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::condition::{ConditionError, StandardContext, UnlockCondition, UnlockHash, UnlockHashError};
use crate::transaction::types::{BlockHeight, Currency};
use crate::transaction::validation::ValidationConstants;

// ---------------------------------------------------------------------------
// Transaction version tags
// ---------------------------------------------------------------------------

/// Base transaction, original layout.
pub const TRANSACTION_VERSION_LEGACY: u8 = 0;

/// Base transaction, current layout.
pub const TRANSACTION_VERSION_STANDARD: u8 = 1;

/// Replaces the mint condition.
pub const TRANSACTION_VERSION_MINTER_DEFINITION: u8 = 128;

/// Creates coins under the mint condition.
pub const TRANSACTION_VERSION_COIN_CREATION: u8 = 129;

// ---------------------------------------------------------------------------
// Block timing
// ---------------------------------------------------------------------------

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Target seconds between blocks on the standard network.
pub const STANDARD_BLOCK_FREQUENCY: u64 = 120;

/// Target seconds between blocks on the test network.
pub const TEST_BLOCK_FREQUENCY: u64 = 120;

/// Devnet blocks come fast so local testing doesn't involve coffee breaks.
pub const DEV_BLOCK_FREQUENCY: u64 = 12;

// ---------------------------------------------------------------------------
// Fee grace period
// ---------------------------------------------------------------------------

/// Below this height, confirmed base transactions only need a non-zero fee.
/// 74 days of blocks at 120 s: `74 * ((86_400 + 120) / 120)`.
pub const STANDARD_FEE_GRACE_HEIGHT: BlockHeight = 53_354;

/// 90 days of blocks at 120 s: `90 * ((86_400 + 120) / 120)`.
pub const TEST_FEE_GRACE_HEIGHT: BlockHeight = 64_890;

/// Devnet enforces the nominal minimum from genesis.
pub const DEV_FEE_GRACE_HEIGHT: BlockHeight = 0;

/// Minimum fee inside the grace period.
pub const GRACE_MINIMUM_MINER_FEE: Currency = Currency::new(1);

// ---------------------------------------------------------------------------
// Limits and fees
// ---------------------------------------------------------------------------

/// Maximum encoded size of a block, and so of any single transaction.
pub const BLOCK_SIZE_LIMIT: usize = 2_000_000;

/// Maximum arbitrary data per transaction. Enough for a memo, not for a JPEG.
pub const ARBITRARY_DATA_SIZE_LIMIT: usize = 83;

/// Nominal minimum miner fee on the standard and test networks (0.1 coin).
pub const STANDARD_MINIMUM_MINER_FEE: Currency = Currency::new(100_000_000);
pub const TEST_MINIMUM_MINER_FEE: Currency = Currency::new(100_000_000);

/// One unit on devnet, so hand-written test transactions stay readable.
pub const DEV_MINIMUM_MINER_FEE: Currency = Currency::new(1);

/// Multi-signature conditions became standard at this height on the
/// standard network. Test and dev networks had them from genesis.
pub const STANDARD_MULTISIG_ACTIVATION_HEIGHT: BlockHeight = 42_000;
pub const TEST_MULTISIG_ACTIVATION_HEIGHT: BlockHeight = 0;
pub const DEV_MULTISIG_ACTIVATION_HEIGHT: BlockHeight = 0;

// ---------------------------------------------------------------------------
// Genesis mint conditions
// ---------------------------------------------------------------------------

// These are this deployment's minter keys, not those of any earlier network.

/// Standard network genesis minters: a 2-of-3 multi-signature.
pub const STANDARD_GENESIS_MINT_UNLOCK_HASHES: [&str; 3] = [
    "013f6776399171c1b8952d124b592532a0c16eae26746336c51e34c791933ce978f6b897d4423d",
    "0121ed1a920502f0648d9f97e8bb0a342dc79d9e96c85d8793bd6ca354d12dcf9b676739e508e9",
    "01f67faeccc5ad63b6065714aac13913688679e46317886345226264de709c1efca6180bd7347e",
];
pub const STANDARD_GENESIS_MINT_MIN_SIGNATURES: u64 = 2;

/// Test network genesis minters: a 2-of-3 multi-signature.
pub const TEST_GENESIS_MINT_UNLOCK_HASHES: [&str; 3] = [
    "01af7118aa31b92e5054145feb0d2d95b6679b6179990962b449e4d860ccbcfa9972535aeffa92",
    "015b1cf9bdf403ec60a150c7eee827ca1926d8adb097e79fec53fca623bbfab6b9b5a8acc50f45",
    "0104d758c233c1c94f63cf6db3deeaf67cd84dd16a8401d1f4add4119c91833a0903792f0c8fdb",
];
pub const TEST_GENESIS_MINT_MIN_SIGNATURES: u64 = 2;

/// Devnet genesis minter: a single key.
///
/// The seed is public on purpose (`sha256("coinmint devnet minter key")`,
/// see [`DEV_GENESIS_MINT_SEED_HEX`]). Anyone can mint on devnet.
pub const DEV_GENESIS_MINT_UNLOCK_HASH: &str =
    "01760c8e399d29db362fc150b5367f215124bbb17dd4978e771edf0fd16f098e5c67a9e4e2ce1a";

/// Ed25519 seed behind [`DEV_GENESIS_MINT_UNLOCK_HASH`].
pub const DEV_GENESIS_MINT_SEED_HEX: &str =
    "81be556309aad969cc3cd49d75e66a8d639a27b76f345e3f93d5b5ec178060e9";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Configuration failures. Raised before any transaction is processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown network profile {0:?} (expected standard, testnet or devnet)")]
    UnknownProfile(String),

    #[error("{profile}: invalid genesis mint unlock hash {value:?}: {source}")]
    InvalidGenesisUnlockHash {
        profile: NetworkProfile,
        value: String,
        #[source]
        source: UnlockHashError,
    },

    #[error("{profile}: genesis mint condition is malformed: {source}")]
    InvalidGenesisCondition {
        profile: NetworkProfile,
        #[source]
        source: ConditionError,
    },
}

// ---------------------------------------------------------------------------
// Network profiles
// ---------------------------------------------------------------------------

/// Which network a process runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkProfile {
    Standard,
    Test,
    Dev,
}

impl NetworkProfile {
    pub const ALL: [NetworkProfile; 3] = [Self::Standard, Self::Test, Self::Dev];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Test => "testnet",
            Self::Dev => "devnet",
        }
    }
}

impl fmt::Display for NetworkProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NetworkProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "testnet" => Ok(Self::Test),
            "devnet" => Ok(Self::Dev),
            other => Err(ConfigError::UnknownProfile(other.to_string())),
        }
    }
}

/// Every per-network parameter, resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub profile: NetworkProfile,
    pub block_frequency: u64,
    pub fee_grace_height: BlockHeight,
    pub multisig_activation_height: BlockHeight,
    pub minimum_miner_fee: Currency,
    pub block_size_limit: usize,
    pub arbitrary_data_size_limit: usize,
    pub genesis_mint_condition: UnlockCondition,
}

impl NetworkConfig {
    /// Resolves the parameters of `profile`, parsing its genesis constants.
    pub fn for_profile(profile: NetworkProfile) -> Result<Self, ConfigError> {
        let (block_frequency, fee_grace_height, multisig_activation_height, minimum_miner_fee) =
            match profile {
                NetworkProfile::Standard => (
                    STANDARD_BLOCK_FREQUENCY,
                    STANDARD_FEE_GRACE_HEIGHT,
                    STANDARD_MULTISIG_ACTIVATION_HEIGHT,
                    STANDARD_MINIMUM_MINER_FEE,
                ),
                NetworkProfile::Test => (
                    TEST_BLOCK_FREQUENCY,
                    TEST_FEE_GRACE_HEIGHT,
                    TEST_MULTISIG_ACTIVATION_HEIGHT,
                    TEST_MINIMUM_MINER_FEE,
                ),
                NetworkProfile::Dev => (
                    DEV_BLOCK_FREQUENCY,
                    DEV_FEE_GRACE_HEIGHT,
                    DEV_MULTISIG_ACTIVATION_HEIGHT,
                    DEV_MINIMUM_MINER_FEE,
                ),
            };
        Ok(Self {
            profile,
            block_frequency,
            fee_grace_height,
            multisig_activation_height,
            minimum_miner_fee,
            block_size_limit: BLOCK_SIZE_LIMIT,
            arbitrary_data_size_limit: ARBITRARY_DATA_SIZE_LIMIT,
            genesis_mint_condition: genesis_mint_condition(profile)?,
        })
    }

    /// The limits a validator applies to every transaction.
    pub fn validation_constants(&self) -> ValidationConstants {
        ValidationConstants {
            block_size_limit: self.block_size_limit,
            arbitrary_data_size_limit: self.arbitrary_data_size_limit,
            minimum_miner_fee: self.minimum_miner_fee,
            multisig_activation_height: self.multisig_activation_height,
        }
    }
}

fn parse_unlock_hash(profile: NetworkProfile, value: &str) -> Result<UnlockHash, ConfigError> {
    value
        .parse()
        .map_err(|source| ConfigError::InvalidGenesisUnlockHash {
            profile,
            value: value.to_string(),
            source,
        })
}

/// Builds and sanity-checks the genesis mint condition of `profile`.
///
/// The condition is checked as if multi-signature were already active:
/// genesis predates every activation height, but a malformed threshold or
/// key list is still a configuration bug.
fn genesis_mint_condition(profile: NetworkProfile) -> Result<UnlockCondition, ConfigError> {
    let condition = match profile {
        NetworkProfile::Standard | NetworkProfile::Test => {
            let (hashes, min_signatures) = if profile == NetworkProfile::Standard {
                (&STANDARD_GENESIS_MINT_UNLOCK_HASHES, STANDARD_GENESIS_MINT_MIN_SIGNATURES)
            } else {
                (&TEST_GENESIS_MINT_UNLOCK_HASHES, TEST_GENESIS_MINT_MIN_SIGNATURES)
            };
            let unlock_hashes = hashes
                .iter()
                .map(|value| parse_unlock_hash(profile, value))
                .collect::<Result<Vec<_>, _>>()?;
            UnlockCondition::multi_signature(unlock_hashes, min_signatures)
        }
        NetworkProfile::Dev => {
            UnlockCondition::UnlockHash(parse_unlock_hash(profile, DEV_GENESIS_MINT_UNLOCK_HASH)?)
        }
    };
    condition
        .is_standard(&StandardContext {
            block_height: 0,
            multisig_activation_height: 0,
        })
        .map_err(|source| ConfigError::InvalidGenesisCondition { profile, source })?;
    Ok(condition)
}
