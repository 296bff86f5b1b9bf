//! # CLI Interface
//!
//! Command-line structure for `coinmint`, via `clap` derive. Transactions
//! travel as JSON envelopes: read from a file argument or stdin, written to
//! stdout.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use coinmint_protocol::config::NetworkProfile;

use crate::logging::LogFormat;

/// Coin creation and minter definition transactions, by hand.
///
/// Drafts mint transactions, signs their mint fulfillment, validates them
/// against a network profile and prints their ids.
#[derive(Parser, Debug)]
#[command(
    name = "coinmint",
    about = "Draft, sign and validate coinmint transactions",
    version,
    propagate_version = true
)]
pub struct CoinmintCli {
    /// Network profile: standard, testnet or devnet.
    #[arg(long, short = 'n', global = true, env = "COINMINT_NETWORK", default_value = "devnet")]
    pub network: NetworkProfile,

    /// Log output format on stderr.
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Draft an unsigned coin creation transaction.
    CoinCreation(CoinCreationArgs),
    /// Draft an unsigned minter definition transaction.
    MinterDefinition(MinterDefinitionArgs),
    /// Add signatures to a transaction's mint fulfillment.
    Sign(SignArgs),
    /// Validate a transaction as if it were in a block (or the pool).
    Validate(ValidateArgs),
    /// Print a transaction's id.
    Id(InputArgs),
    /// Print version information and exit.
    Version,
}

/// Fields shared by both drafting commands.
#[derive(Args, Debug)]
pub struct DraftArgs {
    /// Stored as the transaction's arbitrary data.
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Miner fee in the smallest unit. Defaults to the network minimum.
    #[arg(long)]
    pub fee: Option<u64>,
}

/// Arguments for `coin-creation`.
#[derive(Args, Debug)]
pub struct CoinCreationArgs {
    /// Alternating condition and amount: `<CONDITION> <AMOUNT> [...]`.
    ///
    /// A condition is an unlock hash string or a JSON condition document.
    #[arg(required = true, num_args = 2.., value_name = "CONDITION AMOUNT")]
    pub outputs: Vec<String>,

    #[command(flatten)]
    pub draft: DraftArgs,
}

/// Arguments for `minter-definition`.
#[derive(Args, Debug)]
pub struct MinterDefinitionArgs {
    /// The new mint condition: an unlock hash string or a JSON condition.
    pub condition: String,

    #[command(flatten)]
    pub draft: DraftArgs,
}

/// Where a transaction is read from.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// JSON transaction file. Reads stdin when omitted or `-`.
    pub file: Option<PathBuf>,
}

/// The mint condition a command checks against.
#[derive(Args, Debug)]
pub struct MintArgs {
    /// Mint condition in force. Defaults to the network's genesis condition.
    #[arg(long)]
    pub mint_condition: Option<String>,

    /// Height of the block the transaction goes into.
    #[arg(long, default_value_t = 1)]
    pub height: u64,
}

/// Arguments for `sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Hex Ed25519 seed. Repeat for each co-signer.
    #[arg(long = "seed", required = true, env = "COINMINT_SEED", value_delimiter = ',')]
    pub seeds: Vec<String>,

    #[command(flatten)]
    pub mint: MintArgs,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub mint: MintArgs,

    /// Block timestamp in Unix seconds.
    #[arg(long, default_value_t = 0)]
    pub time: u64,

    /// Validate as part of a confirmed block rather than for the pool.
    #[arg(long)]
    pub confirmed: bool,
}
