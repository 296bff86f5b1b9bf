// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # coinmint
//!
//! Entry point for the `coinmint` binary: a small host around the protocol
//! library for drafting and checking mint transactions by hand.
//!
//! - `coin-creation`     — draft new coins for the given outputs
//! - `minter-definition` — draft a hand-over of the mint authority
//! - `sign`              — add mint signatures from one or more seeds
//! - `validate`          — run the full validation rules at a height
//! - `id`                — print the transaction id
//! - `version`           — print build and network information
//!
//! A typical devnet round trip:
//!
//! ```text
//! coinmint coin-creation 01… 100 | coinmint sign --seed 81be… | coinmint validate --confirmed
//! ```

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::Path;

use coinmint_protocol::bootstrap::{bootstrap, Network};
use coinmint_protocol::condition::{KeySigner, UnlockCondition, UnlockHash};
use coinmint_protocol::crypto::keys::Keypair;
use coinmint_protocol::mint::{MintConditionSource, MintStateError};
use coinmint_protocol::transaction::{
    CoinCreationTransaction, CoinOutput, Currency, MinterDefinitionTransaction, Transaction, ValidationContext,
};

use cli::{Commands, CoinmintCli};

fn main() -> Result<()> {
    let cli = CoinmintCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    let network = bootstrap(cli.network)
        .with_context(|| format!("failed to bootstrap network {}", cli.network))?;

    match cli.command {
        Commands::CoinCreation(args) => {
            let tx = draft_coin_creation(&network, &args)?;
            write_transaction(&network, &tx)
        }
        Commands::MinterDefinition(args) => {
            let tx = draft_minter_definition(&network, &args)?;
            write_transaction(&network, &tx)
        }
        Commands::Sign(args) => sign(&network, args),
        Commands::Validate(args) => validate(&network, args),
        Commands::Id(args) => {
            let tx = read_transaction(&network, args.file.as_deref())?;
            println!("{}", tx.id());
            Ok(())
        }
        Commands::Version => {
            print_version(&network);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Mint condition lookup
// ---------------------------------------------------------------------------

/// A single mint condition answered for every height.
///
/// The tool has no chain to follow, so the caller names the condition in
/// force (or takes the genesis one).
struct FixedMintCondition(UnlockCondition);

impl MintConditionSource for FixedMintCondition {
    fn mint_condition_at(&self, _height: u64) -> Result<UnlockCondition, MintStateError> {
        Ok(self.0.clone())
    }
}

fn mint_source(network: &Network, args: &cli::MintArgs) -> Result<FixedMintCondition> {
    let condition = match &args.mint_condition {
        Some(text) => parse_condition(text)?,
        None => network.config.genesis_mint_condition.clone(),
    };
    Ok(FixedMintCondition(condition))
}

/// An unlock hash string or a JSON condition document.
fn parse_condition(text: &str) -> Result<UnlockCondition> {
    let text = text.trim();
    if text.starts_with('{') {
        return serde_json::from_str(text).with_context(|| format!("invalid condition document {text}"));
    }
    let unlock_hash: UnlockHash = text
        .parse()
        .with_context(|| format!("invalid unlock hash {text:?}"))?;
    Ok(UnlockCondition::UnlockHash(unlock_hash))
}

// ---------------------------------------------------------------------------
// Drafting
// ---------------------------------------------------------------------------

fn fees(network: &Network, draft: &cli::DraftArgs) -> Vec<Currency> {
    let fee = draft
        .fee
        .map(Currency::new)
        .unwrap_or(network.config.minimum_miner_fee);
    vec![fee]
}

fn description(draft: &cli::DraftArgs) -> Vec<u8> {
    draft
        .description
        .as_deref()
        .map(|d| d.as_bytes().to_vec())
        .unwrap_or_default()
}

fn draft_coin_creation(network: &Network, args: &cli::CoinCreationArgs) -> Result<Transaction> {
    if args.outputs.len() % 2 != 0 {
        bail!("outputs come in <CONDITION> <AMOUNT> pairs, got {} values", args.outputs.len());
    }
    let outputs = args
        .outputs
        .chunks(2)
        .map(|pair| {
            let condition = parse_condition(&pair[0])?;
            let value: Currency = pair[1]
                .parse()
                .with_context(|| format!("invalid amount {:?}", pair[1]))?;
            Ok(CoinOutput::new(value, condition))
        })
        .collect::<Result<Vec<_>>>()?;
    let tx = CoinCreationTransaction::draft(outputs, fees(network, &args.draft), description(&args.draft));
    tracing::info!(outputs = tx.coin_outputs.len(), minted = ?tx.minted_value(), "coin creation drafted");
    Ok(tx.into())
}

fn draft_minter_definition(network: &Network, args: &cli::MinterDefinitionArgs) -> Result<Transaction> {
    let condition = parse_condition(&args.condition)?;
    let tx = MinterDefinitionTransaction::draft(condition, fees(network, &args.draft), description(&args.draft));
    tracing::info!(new_minter = %tx.mint_condition.unlock_hash(), "minter definition drafted");
    Ok(tx.into())
}

// ---------------------------------------------------------------------------
// Signing and validation
// ---------------------------------------------------------------------------

fn sign(network: &Network, args: cli::SignArgs) -> Result<()> {
    let mut tx = read_transaction(network, args.input.file.as_deref())?;
    let keys = args
        .seeds
        .iter()
        .map(|seed| Keypair::from_hex(seed.trim()).context("invalid seed"))
        .collect::<Result<Vec<_>>>()?;
    let signer = KeySigner::new(keys);
    let mint = mint_source(network, &args.mint)?;

    network
        .registry
        .sign_extension(&mut tx, &mint, args.mint.height, |fulfillment, condition, hasher| {
            signer.sign(fulfillment, condition, hasher)
        })
        .context("signing failed")?;
    tracing::info!(tx_id = %tx.id(), signers = signer.keys().len(), "transaction signed");
    write_transaction(network, &tx)
}

fn validate(network: &Network, args: cli::ValidateArgs) -> Result<()> {
    let tx = read_transaction(network, args.input.file.as_deref())?;
    let mint = mint_source(network, &args.mint)?;
    let ctx = if args.confirmed {
        ValidationContext::block(args.mint.height, args.time)
    } else {
        ValidationContext::pool(args.mint.height, args.time)
    };

    if let Err(err) = network
        .registry
        .validate(&tx, &ctx, &network.constants(), &mint)
    {
        let kind = err.kind();
        return Err(anyhow::Error::new(err).context(format!("transaction rejected: {kind}")));
    }
    println!("valid {}", tx.id());
    Ok(())
}

// ---------------------------------------------------------------------------
// I/O
// ---------------------------------------------------------------------------

fn read_transaction(network: &Network, file: Option<&Path>) -> Result<Transaction> {
    let text = match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    network
        .registry
        .decode_json(&text)
        .context("failed to decode transaction")
}

fn write_transaction(network: &Network, tx: &Transaction) -> Result<()> {
    let value = network.registry.encode_json(tx)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_version(network: &Network) {
    let versions: Vec<String> = network
        .registry
        .versions()
        .iter()
        .map(|v| v.to_string())
        .collect();
    println!("coinmint {}", env!("CARGO_PKG_VERSION"));
    println!("network:  {}", network.config.profile);
    println!("tx kinds: {}", versions.join(", "));
    println!("minter:   {}", network.config.genesis_mint_condition.unlock_hash());
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinmint_protocol::config::{NetworkProfile, DEV_GENESIS_MINT_SEED_HEX, DEV_GENESIS_MINT_UNLOCK_HASH};

    fn devnet() -> Network {
        bootstrap(NetworkProfile::Dev).unwrap()
    }

    fn draft_args(fee: Option<u64>) -> cli::DraftArgs {
        cli::DraftArgs {
            description: Some("first mint".to_string()),
            fee,
        }
    }

    #[test]
    fn conditions_parse_from_hash_or_json() {
        let from_hash = parse_condition(DEV_GENESIS_MINT_UNLOCK_HASH).unwrap();
        let json = serde_json::to_string(&from_hash).unwrap();
        assert_eq!(parse_condition(&json).unwrap(), from_hash);
        assert!(parse_condition("not-a-hash").is_err());
    }

    #[test]
    fn drafted_coin_creation_signs_and_validates() {
        let network = devnet();
        let args = cli::CoinCreationArgs {
            outputs: vec![DEV_GENESIS_MINT_UNLOCK_HASH.to_string(), "100".to_string()],
            draft: draft_args(None),
        };
        let mut tx = draft_coin_creation(&network, &args).unwrap();
        let mint = FixedMintCondition(network.config.genesis_mint_condition.clone());
        let signer = KeySigner::single(Keypair::from_hex(DEV_GENESIS_MINT_SEED_HEX).unwrap());
        network
            .registry
            .sign_extension(&mut tx, &mint, 1, |f, c, h| signer.sign(f, c, h))
            .unwrap();
        network
            .registry
            .validate(&tx, &ValidationContext::block(1, 0), &network.constants(), &mint)
            .unwrap();
    }

    #[test]
    fn odd_output_list_is_rejected() {
        let args = cli::CoinCreationArgs {
            outputs: vec![DEV_GENESIS_MINT_UNLOCK_HASH.to_string()],
            draft: draft_args(Some(1)),
        };
        assert!(draft_coin_creation(&devnet(), &args).is_err());
    }

    #[test]
    fn minter_definition_uses_given_fee() {
        let args = cli::MinterDefinitionArgs {
            condition: DEV_GENESIS_MINT_UNLOCK_HASH.to_string(),
            draft: draft_args(Some(42)),
        };
        let tx = draft_minter_definition(&devnet(), &args).unwrap();
        assert_eq!(tx.miner_fees(), &[Currency::new(42)]);
    }
}
