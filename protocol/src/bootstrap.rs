//! Once-per-process network setup.
//!
//! The host calls [`bootstrap`] with its profile before touching any
//! transaction and keeps the returned [`Network`] for the life of the
//! process. Nothing here is global.

use std::sync::Arc;
use tracing::info;

use crate::config::{ConfigError, NetworkConfig, NetworkProfile};
use crate::mint::MintConditionStore;
use crate::transaction::envelope::Transaction;
use crate::transaction::error::TransactionError;
use crate::transaction::registry::TransactionRegistry;
use crate::transaction::validation::{ValidationConstants, ValidationContext};

/// Everything a host needs for one network.
#[derive(Debug)]
pub struct Network {
    pub config: NetworkConfig,
    pub registry: TransactionRegistry,
    /// Shared with the consensus-set subscriber that applies blocks.
    pub mint_conditions: Arc<MintConditionStore>,
}

impl Network {
    pub fn constants(&self) -> ValidationConstants {
        self.config.validation_constants()
    }

    /// Validates `tx` with this network's limits and mint history.
    pub fn validate(&self, tx: &Transaction, ctx: &ValidationContext) -> Result<(), TransactionError> {
        self.registry
            .validate(tx, ctx, &self.constants(), self.mint_conditions.as_ref())
    }
}

/// Resolves `profile`, registers every transaction kind and seeds the mint
/// authority with the genesis condition.
///
/// Fails with [`ConfigError`] when a genesis constant does not parse.
pub fn bootstrap(profile: NetworkProfile) -> Result<Network, ConfigError> {
    let config = NetworkConfig::for_profile(profile)?;
    let registry = TransactionRegistry::for_network(&config);
    let mint_conditions = Arc::new(MintConditionStore::new(config.genesis_mint_condition.clone()));
    info!(
        network = %profile,
        versions = ?registry.versions(),
        fee_grace_height = config.fee_grace_height,
        genesis_mint = %config.genesis_mint_condition.unlock_hash(),
        "network bootstrapped"
    );
    Ok(Network {
        config,
        registry,
        mint_conditions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mint::MintConditionSource;

    #[test]
    fn every_profile_bootstraps() {
        for profile in NetworkProfile::ALL {
            let network = bootstrap(profile).unwrap();
            assert_eq!(network.config.profile, profile);
            assert_eq!(network.registry.versions().len(), 4);
            assert_eq!(network.mint_conditions.tip(), 0);
            assert_eq!(
                network.mint_conditions.mint_condition_at(1).unwrap(),
                network.config.genesis_mint_condition
            );
        }
    }

    #[test]
    fn constants_follow_config() {
        let network = bootstrap(NetworkProfile::Standard).unwrap();
        let constants = network.constants();
        assert_eq!(constants.minimum_miner_fee, network.config.minimum_miner_fee);
        assert_eq!(constants.multisig_activation_height, 42_000);
    }
}
