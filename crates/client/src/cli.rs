//! Command line definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use client_blockchain_core::Address;
use client_bootstrap::ClientConfig;

/// Cipherverse fleet: mint an encrypted spaceship and test it in battle
#[derive(Parser, Debug)]
#[command(name = "fleet")]
#[command(about = "Cipherverse fleet tasks on the local ledger", long_about = None)]
#[command(version)]
pub struct Cli {
    /// CipherverseFleet contract address (defaults to the recorded deployment)
    #[arg(long, global = true, value_parser = parse_address)]
    pub address: Option<Address>,

    /// Data directory for ledger snapshots, deployments and logs
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Deployment network name
    #[arg(long, global = true)]
    pub network: Option<String>,

    /// Dev account index used as the pilot
    #[arg(long, global = true)]
    pub account: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deploy CipherverseFleet (reuses an existing deployment)
    Deploy {
        /// Deploy a fresh instance even if one is recorded
        #[arg(long)]
        force: bool,
    },

    /// Print the CipherverseFleet address
    Address,

    /// Mint a spaceship for the pilot
    MintShip,

    /// Decrypt the pilot's spaceship attack power
    DecryptAttack,

    /// Launch an attack against an encrypted defense value
    LaunchAttack {
        /// The defense value to encrypt
        #[arg(long, allow_hyphen_values = true)]
        defense: String,
    },

    /// Show the pilot panel
    Status {
        /// Decrypt attack power and the last attack result
        #[arg(long)]
        decrypt: bool,
    },
}

impl Cli {
    /// Applies command line overrides on top of environment configuration.
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(network) = &self.network {
            config.network = network.clone();
        }
        if let Some(account) = self.account {
            config.account_index = account;
            config.private_key = None;
        }
    }
}

fn parse_address(value: &str) -> Result<Address, String> {
    value.parse().map_err(|e| format!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "fleet",
            "launch-attack",
            "--defense",
            "90",
            "--network",
            "sepolia",
            "--account",
            "2",
        ])
        .unwrap();

        assert!(matches!(cli.command, Command::LaunchAttack { ref defense } if defense == "90"));

        let mut config = ClientConfig {
            private_key: Some("11".repeat(32)),
            ..ClientConfig::default()
        };
        cli.apply(&mut config);
        assert_eq!(config.network, "sepolia");
        assert_eq!(config.account_index, 2);
        assert!(config.private_key.is_none());
    }

    #[test]
    fn negative_defense_reaches_validation() {
        let cli = Cli::try_parse_from(["fleet", "launch-attack", "--defense", "-5"]).unwrap();
        assert!(matches!(cli.command, Command::LaunchAttack { ref defense } if defense == "-5"));
    }

    #[test]
    fn malformed_address_is_rejected() {
        assert!(Cli::try_parse_from(["fleet", "address", "--address", "0x1234"]).is_err());
    }
}
