//! Client configuration structures and loaders.
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use client_blockchain_core::Wallet;
use fhe::DecryptionGrant;

/// Configuration required to bootstrap the local ledger and a pilot wallet.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Root for ledger snapshots, deployment records and logs.
    pub data_dir: PathBuf,
    /// Deployment namespace, e.g. `localhost`.
    pub network: String,
    /// Hex seed of the pilot key; a dev account is used when unset.
    pub private_key: Option<String>,
    pub account_index: u32,
    pub command_buffer: usize,
    pub event_buffer: usize,
    pub snapshot_retention: usize,
    pub checkpoint_interval: u64,
    pub grant_duration_days: u32,
    pub file_logs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let runtime = runtime::RuntimeConfig::default();
        Self {
            data_dir: default_data_dir(),
            network: "localhost".to_string(),
            private_key: None,
            account_index: 0,
            command_buffer: runtime.command_buffer_size,
            event_buffer: runtime.event_buffer_size,
            snapshot_retention: runtime.snapshot_retention,
            checkpoint_interval: runtime.checkpoint_interval,
            grant_duration_days: DecryptionGrant::DEFAULT_DURATION_DAYS,
            file_logs: true,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `FLEET_DATA_DIR` - Data directory (default: platform-specific)
    /// - `FLEET_NETWORK` - Deployment network name (default: localhost)
    /// - `PILOT_PRIVATE_KEY` - Hex ed25519 seed (default: dev account)
    /// - `FLEET_ACCOUNT_INDEX` - Dev account index (default: 0)
    /// - `FLEET_COMMAND_BUFFER` - Ledger command queue size (default: 32)
    /// - `FLEET_EVENT_BUFFER` - Event channel size (default: 100)
    /// - `FLEET_SNAPSHOT_RETENTION` - Ledger snapshots kept on disk (default: 16)
    /// - `FLEET_CHECKPOINT_INTERVAL` - Blocks between ledger snapshots (default: 1)
    /// - `FLEET_GRANT_DURATION_DAYS` - Decryption grant validity (default: 10, max: 365)
    /// - `FLEET_FILE_LOGS` - Write logs under the data directory (default: true)
    ///
    /// Tuning values fall back to their defaults when malformed. An account
    /// index that is not a `u32` is an error, since it would select a
    /// different pilot.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let parse = |key: &str| read(key).and_then(|value| value.trim().parse::<u64>().ok());
        let mut config = Self::default();

        if let Some(dir) = read("FLEET_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(network) = read("FLEET_NETWORK") {
            config.network = network.trim().to_string();
        }
        config.private_key = read("PILOT_PRIVATE_KEY");

        if let Some(index) = read("FLEET_ACCOUNT_INDEX") {
            let Ok(index) = index.trim().parse::<u32>() else {
                bail!(
                    "FLEET_ACCOUNT_INDEX must be an integer between 0 and {}, got {:?}",
                    u32::MAX,
                    index.trim()
                );
            };
            config.account_index = index;
        }
        if let Some(capacity) = parse("FLEET_COMMAND_BUFFER") {
            config.command_buffer = (capacity as usize).max(1);
        }
        if let Some(capacity) = parse("FLEET_EVENT_BUFFER") {
            config.event_buffer = (capacity as usize).max(1);
        }
        if let Some(keep) = parse("FLEET_SNAPSHOT_RETENTION") {
            config.snapshot_retention = (keep as usize).max(1);
        }
        if let Some(interval) = parse("FLEET_CHECKPOINT_INTERVAL") {
            config.checkpoint_interval = interval.max(1);
        }
        if let Some(days) = parse("FLEET_GRANT_DURATION_DAYS") {
            config.grant_duration_days =
                days.clamp(1, u64::from(DecryptionGrant::MAX_DURATION_DAYS)) as u32;
        }
        if let Some(enabled) = read("FLEET_FILE_LOGS").and_then(|value| parse_bool(&value)) {
            config.file_logs = enabled;
        }

        Ok(config)
    }

    pub fn ledger_dir(&self) -> PathBuf {
        self.data_dir.join("ledger").join(&self.network)
    }

    pub fn deployments_dir(&self) -> PathBuf {
        self.data_dir.join("deployments")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// The pilot wallet: `PILOT_PRIVATE_KEY` when set, else the dev account.
    pub fn wallet(&self) -> Result<Wallet> {
        match &self.private_key {
            Some(secret) => Wallet::from_hex(secret).context("PILOT_PRIVATE_KEY is not a valid key"),
            None => Ok(Wallet::dev_account(self.account_index)),
        }
    }

    pub fn runtime_config(&self) -> runtime::RuntimeConfig {
        runtime::RuntimeConfig {
            command_buffer_size: self.command_buffer,
            event_buffer_size: self.event_buffer,
            snapshot_retention: self.snapshot_retention,
            checkpoint_interval: self.checkpoint_interval,
            ..runtime::RuntimeConfig::default()
        }
    }
}

/// Platform data directory for the `fleet` project.
///
/// - macOS: `~/Library/Application Support/fleet`
/// - Linux: `~/.local/share/fleet` (or `$XDG_DATA_HOME/fleet`)
/// - Windows: `%APPDATA%\fleet`
/// - Fallback: `./fleet_data`
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "fleet")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./fleet_data"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
