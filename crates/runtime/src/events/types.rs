//! Event types for different topics.

use fleet_core::{Address, FleetEvent};
use serde::{Deserialize, Serialize};

use crate::ledger::{TxHash, TxStatus};

/// Events about transaction inclusion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionEvent {
    /// A transaction was included in a block (successfully or reverted)
    Included {
        tx_hash: TxHash,
        block_number: u64,
        from: Address,
        method: String,
        status: TxStatus,
    },

    /// A transaction was refused before inclusion
    Rejected { tx_hash: TxHash, error: String },
}

/// Event emitted by a registry contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub contract: Address,
    pub block_number: u64,
    pub tx_hash: TxHash,
    pub event: FleetEvent,
}

/// A registry was deployed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentEvent {
    pub contract_name: String,
    pub address: Address,
    pub deployer: Address,
    pub block_number: u64,
}
