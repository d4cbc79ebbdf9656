//! Records persisted next to ledger snapshots.

use chrono::{DateTime, Utc};
use fleet_core::Address;
use serde::{Deserialize, Serialize};

use crate::ledger::TxHash;

/// Where a named contract lives on a network.
///
/// Stored as `deployments/<network>/<contract_name>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub contract_name: String,
    pub address: Address,
    pub deployer: Address,
    pub block_number: u64,
    pub tx_hash: TxHash,
    pub deployed_at: DateTime<Utc>,
}
