//! Repository contracts for saving and loading ledger data.

use crate::ledger::Ledger;

use super::error::Result;
use super::types::DeploymentRecord;

/// Repository for ledger snapshots indexed by block number.
pub trait LedgerRepository: Send + Sync {
    /// Save the ledger as of `block`
    fn save(&self, block: u64, ledger: &Ledger) -> Result<()>;

    /// Load the ledger as of `block`
    fn load(&self, block: u64) -> Result<Option<Ledger>>;

    /// Check if a snapshot exists
    fn exists(&self, block: u64) -> bool;

    /// Delete a snapshot
    fn delete(&self, block: u64) -> Result<()>;

    /// List all stored block numbers, ascending
    fn list_blocks(&self) -> Result<Vec<u64>>;

    /// Load the most recent snapshot, if any
    fn load_latest(&self) -> Result<Option<Ledger>> {
        match self.list_blocks()?.last() {
            Some(&block) => self.load(block),
            None => Ok(None),
        }
    }

    /// Delete all but the newest `keep` snapshots
    ///
    /// Returns the number of deleted snapshots.
    fn prune(&self, keep: usize) -> Result<usize> {
        let blocks = self.list_blocks()?;
        let excess = blocks.len().saturating_sub(keep);
        for block in &blocks[..excess] {
            self.delete(*block)?;
        }
        Ok(excess)
    }
}

/// Repository for deployment records, grouped by network
pub trait DeploymentRepository: Send + Sync {
    fn save(&self, network: &str, record: &DeploymentRecord) -> Result<()>;

    fn load(&self, network: &str, contract_name: &str) -> Result<Option<DeploymentRecord>>;

    fn list(&self, network: &str) -> Result<Vec<DeploymentRecord>>;
}
