//! In-memory LedgerRepository implementation for tests and ephemeral runs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::ledger::Ledger;
use crate::repository::{LedgerRepository, RepositoryError, Result};

/// In-memory implementation of LedgerRepository.
#[derive(Default)]
pub struct InMemoryLedgerRepo {
    snapshots: RwLock<BTreeMap<u64, Ledger>>,
}

impl InMemoryLedgerRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerRepository for InMemoryLedgerRepo {
    fn save(&self, block: u64, ledger: &Ledger) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.insert(block, ledger.clone());
        Ok(())
    }

    fn load(&self, block: u64) -> Result<Option<Ledger>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(snapshots.get(&block).cloned())
    }

    fn exists(&self, block: u64) -> bool {
        self.snapshots
            .read()
            .map(|snapshots| snapshots.contains_key(&block))
            .unwrap_or(false)
    }

    fn delete(&self, block: u64) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.remove(&block);
        Ok(())
    }

    fn list_blocks(&self) -> Result<Vec<u64>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(snapshots.keys().copied().collect())
    }
}
