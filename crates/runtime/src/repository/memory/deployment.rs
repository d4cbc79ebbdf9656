//! In-memory DeploymentRepository implementation.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::repository::{DeploymentRecord, DeploymentRepository, RepositoryError, Result};

/// Deployment records keyed by `(network, contract_name)`.
#[derive(Default)]
pub struct InMemoryDeploymentRepo {
    records: RwLock<BTreeMap<(String, String), DeploymentRecord>>,
}

impl InMemoryDeploymentRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeploymentRepository for InMemoryDeploymentRepo {
    fn save(&self, network: &str, record: &DeploymentRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        records.insert(
            (network.to_string(), record.contract_name.clone()),
            record.clone(),
        );
        Ok(())
    }

    fn load(&self, network: &str, contract_name: &str) -> Result<Option<DeploymentRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(records
            .get(&(network.to_string(), contract_name.to_string()))
            .cloned())
    }

    fn list(&self, network: &str) -> Result<Vec<DeploymentRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(records
            .iter()
            .filter(|((net, _), _)| net == network)
            .map(|(_, record)| record.clone())
            .collect())
    }
}
