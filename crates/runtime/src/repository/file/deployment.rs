//! JSON deployment records on disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::repository::{DeploymentRecord, DeploymentRepository, Result};

/// Stores deployment records as `<base>/<network>/<contract_name>.json`.
pub struct FileDeploymentRepository {
    base_dir: PathBuf,
}

impl FileDeploymentRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn network_dir(&self, network: &str) -> PathBuf {
        self.base_dir.join(network)
    }

    fn record_path(&self, network: &str, contract_name: &str) -> PathBuf {
        self.network_dir(network)
            .join(format!("{}.json", contract_name))
    }
}

impl DeploymentRepository for FileDeploymentRepository {
    fn save(&self, network: &str, record: &DeploymentRecord) -> Result<()> {
        fs::create_dir_all(self.network_dir(network))?;

        let path = self.record_path(network, &record.contract_name);
        let temp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(record)?;
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved deployment {} to {}", record.contract_name, path.display());
        Ok(())
    }

    fn load(&self, network: &str, contract_name: &str) -> Result<Option<DeploymentRecord>> {
        let path = self.record_path(network, contract_name);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn list(&self, network: &str) -> Result<Vec<DeploymentRecord>> {
        let dir = self.network_dir(network);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                let json = fs::read_to_string(&path)?;
                records.push(serde_json::from_str(&json)?);
            }
        }

        records.sort_by(|a: &DeploymentRecord, b| a.contract_name.cmp(&b.contract_name));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use fleet_core::Address;

    use super::*;
    use crate::ledger::TxHash;

    fn record() -> DeploymentRecord {
        DeploymentRecord {
            contract_name: "CipherverseFleet".to_string(),
            address: Address([0xAA; 20]),
            deployer: Address([0xBB; 20]),
            block_number: 1,
            tx_hash: TxHash([0xCC; 32]),
            deployed_at: Utc::now(),
        }
    }

    #[test]
    fn records_are_scoped_by_network() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileDeploymentRepository::new(dir.path()).unwrap();
        let record = record();

        repo.save("localhost", &record).unwrap();

        assert_eq!(
            repo.load("localhost", "CipherverseFleet").unwrap(),
            Some(record.clone())
        );
        assert_eq!(repo.load("sepolia", "CipherverseFleet").unwrap(), None);
        assert_eq!(repo.list("localhost").unwrap(), vec![record]);
        assert!(repo.list("sepolia").unwrap().is_empty());
    }

    #[test]
    fn record_is_readable_json() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileDeploymentRepository::new(dir.path()).unwrap();
        repo.save("localhost", &record()).unwrap();

        let json = fs::read_to_string(dir.path().join("localhost/CipherverseFleet.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["address"],
            format!("0x{}", hex::encode([0xAA; 20]))
        );
        assert_eq!(value["tx_hash"], format!("0x{}", hex::encode([0xCC; 32])));
    }
}
