//! File-based LedgerRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::ledger::Ledger;
use crate::repository::{LedgerRepository, RepositoryError, Result};

/// File-based implementation of LedgerRepository.
///
/// Stores ledger snapshots as individual bincode files indexed by block.
///
/// # File Format
///
/// Snapshots are stored as `ledger_{block}.bin` in bincode format. Writes go
/// to a temp file first and are renamed into place, so a crash never leaves a
/// half-written snapshot under the final name.
pub struct FileLedgerRepository {
    base_dir: PathBuf,
}

impl FileLedgerRepository {
    /// Create a new file-based ledger repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn snapshot_path(&self, block: u64) -> PathBuf {
        self.base_dir.join(format!("ledger_{}.bin", block))
    }
}

impl LedgerRepository for FileLedgerRepository {
    fn save(&self, block: u64, ledger: &Ledger) -> Result<()> {
        let path = self.snapshot_path(block);
        let temp_path = path.with_extension("bin.tmp");

        let bytes = bincode::serialize(ledger)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved ledger[{}] to {}", block, path.display());

        Ok(())
    }

    fn load(&self, block: u64) -> Result<Option<Ledger>> {
        let path = self.snapshot_path(block);

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        let ledger: Ledger = bincode::deserialize(&bytes)
            .map_err(|e| RepositoryError::CorruptedData(format!("{}: {e}", path.display())))?;

        if ledger.block_number() != block {
            return Err(RepositoryError::CorruptedData(format!(
                "{} holds block {}",
                path.display(),
                ledger.block_number()
            )));
        }

        tracing::debug!("Loaded ledger[{}] from {}", block, path.display());

        Ok(Some(ledger))
    }

    fn exists(&self, block: u64) -> bool {
        self.snapshot_path(block).exists()
    }

    fn delete(&self, block: u64) -> Result<()> {
        let path = self.snapshot_path(block);

        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!("Deleted ledger[{}]", block);
        }

        Ok(())
    }

    fn list_blocks(&self) -> Result<Vec<u64>> {
        let mut blocks = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();

            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(block_str) = filename
                    .strip_prefix("ledger_")
                    .and_then(|s| s.strip_suffix(".bin"))
                && let Ok(block) = block_str.parse::<u64>()
            {
                blocks.push(block);
            }
        }

        blocks.sort_unstable();
        Ok(blocks)
    }
}
