//! Repository layer for ledger data
//!
//! - Ledger snapshots (resume a local chain across runs)
//! - Deployment records (find a contract by name on a network)

mod error;
mod file;
mod memory;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use file::{FileDeploymentRepository, FileLedgerRepository};
pub use memory::{InMemoryDeploymentRepo, InMemoryLedgerRepo};
pub use traits::{DeploymentRepository, LedgerRepository};
pub use types::DeploymentRecord;
