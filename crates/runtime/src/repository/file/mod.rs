//! File-backed repository implementations.

mod deployment;
mod ledger;

pub use deployment::FileDeploymentRepository;
pub use ledger::FileLedgerRepository;
