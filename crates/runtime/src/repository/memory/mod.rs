//! In-memory repository implementations.

mod deployment;
mod ledger;

pub use deployment::InMemoryDeploymentRepo;
pub use ledger::InMemoryLedgerRepo;
