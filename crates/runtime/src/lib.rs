//! Local ledger runtime for fleet registries.
//!
//! This crate wires the registry rules and the mock coprocessor into a
//! single-writer chain. Consumers embed [`Runtime`] to deploy registries,
//! submit signed transactions, read committed state and subscribe to events
//! through [`LedgerHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`ledger`] is the chain state and its transaction rules
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`repository`] persists ledger snapshots and deployment records
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod ledger;
pub mod repository;
pub mod runtime;

mod workers;

pub use api::{LedgerHandle, PendingTransaction, Result, RuntimeError};
pub use events::{
    ContractEvent, DeploymentEvent, Event, EventBus, Topic, TransactionEvent,
};
pub use ledger::{
    ContractAccount, FleetQuery, Ledger, LedgerError, QueryResponse, Receipt, RevertReason,
    SignedTransaction, Transaction, TxHash, TxPayload, TxStatus,
};
pub use repository::{
    DeploymentRecord, DeploymentRepository, FileDeploymentRepository, FileLedgerRepository,
    InMemoryDeploymentRepo, InMemoryLedgerRepo, LedgerRepository, RepositoryError,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
