//! High-level runtime orchestrator.
//!
//! The runtime owns the ledger worker, wires up command/event channels, and
//! exposes a builder-based API for clients to drive the local chain.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::api::{LedgerHandle, Result, RuntimeError};
use crate::events::EventBus;
use crate::ledger::Ledger;
use crate::repository::LedgerRepository;
use crate::workers::{Command, LedgerWorker, Persistence};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub chain_id: u64,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Number of ledger snapshots kept on disk
    pub snapshot_retention: usize,
    /// Write a snapshot every this many blocks. With `1` every block is
    /// durable before its receipt is returned; otherwise unsaved blocks are
    /// written at the next interval, on checkpoint and at shutdown.
    pub checkpoint_interval: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            chain_id: fhe::LOCAL_CHAIN_ID,
            event_buffer_size: 100,
            command_buffer_size: 32,
            snapshot_retention: 16,
            checkpoint_interval: 1,
        }
    }
}

/// Main runtime that hosts the local ledger
///
/// [`LedgerHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: LedgerHandle,
    worker_handle: JoinHandle<Result<()>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> LedgerHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully
    ///
    /// The worker drains queued commands and stops once every outstanding
    /// handle clone is dropped. Fails when the final snapshot cannot be
    /// written.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)?
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    ledger: Option<Ledger>,
    repository: Option<Arc<dyn LedgerRepository>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            ledger: None,
            repository: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Start from a given ledger instead of the stored or a fresh one
    pub fn initial_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Persist snapshots to (and resume from) this repository
    pub fn repository(mut self, repository: Arc<dyn LedgerRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Build the runtime
    pub async fn build(self) -> Result<Runtime> {
        let chain_id = self.config.chain_id;

        let ledger = match (self.ledger, &self.repository) {
            (Some(ledger), _) => ledger,
            (None, Some(repository)) => match repository.load_latest()? {
                Some(ledger) => {
                    tracing::info!("Resuming ledger at block {}", ledger.block_number());
                    ledger
                }
                None => Ledger::new(chain_id),
            },
            (None, None) => Ledger::new(chain_id),
        };

        if ledger.chain_id() != chain_id {
            return Err(RuntimeError::ChainMismatch {
                expected: chain_id,
                found: ledger.chain_id(),
            });
        }

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size.max(1));
        let (ledger_tx, ledger_rx) = watch::channel(ledger);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size.max(1));

        let handle = LedgerHandle::new(command_tx, event_bus.clone(), ledger_rx);

        let persistence = Persistence {
            repository: self.repository,
            retention: self.config.snapshot_retention,
            interval: self.config.checkpoint_interval,
        };
        let worker = LedgerWorker::new(ledger_tx, command_rx, event_bus, persistence);

        let worker_handle = tokio::spawn(worker.run());

        Ok(Runtime {
            handle,
            worker_handle,
        })
    }
}
