//! Ledger worker that owns the authoritative [`Ledger`].
//!
//! Receives commands from [`LedgerHandle`](crate::LedgerHandle), includes
//! transactions one at a time, persists snapshots and publishes events to
//! the EventBus. The ledger lives inside the watch channel that readers
//! borrow from, so blocks are applied in place and readers never observe a
//! block that failed to persist.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::api::{Result, RuntimeError};
use crate::events::{ContractEvent, DeploymentEvent, Event, EventBus, TransactionEvent};
use crate::ledger::{Ledger, Receipt, SignedTransaction, TxPayload};
use crate::repository::{self, LedgerRepository};

/// Commands that can be sent to the ledger worker
pub enum Command {
    /// Include a signed transaction in the next block.
    Submit {
        transaction: SignedTransaction,
        reply: oneshot::Sender<Result<Receipt>>,
    },
    /// Persist the current ledger immediately.
    Checkpoint { reply: oneshot::Sender<Result<u64>> },
}

/// Where and how often the worker writes snapshots.
pub struct Persistence {
    pub repository: Option<Arc<dyn LedgerRepository>>,
    /// Snapshots kept on disk
    pub retention: usize,
    /// Blocks between snapshots
    pub interval: u64,
}

/// Background task that serializes every ledger write.
pub struct LedgerWorker {
    ledger: watch::Sender<Ledger>,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    persistence: Persistence,
    /// Committed blocks not yet in a snapshot
    unsaved_blocks: u64,
}

impl LedgerWorker {
    pub fn new(
        ledger: watch::Sender<Ledger>,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        persistence: Persistence,
    ) -> Self {
        {
            let ledger = ledger.borrow();
            info!(
                "LedgerWorker initialized at block {} with {} contract(s)",
                ledger.block_number(),
                ledger.contracts().count()
            );
        }

        Self {
            ledger,
            command_rx,
            event_bus,
            persistence,
            unsaved_blocks: 0,
        }
    }

    /// Main worker loop. Ends once every handle is dropped, writing a final
    /// snapshot when blocks are still unsaved.
    pub async fn run(mut self) -> Result<()> {
        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
        }

        let block = self.ledger.borrow().block_number();
        if self.unsaved_blocks > 0 {
            self.checkpoint().inspect_err(|err| {
                error!(
                    target: "runtime::ledger",
                    block,
                    "failed to persist final ledger snapshot: {err}"
                );
            })?;
        }
        debug!("LedgerWorker stopped at block {block}");
        Ok(())
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Submit { transaction, reply } => {
                let result = self.include(transaction);
                if reply.send(result).is_err() {
                    debug!("Submit reply channel closed (caller dropped)");
                }
            }
            Command::Checkpoint { reply } => {
                let result = self.checkpoint();
                if reply.send(result).is_err() {
                    debug!("Checkpoint reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn include(&mut self, transaction: SignedTransaction) -> Result<Receipt> {
        let save = self.unsaved_blocks + 1 >= self.persistence.interval.max(1);
        let persistence = &self.persistence;
        let mut outcome: Option<Result<Receipt>> = None;

        // Readers are held off while the block is applied and persisted; a
        // block is published only once it is committed.
        self.ledger.send_if_modified(|ledger| {
            let receipt = match ledger.apply(&transaction) {
                Ok(receipt) => receipt,
                Err(err) => {
                    outcome = Some(Err(err.into()));
                    return false;
                }
            };

            if save && let Err(err) = Self::persist(persistence, ledger) {
                error!(
                    target: "runtime::ledger",
                    block = receipt.block_number,
                    tx = %receipt.tx_hash,
                    "failed to persist ledger snapshot, block reverted: {err}"
                );
                ledger.revert_pending();
                outcome = Some(Err(RuntimeError::Repository(err)));
                return false;
            }

            ledger.commit();
            outcome = Some(Ok(receipt));
            true
        });

        let receipt = match outcome {
            Some(Ok(receipt)) => receipt,
            Some(Err(err)) => {
                if matches!(err, RuntimeError::Ledger(_)) {
                    warn!(target: "runtime::ledger", "rejected transaction: {err}");
                }
                self.event_bus
                    .publish(Event::Transaction(TransactionEvent::Rejected {
                        tx_hash: transaction.hash(self.ledger.borrow().chain_id()),
                        error: err.to_string(),
                    }));
                return Err(err);
            }
            None => unreachable!("send_if_modified runs its closure exactly once"),
        };

        self.unsaved_blocks = if save { 0 } else { self.unsaved_blocks + 1 };

        debug!(
            target: "runtime::ledger",
            tx = %receipt.tx_hash,
            block = receipt.block_number,
            status = receipt.status.code(),
            "included {}",
            transaction.transaction.method()
        );

        self.publish(&transaction, &receipt);

        Ok(receipt)
    }

    fn publish(&self, transaction: &SignedTransaction, receipt: &Receipt) {
        self.event_bus
            .publish(Event::Transaction(TransactionEvent::Included {
                tx_hash: receipt.tx_hash,
                block_number: receipt.block_number,
                from: receipt.from,
                method: transaction.transaction.method().to_string(),
                status: receipt.status,
            }));

        if let (TxPayload::Deploy { contract_name }, Some(address)) =
            (&transaction.transaction.payload, receipt.contract_address)
        {
            self.event_bus.publish(Event::Deployment(DeploymentEvent {
                contract_name: contract_name.clone(),
                address,
                deployer: receipt.from,
                block_number: receipt.block_number,
            }));
        }

        if let Some(contract) = receipt.to {
            for event in &receipt.events {
                self.event_bus.publish(Event::Contract(ContractEvent {
                    contract,
                    block_number: receipt.block_number,
                    tx_hash: receipt.tx_hash,
                    event: event.clone(),
                }));
            }
        }
    }

    /// Writes `ledger` at its current block and prunes old snapshots.
    ///
    /// Only the write can fail; once the snapshot is stored the block is
    /// durable, so a failed prune is logged and retried on the next write.
    fn persist(persistence: &Persistence, ledger: &Ledger) -> repository::Result<()> {
        let Some(repository) = &persistence.repository else {
            return Ok(());
        };

        repository.save(ledger.block_number(), ledger)?;
        match repository.prune(persistence.retention.max(1)) {
            Ok(0) => {}
            Ok(pruned) => debug!(target: "runtime::ledger", pruned, "pruned old ledger snapshots"),
            Err(err) => warn!(target: "runtime::ledger", "failed to prune ledger snapshots: {err}"),
        }
        Ok(())
    }

    fn checkpoint(&mut self) -> Result<u64> {
        let ledger = self.ledger.borrow();
        Self::persist(&self.persistence, &ledger)?;
        let block = ledger.block_number();
        drop(ledger);

        self.unsaved_blocks = 0;
        Ok(block)
    }
}
