//! Cloneable façade for talking to the ledger.
//!
//! [`LedgerHandle`] hides channel plumbing. Writes are queued to the ledger
//! worker and applied one at a time; reads borrow the latest committed
//! ledger without going through the worker, so any number of observers can
//! read concurrently.
use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use fhe::{ClearValue, DecryptionService, UserDecryptRequest};
use fleet_core::{Address, Handle};

use super::errors::{Result, RuntimeError};
use crate::events::{ContractEvent, Event, EventBus, Topic};
use crate::ledger::{
    ContractAccount, FleetQuery, Ledger, QueryResponse, Receipt, SignedTransaction, TxHash,
};
use crate::workers::Command;

/// A submitted transaction whose receipt has not been awaited yet.
#[derive(Debug)]
pub struct PendingTransaction {
    hash: TxHash,
    reply_rx: oneshot::Receiver<Result<Receipt>>,
}

impl PendingTransaction {
    pub fn hash(&self) -> TxHash {
        self.hash
    }

    /// Waits for the transaction to be included.
    ///
    /// There is no built-in timeout; wrap in `tokio::time::timeout` if needed.
    pub async fn wait(self) -> Result<Receipt> {
        self.reply_rx
            .await
            .map_err(RuntimeError::ReplyChannelClosed)?
    }
}

/// Client-facing handle to interact with the ledger
#[derive(Clone)]
pub struct LedgerHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    ledger_rx: watch::Receiver<Ledger>,
}

impl LedgerHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        ledger_rx: watch::Receiver<Ledger>,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            ledger_rx,
        }
    }

    /// Queue a signed transaction for inclusion
    pub async fn submit(&self, transaction: SignedTransaction) -> Result<PendingTransaction> {
        let hash = transaction.hash(self.chain_id());
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Submit {
                transaction,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        Ok(PendingTransaction { hash, reply_rx })
    }

    pub fn chain_id(&self) -> u64 {
        self.ledger_rx.borrow().chain_id()
    }

    pub fn block_number(&self) -> u64 {
        self.ledger_rx.borrow().block_number()
    }

    pub fn nonce(&self, account: &Address) -> u64 {
        self.ledger_rx.borrow().nonce(account)
    }

    /// Call a read-only registry method
    pub fn query(&self, contract: &Address, query: FleetQuery) -> Result<QueryResponse> {
        Ok(self.ledger_rx.borrow().query(contract, &query)?)
    }

    pub fn receipt(&self, hash: &TxHash) -> Option<Receipt> {
        self.ledger_rx.borrow().receipt(hash).cloned()
    }

    pub fn contract(&self, address: &Address) -> Option<ContractAccount> {
        self.ledger_rx.borrow().contract(address).cloned()
    }

    /// Registry events recorded for `contract`, oldest first
    ///
    /// Lets late subscribers rebuild what [`Topic::Contracts`] published
    /// before they connected, including blocks from earlier runs.
    pub fn contract_events(&self, contract: &Address) -> Vec<ContractEvent> {
        let ledger = self.ledger_rx.borrow();
        let mut receipts: Vec<&Receipt> = ledger
            .receipts()
            .filter(|receipt| receipt.to == Some(*contract))
            .collect();
        receipts.sort_by_key(|receipt| receipt.block_number);

        receipts
            .into_iter()
            .flat_map(|receipt| {
                receipt.events.iter().map(move |event| ContractEvent {
                    contract: *contract,
                    block_number: receipt.block_number,
                    tx_hash: receipt.tx_hash,
                    event: event.clone(),
                })
            })
            .collect()
    }

    /// Forward a signed decryption request to the coprocessor
    pub fn user_decrypt(&self, request: &UserDecryptRequest) -> Result<BTreeMap<Handle, ClearValue>> {
        let ledger = self.ledger_rx.borrow();
        Ok(ledger.coprocessor().user_decrypt(request, Utc::now())?)
    }

    /// Persist the current ledger now, returning the saved block number
    pub async fn checkpoint(&self) -> Result<u64> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Checkpoint { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Transactions` - Inclusion and rejection of transactions
    /// - `Topic::Contracts` - `ShipMinted` / `AttackLaunched` events
    /// - `Topic::Deployments` - New registries
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
