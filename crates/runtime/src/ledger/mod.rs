//! Local single-writer ledger hosting registry contracts.
//!
//! The [`Ledger`] is the whole chain state: accounts' nonces, deployed
//! registries, the encryption coprocessor and every receipt. It is a plain
//! value so the worker can share it with observers and persist it between
//! runs.
//!
//! Each included transaction gets its own block, mirroring an automining
//! development node. The newest block stays pending until [`Ledger::commit`]
//! or [`Ledger::revert_pending`]; the worker commits only once the block has
//! been persisted.

mod error;
mod query;
mod transaction;

pub use error::LedgerError;
pub use query::{FleetQuery, QueryResponse};
pub use transaction::{
    Receipt, RevertReason, SignedTransaction, Transaction, TxHash, TxPayload, TxStatus,
};

use std::collections::BTreeMap;

use fhe::MockCoprocessor;
use fleet_core::{Address, CallContext, FleetConfig, FleetEngine, FleetState};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const CREATE_DOMAIN: &[u8] = b"fleet.ledger.create.v1";

/// A deployed registry instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAccount {
    pub name: String,
    pub deployer: Address,
    pub deployed_at: u64,
    pub state: FleetState,
}

/// What it takes to undo the newest block.
#[derive(Debug, Clone)]
struct PendingBlock {
    tx_hash: TxHash,
    from: Address,
    previous_nonce: Option<u64>,
    deployed: Option<Address>,
    called: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    chain_id: u64,
    block_number: u64,
    nonces: BTreeMap<Address, u64>,
    contracts: BTreeMap<Address, ContractAccount>,
    fhe: MockCoprocessor,
    receipts: BTreeMap<TxHash, Receipt>,
    #[serde(skip)]
    pending: Option<PendingBlock>,
}

/// Equality compares chain state; a pending block counts as included.
impl PartialEq for Ledger {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id
            && self.block_number == other.block_number
            && self.nonces == other.nonces
            && self.contracts == other.contracts
            && self.fhe == other.fhe
            && self.receipts == other.receipts
    }
}

impl Eq for Ledger {}

impl Ledger {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            block_number: 0,
            nonces: BTreeMap::new(),
            contracts: BTreeMap::new(),
            fhe: MockCoprocessor::new(chain_id),
            receipts: BTreeMap::new(),
            pending: None,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// Number of transactions included from `account`.
    pub fn nonce(&self, account: &Address) -> u64 {
        self.nonces.get(account).copied().unwrap_or(0)
    }

    pub fn contract(&self, address: &Address) -> Option<&ContractAccount> {
        self.contracts.get(address)
    }

    pub fn contracts(&self) -> impl Iterator<Item = (&Address, &ContractAccount)> {
        self.contracts.iter()
    }

    pub fn coprocessor(&self) -> &MockCoprocessor {
        &self.fhe
    }

    pub fn receipt(&self, hash: &TxHash) -> Option<&Receipt> {
        self.receipts.get(hash)
    }

    /// Every receipt, in no particular order.
    pub fn receipts(&self) -> impl Iterator<Item = &Receipt> {
        self.receipts.values()
    }

    /// Address a deployment from `deployer` at `nonce` lands on.
    pub fn create_address(deployer: &Address, nonce: u64) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(CREATE_DOMAIN);
        hasher.update(deployer.as_bytes());
        hasher.update(nonce.to_be_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Address::new(bytes)
    }

    /// Whether the newest block is still pending.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Makes the pending block permanent.
    pub fn commit(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if let Some(contract) = pending.called.and_then(|to| self.contracts.get_mut(&to)) {
            contract.state.commit();
        }
        self.fhe.commit();
    }

    /// Drops the pending block, restoring the ledger to the previous one.
    pub fn revert_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        self.receipts.remove(&pending.tx_hash);
        match pending.previous_nonce {
            Some(nonce) => self.nonces.insert(pending.from, nonce),
            None => self.nonces.remove(&pending.from),
        };
        if let Some(address) = pending.deployed {
            self.contracts.remove(&address);
        }
        if let Some(contract) = pending.called.and_then(|to| self.contracts.get_mut(&to)) {
            contract.state.rollback();
        }
        self.fhe.rollback();
        self.block_number -= 1;
        tracing::debug!(block = self.block_number + 1, tx = %pending.tx_hash, "reverted pending block");
    }

    /// Includes a transaction in a new, pending block.
    ///
    /// A block still pending from the previous call is committed first.
    /// Returns an error, leaving the ledger untouched, when the transaction
    /// cannot be included at all. A registry revert is included and reported
    /// through the receipt status; the registry and coprocessor state are
    /// restored to what they were before the call.
    pub fn apply(&mut self, signed: &SignedTransaction) -> Result<Receipt, LedgerError> {
        self.commit();

        let tx_hash = signed.verify(self.chain_id)?;
        if self.receipts.contains_key(&tx_hash) {
            return Err(LedgerError::DuplicateTransaction(tx_hash));
        }

        let tx = &signed.transaction;
        if let TxPayload::Deploy { contract_name } = &tx.payload
            && contract_name != FleetConfig::DEFAULT_CONTRACT_NAME
        {
            return Err(LedgerError::UnsupportedContract(contract_name.clone()));
        }
        if let Some(to) = tx.to()
            && !self.contracts.contains_key(&to)
        {
            return Err(LedgerError::ContractNotFound(to));
        }

        let nonce = self.nonce(&tx.from);
        let block_number = self.block_number + 1;

        let receipt = match &tx.payload {
            TxPayload::Deploy { contract_name } => {
                let address = Self::create_address(&tx.from, nonce);
                self.contracts.insert(
                    address,
                    ContractAccount {
                        name: contract_name.clone(),
                        deployer: tx.from,
                        deployed_at: block_number,
                        state: FleetState::new(),
                    },
                );
                tracing::info!(%address, block = block_number, "deployed {contract_name}");

                Receipt {
                    tx_hash,
                    block_number,
                    from: tx.from,
                    to: None,
                    contract_address: Some(address),
                    status: TxStatus::Success,
                    output: None,
                    revert_reason: None,
                    events: Vec::new(),
                }
            }
            TxPayload::Call { to, action } => {
                let ctx = CallContext::new(*to, tx.from, block_number);
                let account = self
                    .contracts
                    .get_mut(to)
                    .ok_or(LedgerError::ContractNotFound(*to))?;

                let mark = self.fhe.journal_mark();
                let result = FleetEngine::new(&mut account.state).execute(&mut self.fhe, &ctx, action);

                let mut receipt = Receipt {
                    tx_hash,
                    block_number,
                    from: tx.from,
                    to: Some(*to),
                    contract_address: None,
                    status: TxStatus::Success,
                    output: None,
                    revert_reason: None,
                    events: Vec::new(),
                };

                match result {
                    Ok(outcome) => {
                        receipt.output = Some(outcome.output);
                        receipt.events = outcome.events;
                    }
                    Err(err) => {
                        self.fhe.revert_to(mark);
                        if err.error.severity().is_internal() {
                            tracing::error!(tx = %tx_hash, "{} reverted: {err}", action.name());
                        } else {
                            tracing::warn!(tx = %tx_hash, "{} reverted: {err}", action.name());
                        }
                        receipt.status = TxStatus::Reverted;
                        receipt.revert_reason = Some(RevertReason {
                            code: err.error.error_code().to_string(),
                            message: err.error.to_string(),
                            phase: err.phase,
                        });
                    }
                }
                receipt
            }
        };

        let previous_nonce = self.nonces.insert(tx.from, nonce + 1);
        self.block_number = block_number;
        self.receipts.insert(tx_hash, receipt.clone());
        self.pending = Some(PendingBlock {
            tx_hash,
            from: tx.from,
            previous_nonce,
            deployed: receipt.contract_address,
            called: receipt.to,
        });

        Ok(receipt)
    }

    /// Answers a read against the latest committed state.
    pub fn query(&self, contract: &Address, query: &FleetQuery) -> Result<QueryResponse, LedgerError> {
        let state = &self
            .contracts
            .get(contract)
            .ok_or(LedgerError::ContractNotFound(*contract))?
            .state;

        let response = match query {
            FleetQuery::ShipOf(pilot) => QueryResponse::ShipOf(state.ship_of(pilot)),
            FleetQuery::AttackPower(token_id) => {
                QueryResponse::AttackPower(state.attack_power(*token_id)?)
            }
            FleetQuery::LastAttackResult(token_id) => {
                QueryResponse::LastAttackResult(state.last_attack_result(*token_id)?)
            }
            FleetQuery::TotalSupply => QueryResponse::TotalSupply(state.total_supply()),
        };
        Ok(response)
    }
}
