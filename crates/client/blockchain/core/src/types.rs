//! Common types for contract interactions.

use runtime::{PendingTransaction, Receipt, TxHash};

use crate::error::{Result, TransportError};

/// A state-changing call that has been submitted but not awaited.
#[derive(Debug)]
pub struct PendingCall {
    hash: TxHash,
    inner: Pending,
}

#[derive(Debug)]
enum Pending {
    Ledger(PendingTransaction),
    Included(Box<Receipt>),
}

impl PendingCall {
    /// Wraps a transaction queued on the ledger worker.
    pub fn queued(pending: PendingTransaction) -> Self {
        Self {
            hash: pending.hash(),
            inner: Pending::Ledger(pending),
        }
    }

    /// Wraps a receipt that is already available.
    pub fn included(receipt: Receipt) -> Self {
        Self {
            hash: receipt.tx_hash,
            inner: Pending::Included(Box::new(receipt)),
        }
    }

    pub fn hash(&self) -> TxHash {
        self.hash
    }

    /// Waits for inclusion and returns the receipt, reverted or not.
    pub async fn wait(self) -> Result<Receipt> {
        match self.inner {
            Pending::Ledger(pending) => Ok(pending.wait().await?),
            Pending::Included(receipt) => Ok(*receipt),
        }
    }

    /// Waits for inclusion and turns a revert into [`TransportError::Reverted`].
    pub async fn confirmed(self) -> Result<Receipt> {
        let hash = self.hash;
        let receipt = self.wait().await?;
        if receipt.is_success() {
            return Ok(receipt);
        }

        let reason = receipt
            .revert_reason
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "execution reverted".to_string());
        Err(TransportError::Reverted { hash, reason })
    }
}
