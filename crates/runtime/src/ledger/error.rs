use fleet_core::{Address, FleetError};
use thiserror::Error;

use super::TxHash;

/// Rejections that keep a transaction or query from reaching the registry.
///
/// A call the registry itself refuses is not an error at this level: it is
/// included and produces a reverted receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid transaction signature: {0}")]
    InvalidSignature(String),

    #[error("transaction from {from} was signed by {signer}")]
    SenderMismatch { from: Address, signer: Address },

    #[error("transaction {0} already included")]
    DuplicateTransaction(TxHash),

    #[error("no contract deployed at {0}")]
    ContractNotFound(Address),

    #[error("unknown contract kind {0:?}")]
    UnsupportedContract(String),

    #[error("call reverted: {0}")]
    Call(#[from] FleetError),
}
