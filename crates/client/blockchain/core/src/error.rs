//! Client-side errors.

use fhe::FheError;
use fleet_core::FleetError;
use runtime::{LedgerError, RuntimeError, TxHash};

pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors surfaced to CLI tasks and the front-end session.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transaction {hash} reverted: {reason}")]
    Reverted { hash: TxHash, reason: String },

    #[error("wallet unavailable: {0}")]
    WalletUnavailable(String),

    #[error("wallet signer unavailable")]
    SignerUnavailable,

    #[error("encryption relayer is not ready")]
    RelayerUnready,

    #[error("{0} not found")]
    NotFound(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Fhe(#[from] FheError),
}

impl TransportError {
    /// The registry rule that refused a query, if that is what happened.
    pub fn fleet_error(&self) -> Option<&FleetError> {
        match self {
            Self::Runtime(RuntimeError::Ledger(LedgerError::Call(err))) => Some(err),
            _ => None,
        }
    }
}

impl From<LedgerError> for TransportError {
    fn from(err: LedgerError) -> Self {
        Self::Runtime(RuntimeError::Ledger(err))
    }
}
