//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, the ledger, repositories and the
//! decryption service so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use fhe::FheError;

use crate::ledger::LedgerError;
pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("ledger worker command channel closed")]
    CommandChannelClosed,

    #[error("ledger worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("ledger worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("decryption failed: {0}")]
    Decryption(#[from] FheError),

    #[error("stored ledger belongs to chain {found}, expected {expected}")]
    ChainMismatch { expected: u64, found: u64 },
}
