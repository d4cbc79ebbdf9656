//! Errors shown in the session panels.

use client_blockchain_core::TransportError;

/// Failures of the session flows. The `Display` text is what the panel shows.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("Connect your wallet to continue")]
    WalletUnavailable,

    #[error("Wallet signer unavailable")]
    SignerUnavailable,

    #[error("Encryption service not ready yet")]
    RelayerUnready,

    #[error("Mint your spaceship before launching an attack")]
    NoShip,

    #[error("Defense value must be a non-negative integer")]
    InvalidDefense,

    #[error("Mint transaction reverted")]
    MintReverted,

    #[error("Attack transaction reverted")]
    AttackReverted,

    #[error("Decryption result missing")]
    PowerMissing,

    #[error("Could not decrypt last attack result")]
    ResultMissing,

    #[error("{0}")]
    Transport(TransportError),
}

impl From<TransportError> for FrontendError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::WalletUnavailable(_) => Self::WalletUnavailable,
            TransportError::SignerUnavailable => Self::SignerUnavailable,
            TransportError::RelayerUnready => Self::RelayerUnready,
            other => Self::Transport(other),
        }
    }
}
