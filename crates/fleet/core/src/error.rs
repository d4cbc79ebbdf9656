//! Error types for registry transitions.
//!
//! Every failure a registry call can produce is a [`FleetError`]. Variants are
//! classified by [`ErrorSeverity`] so the ledger can decide whether a revert
//! is an expected user mistake or a sign of corrupted state.

use crate::env::EnvError;
use crate::types::{Address, TokenId};

/// Severity level of an error, used for categorization and logging.
///
/// - **Validation**: the caller sent a request the rules reject
/// - **Internal**: the encryption runtime or state disagreed with itself
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Invalid input, should not retry without changes.
    ///
    /// Examples: second mint, attacking with someone else's ship
    Validation,

    /// Unexpected state inconsistency. These indicate bugs.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Revert reasons of the fleet registry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FleetError {
    #[error("pilot {pilot} already owns spaceship {token_id}")]
    AlreadyMinted { pilot: Address, token_id: TokenId },

    #[error("no spaceship with token id {0}")]
    UnknownShip(TokenId),

    #[error("{caller} does not own spaceship {token_id}")]
    NotShipOwner { caller: Address, token_id: TokenId },

    #[error("invalid encrypted input: {0}")]
    InvalidEncryptedInput(EnvError),

    #[error("encryption runtime failure: {0}")]
    Fhe(EnvError),

    #[error("registry invariant violated: {0}")]
    InvariantViolation(String),
}

impl FleetError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AlreadyMinted { .. }
            | Self::UnknownShip(_)
            | Self::NotShipOwner { .. }
            | Self::InvalidEncryptedInput(_) => ErrorSeverity::Validation,
            Self::Fhe(_) | Self::InvariantViolation(_) => ErrorSeverity::Internal,
        }
    }

    /// Custom-error name as exposed on the contract surface.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyMinted { .. } => "AlreadyMinted",
            Self::UnknownShip(_) => "UnknownShip",
            Self::NotShipOwner { .. } => "NotShipOwner",
            Self::InvalidEncryptedInput(_) => "InvalidEncryptedInput",
            Self::Fhe(_) => "FheFailure",
            Self::InvariantViolation(_) => "InvariantViolation",
        }
    }
}
