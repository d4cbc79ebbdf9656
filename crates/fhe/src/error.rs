//! Error types for the mock coprocessor and its clients.

use fleet_core::{Address, FheType, Handle};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FheError>;

/// Errors raised while encrypting inputs or serving decryption requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FheError {
    #[error("encrypted input has no values")]
    EmptyInput,

    #[error("input proof could not be encoded: {0}")]
    Serialization(String),

    #[error("handle {0} is not registered")]
    UnknownHandle(Handle),

    #[error("the empty handle holds no value")]
    EmptyHandle,

    #[error("handle {handle} holds {found}, expected {expected}")]
    TypeMismatch {
        handle: Handle,
        expected: FheType,
        found: FheType,
    },

    #[error("{account} is not allowed to decrypt {handle}")]
    AccessDenied { handle: Handle, account: Address },

    #[error("contract {0} is not covered by the decryption grant")]
    ContractNotAuthorized(Address),

    #[error("invalid decryption grant: {0}")]
    InvalidGrant(String),

    #[error("decryption grant is not valid yet")]
    GrantNotYetValid,

    #[error("decryption grant expired")]
    GrantExpired,

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("grant signed by {found}, request made for {expected}")]
    SignerMismatch { expected: Address, found: Address },
}
