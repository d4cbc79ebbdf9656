//! Capability boundary between the registry and the encryption runtime.
//!
//! The registry never sees plaintext. Everything it needs from the
//! homomorphic-encryption runtime is captured by [`FheEnv`]: trivially
//! encrypting a constant, admitting an externally encrypted input together
//! with its proof, the encrypted `<=` comparison, and access grants on the
//! resulting handles.
use crate::types::{Address, EncryptedBool, EncryptedU32, FheType, Handle, InputProof};

/// Execution context of a single registry call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallContext {
    /// Address of the registry contract being executed.
    pub contract: Address,
    /// Account that signed the transaction.
    pub caller: Address,
    /// Block the call is included in.
    pub block_number: u64,
}

impl CallContext {
    pub const fn new(contract: Address, caller: Address, block_number: u64) -> Self {
        Self {
            contract,
            caller,
            block_number,
        }
    }
}

/// Failures reported by the encryption runtime.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EnvError {
    #[error("input proof rejected: {0}")]
    InvalidProof(String),

    #[error("unknown ciphertext handle {0}")]
    UnknownHandle(Handle),

    #[error("handle {handle} has type {found}, expected {expected}")]
    TypeMismatch {
        handle: Handle,
        expected: FheType,
        found: FheType,
    },

    #[error("{account} is not allowed to use handle {handle}")]
    AccessDenied { handle: Handle, account: Address },
}

/// Encrypted-computation capability consumed by registry transitions.
pub trait FheEnv {
    /// Encrypts a public constant (`asEuint32`).
    fn trivial_encrypt_u32(&mut self, value: u32) -> Result<EncryptedU32, EnvError>;

    /// Admits an externally encrypted `u32` after checking its proof is bound
    /// to `(ctx.contract, ctx.caller)`.
    fn verify_input_u32(
        &mut self,
        input: Handle,
        proof: &InputProof,
        ctx: &CallContext,
    ) -> Result<EncryptedU32, EnvError>;

    /// Encrypted `lhs <= rhs`, computed without decrypting either side.
    fn le(&mut self, lhs: EncryptedU32, rhs: EncryptedU32) -> Result<EncryptedBool, EnvError>;

    /// Adds `account` to the access list of `handle`.
    fn allow(&mut self, handle: Handle, account: Address) -> Result<(), EnvError>;

    /// Returns true if `account` may use or decrypt `handle`.
    fn is_allowed(&self, handle: Handle, account: Address) -> bool;
}
