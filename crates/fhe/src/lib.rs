//! Local stand-in for the homomorphic-encryption runtime.
//!
//! The registry only sees [`fleet_core::FheEnv`]. This crate provides the
//! in-process implementation used by the local ledger together with the
//! client-side pieces that talk to it:
//!
//! - [`MockCoprocessor`] keeps the ciphertext table and access list
//! - [`EncryptedInputBuilder`] produces handles plus an input proof bound to
//!   a `(contract, user)` pair
//! - [`DecryptionGrant`] and [`UserDecryptRequest`] model the time-boxed,
//!   wallet-signed authorization for user decryption
//! - [`DecryptionService`] releases clear values once a request checks out
//!
//! Values are stored in the clear behind their handles. Handles are still
//! opaque to the registry, which is all the rules depend on.

mod coprocessor;
mod decryption;
mod error;
mod grant;
mod input;
mod keys;

pub use coprocessor::{Ciphertext, CoprocessorMark, MockCoprocessor};
pub use decryption::{ClearValue, DecryptionService, UserDecryptRequest};
pub use error::{FheError, Result};
pub use grant::{DecryptionGrant, GrantStatus};
pub use input::{EncryptedInput, EncryptedInputBuilder};
pub use keys::{EphemeralKeypair, address_from_verifying_key};

/// Chain id of a local development node.
pub const LOCAL_CHAIN_ID: u64 = 31337;
