//! Contract access layer for Cipherverse fleet clients.
//!
//! Clients never touch the ledger or the coprocessor directly; they go through
//! the traits defined here so the CLI and the front-end session run unchanged
//! against the local ledger or an in-memory mock.
//!
//! # Architecture
//!
//! ```text
//! FleetContract (composite trait)
//!     ├── FleetReader   shipOf / getAttackPower / getLastAttackResult / totalSupply
//!     └── FleetWriter   mintShip / launchAttack
//!
//! FhevmInstance         encrypted inputs, decryption grants, user decryption
//!
//! Wallet                signing key + account address
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_core::{FleetContract, FhevmInstance, Wallet};
//!
//! async fn mint_and_check(fleet: &dyn FleetContract, fhevm: &dyn FhevmInstance, wallet: &Wallet) {
//!     let receipt = fleet.mint_ship(wallet).await?.confirmed().await?;
//!     let token_id = fleet.ship_of(wallet.address()).await?;
//!     let power = fleet.attack_power(token_id).await?;
//!     let clear = fhevm.user_decrypt_euint(wallet, power.handle(), fleet.address()).await?;
//! }
//! ```

pub mod error;
pub mod local;
pub mod traits;
pub mod types;
pub mod wallet;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{Result, TransportError};
pub use local::{LocalFhevm, LocalFleetClient};
pub use traits::{FhevmInstance, FleetContract, FleetReader, FleetWriter};
pub use types::PendingCall;
pub use wallet::Wallet;

// Types callers need alongside the traits
pub use fhe::{ClearValue, DecryptionGrant, EncryptedInput, EncryptedInputBuilder, EphemeralKeypair};
pub use fleet_core::{Address, EncryptedBool, EncryptedU32, Handle, InputProof, TokenId};
pub use runtime::{Receipt, TxHash, TxStatus};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockFleetClient;
