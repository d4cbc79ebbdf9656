//! Registry rules for the Cipherverse fleet.
//!
//! `fleet-core` defines the canonical ship registry (one non-transferable ship
//! per pilot, a fixed encrypted attack power, an overwritten encrypted attack
//! outcome) and exposes pure APIs reused by the ledger runtime and clients.
//! All state mutation flows through [`engine::FleetEngine`]; encrypted
//! arithmetic is delegated to whatever implements [`env::FheEnv`].
pub mod action;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod state;
pub mod types;

pub use action::{FleetAction, FleetTransition, LaunchAttack, MintShip};
pub use config::FleetConfig;
pub use engine::{
    ActionOutput, ExecuteError, ExecutionOutcome, FleetEngine, FleetEvent, TransitionPhase,
};
pub use env::{CallContext, EnvError, FheEnv};
pub use error::{ErrorSeverity, FleetError};
pub use state::{FleetState, JournalMark, ShipRecord};
pub use types::{
    Address, AddressParseError, EncryptedBool, EncryptedU32, FheType, Handle, InputProof, TokenId,
};
