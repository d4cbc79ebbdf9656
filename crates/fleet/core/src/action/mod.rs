//! Registry calls and the transition trait they implement.
//!
//! Each state-changing call is a small struct implementing
//! [`FleetTransition`]. The engine drives the three phases in order and
//! rolls the state back if any of them fails.
mod attack;
mod mint;

pub use attack::LaunchAttack;
pub use mint::MintShip;

use crate::env::{CallContext, FheEnv};
use crate::error::FleetError;
use crate::state::FleetState;

/// Three-phase state transition shared by every registry call.
pub trait FleetTransition {
    type Output;

    /// Validates pre-conditions using the state **before** mutation.
    fn pre_validate(&self, _state: &FleetState, _ctx: &CallContext) -> Result<(), FleetError> {
        Ok(())
    }

    /// Applies the call. Implementations may assume `pre_validate` passed.
    fn apply<E: FheEnv + ?Sized>(
        &self,
        state: &mut FleetState,
        env: &mut E,
        ctx: &CallContext,
    ) -> Result<Self::Output, FleetError>;

    /// Validates post-conditions using the state **after** mutation.
    fn post_validate(
        &self,
        _state: &FleetState,
        _ctx: &CallContext,
        _output: &Self::Output,
    ) -> Result<(), FleetError> {
        Ok(())
    }
}

/// State-changing calls accepted by the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FleetAction {
    /// `mintShip()`
    MintShip(MintShip),
    /// `launchAttack(tokenId, encryptedDefense, inputProof)`
    LaunchAttack(LaunchAttack),
}

impl FleetAction {
    pub fn mint() -> Self {
        Self::MintShip(MintShip)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MintShip(_) => "mintShip",
            Self::LaunchAttack(_) => "launchAttack",
        }
    }
}

impl From<MintShip> for FleetAction {
    fn from(action: MintShip) -> Self {
        Self::MintShip(action)
    }
}

impl From<LaunchAttack> for FleetAction {
    fn from(action: LaunchAttack) -> Self {
        Self::LaunchAttack(action)
    }
}
