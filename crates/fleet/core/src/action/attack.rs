//! `launchAttack(tokenId, encryptedDefense, inputProof)`.

use crate::action::FleetTransition;
use crate::env::{CallContext, FheEnv};
use crate::error::FleetError;
use crate::state::FleetState;
use crate::types::{EncryptedBool, Handle, InputProof, TokenId};

/// Compares the ship's encrypted attack power against an encrypted defense
/// value supplied by the pilot and stores the encrypted outcome.
///
/// The attack succeeds when `attack_power <= defense`. Only the latest
/// outcome is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaunchAttack {
    pub token_id: TokenId,
    /// Externally encrypted `u32` defense value.
    pub defense: Handle,
    pub input_proof: InputProof,
}

impl LaunchAttack {
    pub fn new(token_id: TokenId, defense: Handle, input_proof: InputProof) -> Self {
        Self {
            token_id,
            defense,
            input_proof,
        }
    }
}

impl FleetTransition for LaunchAttack {
    type Output = EncryptedBool;

    fn pre_validate(&self, state: &FleetState, ctx: &CallContext) -> Result<(), FleetError> {
        if self.token_id.is_none() || state.ship(self.token_id).is_none() {
            return Err(FleetError::UnknownShip(self.token_id));
        }

        // Only the owning pilot may fly their own ship.
        if state.ship_of(&ctx.caller) != self.token_id {
            return Err(FleetError::NotShipOwner {
                caller: ctx.caller,
                token_id: self.token_id,
            });
        }

        Ok(())
    }

    fn apply<E: FheEnv + ?Sized>(
        &self,
        state: &mut FleetState,
        env: &mut E,
        ctx: &CallContext,
    ) -> Result<EncryptedBool, FleetError> {
        let attack_power = state.attack_power(self.token_id)?;

        let defense = env
            .verify_input_u32(self.defense, &self.input_proof, ctx)
            .map_err(FleetError::InvalidEncryptedInput)?;

        let result = env.le(attack_power, defense).map_err(FleetError::Fhe)?;
        env.allow(result.handle(), ctx.contract)
            .map_err(FleetError::Fhe)?;
        env.allow(result.handle(), ctx.caller)
            .map_err(FleetError::Fhe)?;

        state.set_last_attack_result(self.token_id, result)?;

        Ok(result)
    }

    fn post_validate(
        &self,
        state: &FleetState,
        _ctx: &CallContext,
        result: &EncryptedBool,
    ) -> Result<(), FleetError> {
        if state.last_attack_result(self.token_id)? != *result {
            return Err(FleetError::InvariantViolation(
                "attack outcome was not recorded on the ship".to_string(),
            ));
        }
        Ok(())
    }
}
