//! `mintShip()`: one ship per pilot.

use crate::action::FleetTransition;
use crate::config::FleetConfig;
use crate::env::{CallContext, FheEnv};
use crate::error::FleetError;
use crate::state::{FleetState, ShipRecord};
use crate::types::{EncryptedBool, TokenId};

/// Mints the caller's ship with an encrypted attack power of
/// [`FleetConfig::ATTACK_POWER`].
///
/// # Invariants
///
/// - A pilot owns at most one ship
/// - Token ids are dense and start at [`FleetConfig::FIRST_TOKEN_ID`]
/// - The contract and the owner are on the attack power's access list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MintShip;

impl FleetTransition for MintShip {
    type Output = TokenId;

    fn pre_validate(&self, state: &FleetState, ctx: &CallContext) -> Result<(), FleetError> {
        let existing = state.ship_of(&ctx.caller);
        if existing.is_some() {
            return Err(FleetError::AlreadyMinted {
                pilot: ctx.caller,
                token_id: existing,
            });
        }
        Ok(())
    }

    fn apply<E: FheEnv + ?Sized>(
        &self,
        state: &mut FleetState,
        env: &mut E,
        ctx: &CallContext,
    ) -> Result<TokenId, FleetError> {
        let token_id = state.next_token_id();

        let attack_power = env
            .trivial_encrypt_u32(FleetConfig::ATTACK_POWER)
            .map_err(FleetError::Fhe)?;
        env.allow(attack_power.handle(), ctx.contract)
            .map_err(FleetError::Fhe)?;
        env.allow(attack_power.handle(), ctx.caller)
            .map_err(FleetError::Fhe)?;

        state.insert_ship(ShipRecord {
            owner: ctx.caller,
            token_id,
            attack_power,
            last_attack_result: EncryptedBool::EMPTY,
        });

        Ok(token_id)
    }

    fn post_validate(
        &self,
        state: &FleetState,
        ctx: &CallContext,
        token_id: &TokenId,
    ) -> Result<(), FleetError> {
        if state.ship_of(&ctx.caller) != *token_id {
            return Err(FleetError::InvariantViolation(
                "minted token is not indexed under its owner".to_string(),
            ));
        }
        if state.total_supply() != token_id.0 {
            return Err(FleetError::InvariantViolation(
                "total supply diverged from the last token id".to_string(),
            ));
        }
        Ok(())
    }
}
