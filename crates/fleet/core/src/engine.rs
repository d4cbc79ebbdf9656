//! Transition pipeline for registry calls.
//!
//! The [`FleetEngine`] is the authoritative reducer for [`FleetState`]. It
//! runs the pre-validate, apply and post-validate phases of a call and
//! reverts the state's undo journal when apply or post-validate fails, so a
//! call either fully applies or leaves the registry untouched. Successful
//! calls stay in the journal until the caller commits the state.

use std::fmt;

use crate::action::{FleetAction, FleetTransition};
use crate::env::{CallContext, FheEnv};
use crate::error::FleetError;
use crate::state::FleetState;
use crate::types::{Address, EncryptedBool, TokenId};

/// Identifies which stage of the transition pipeline produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionPhase {
    PreValidate,
    Apply,
    PostValidate,
}

impl TransitionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPhase::PreValidate => "pre_validate",
            TransitionPhase::Apply => "apply",
            TransitionPhase::PostValidate => "post_validate",
        }
    }
}

impl fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registry failure tagged with the phase that raised it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("{phase} failed: {error}")]
pub struct ExecuteError {
    pub phase: TransitionPhase,
    #[source]
    pub error: FleetError,
}

impl ExecuteError {
    pub fn new(phase: TransitionPhase, error: FleetError) -> Self {
        Self { phase, error }
    }
}

/// Return value of a successful call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionOutput {
    Minted(TokenId),
    Attacked(EncryptedBool),
}

/// Events emitted by the registry, in emission order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FleetEvent {
    ShipMinted {
        pilot: Address,
        token_id: TokenId,
    },
    AttackLaunched {
        pilot: Address,
        token_id: TokenId,
        result: EncryptedBool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionOutcome {
    pub output: ActionOutput,
    pub events: Vec<FleetEvent>,
}

/// Executes registry calls against a borrowed state.
pub struct FleetEngine<'a> {
    state: &'a mut FleetState,
}

impl<'a> FleetEngine<'a> {
    pub fn new(state: &'a mut FleetState) -> Self {
        Self { state }
    }

    /// Executes one call on behalf of `ctx.caller`.
    pub fn execute<E: FheEnv + ?Sized>(
        &mut self,
        env: &mut E,
        ctx: &CallContext,
        action: &FleetAction,
    ) -> Result<ExecutionOutcome, ExecuteError> {
        match action {
            FleetAction::MintShip(mint) => {
                let token_id = self.run(mint, env, ctx)?;
                Ok(ExecutionOutcome {
                    output: ActionOutput::Minted(token_id),
                    events: vec![FleetEvent::ShipMinted {
                        pilot: ctx.caller,
                        token_id,
                    }],
                })
            }
            FleetAction::LaunchAttack(attack) => {
                let result = self.run(attack, env, ctx)?;
                Ok(ExecutionOutcome {
                    output: ActionOutput::Attacked(result),
                    events: vec![FleetEvent::AttackLaunched {
                        pilot: ctx.caller,
                        token_id: attack.token_id,
                        result,
                    }],
                })
            }
        }
    }

    fn run<T, E>(
        &mut self,
        transition: &T,
        env: &mut E,
        ctx: &CallContext,
    ) -> Result<T::Output, ExecuteError>
    where
        T: FleetTransition,
        E: FheEnv + ?Sized,
    {
        transition
            .pre_validate(self.state, ctx)
            .map_err(|e| ExecuteError::new(TransitionPhase::PreValidate, e))?;

        let mark = self.state.journal_mark();

        let output = match transition.apply(self.state, env, ctx) {
            Ok(output) => output,
            Err(error) => {
                self.state.revert_to(mark);
                return Err(ExecuteError::new(TransitionPhase::Apply, error));
            }
        };

        if let Err(error) = transition.post_validate(self.state, ctx, &output) {
            self.state.revert_to(mark);
            return Err(ExecuteError::new(TransitionPhase::PostValidate, error));
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::action::{LaunchAttack, MintShip};
    use crate::config::FleetConfig;
    use crate::env::EnvError;
    use crate::types::{EncryptedU32, FheType, Handle, InputProof};

    /// Plaintext-backed environment: handles index into a value table.
    #[derive(Default)]
    struct PlainEnv {
        values: HashMap<Handle, (FheType, u32)>,
        acl: HashSet<(Handle, Address)>,
        counter: u8,
    }

    impl PlainEnv {
        fn fresh(&mut self, ty: FheType, value: u32) -> Handle {
            self.counter += 1;
            let mut bytes = [0u8; 32];
            bytes[0] = self.counter;
            bytes[Handle::TYPE_BYTE] = ty.tag();
            let handle = Handle(bytes);
            self.values.insert(handle, (ty, value));
            handle
        }

        /// Client-side encryption: proof is `contract || caller`.
        fn encrypt_input(&mut self, value: u32, ctx: &CallContext) -> (Handle, InputProof) {
            let handle = self.fresh(FheType::Uint32, value);
            let mut proof = ctx.contract.0.to_vec();
            proof.extend_from_slice(&ctx.caller.0);
            (handle, InputProof::new(proof))
        }

        fn decrypt(&self, handle: Handle) -> u32 {
            self.values[&handle].1
        }
    }

    impl FheEnv for PlainEnv {
        fn trivial_encrypt_u32(&mut self, value: u32) -> Result<EncryptedU32, EnvError> {
            Ok(EncryptedU32(self.fresh(FheType::Uint32, value)))
        }

        fn verify_input_u32(
            &mut self,
            input: Handle,
            proof: &InputProof,
            ctx: &CallContext,
        ) -> Result<EncryptedU32, EnvError> {
            let mut expected = ctx.contract.0.to_vec();
            expected.extend_from_slice(&ctx.caller.0);
            if proof.as_bytes() != expected.as_slice() {
                return Err(EnvError::InvalidProof("binding mismatch".to_string()));
            }
            if !self.values.contains_key(&input) {
                return Err(EnvError::UnknownHandle(input));
            }
            Ok(EncryptedU32(input))
        }

        fn le(&mut self, lhs: EncryptedU32, rhs: EncryptedU32) -> Result<EncryptedBool, EnvError> {
            let result = self.decrypt(lhs.handle()) <= self.decrypt(rhs.handle());
            Ok(EncryptedBool(self.fresh(FheType::Bool, result as u32)))
        }

        fn allow(&mut self, handle: Handle, account: Address) -> Result<(), EnvError> {
            self.acl.insert((handle, account));
            Ok(())
        }

        fn is_allowed(&self, handle: Handle, account: Address) -> bool {
            self.acl.contains(&(handle, account))
        }
    }

    const CONTRACT: Address = Address([0xC0; 20]);
    const ALICE: Address = Address([0xA1; 20]);
    const BOB: Address = Address([0xB0; 20]);

    fn ctx(caller: Address) -> CallContext {
        CallContext::new(CONTRACT, caller, 1)
    }

    fn mint(state: &mut FleetState, env: &mut PlainEnv, caller: Address) -> TokenId {
        let outcome = FleetEngine::new(state)
            .execute(env, &ctx(caller), &FleetAction::mint())
            .unwrap();
        match outcome.output {
            ActionOutput::Minted(token_id) => token_id,
            other => panic!("unexpected output {other:?}"),
        }
    }

    fn attack(
        state: &mut FleetState,
        env: &mut PlainEnv,
        caller: Address,
        token_id: TokenId,
        defense: u32,
    ) -> Result<EncryptedBool, ExecuteError> {
        let call = ctx(caller);
        let (handle, proof) = env.encrypt_input(defense, &call);
        let action = FleetAction::from(LaunchAttack::new(token_id, handle, proof));
        FleetEngine::new(state)
            .execute(env, &call, &action)
            .map(|outcome| match outcome.output {
                ActionOutput::Attacked(result) => result,
                other => panic!("unexpected output {other:?}"),
            })
    }

    #[test]
    fn mint_assigns_sequential_ids_and_fixed_power() {
        let mut state = FleetState::new();
        let mut env = PlainEnv::default();

        assert_eq!(state.ship_of(&ALICE), TokenId::NONE);

        let alice = mint(&mut state, &mut env, ALICE);
        let bob = mint(&mut state, &mut env, BOB);

        assert_eq!(alice, TokenId(1));
        assert_eq!(bob, TokenId(2));
        assert_eq!(state.total_supply(), 2);

        let power = state.attack_power(alice).unwrap();
        assert_eq!(env.decrypt(power.handle()), FleetConfig::ATTACK_POWER);
        assert!(env.is_allowed(power.handle(), ALICE));
        assert!(env.is_allowed(power.handle(), CONTRACT));
        assert!(!env.is_allowed(power.handle(), BOB));
    }

    #[test]
    fn second_mint_is_rejected_before_mutation() {
        let mut state = FleetState::new();
        let mut env = PlainEnv::default();
        let token_id = mint(&mut state, &mut env, ALICE);

        let err = FleetEngine::new(&mut state)
            .execute(&mut env, &ctx(ALICE), &FleetAction::MintShip(MintShip))
            .unwrap_err();

        assert_eq!(err.phase, TransitionPhase::PreValidate);
        assert_eq!(
            err.error,
            FleetError::AlreadyMinted {
                pilot: ALICE,
                token_id
            }
        );
        assert_eq!(err.error.error_code(), "AlreadyMinted");
        assert_eq!(state.total_supply(), 1);
        assert_eq!(state.ship_of(&ALICE), token_id);
    }

    #[test]
    fn attack_outcome_follows_power_le_defense() {
        let mut state = FleetState::new();
        let mut env = PlainEnv::default();
        let token_id = mint(&mut state, &mut env, ALICE);

        assert!(state.last_attack_result(token_id).unwrap().is_empty());

        let low = attack(&mut state, &mut env, ALICE, token_id, 60).unwrap();
        assert_eq!(env.decrypt(low.handle()), 0);

        let boundary = attack(&mut state, &mut env, ALICE, token_id, 100).unwrap();
        assert_eq!(env.decrypt(boundary.handle()), 1);

        let high = attack(&mut state, &mut env, ALICE, token_id, 160).unwrap();
        assert_eq!(env.decrypt(high.handle()), 1);

        // Only the latest outcome is kept.
        assert_eq!(state.last_attack_result(token_id).unwrap(), high);
        assert_eq!(state.total_supply(), 1);
    }

    #[test]
    fn attack_with_foreign_ship_is_rejected() {
        let mut state = FleetState::new();
        let mut env = PlainEnv::default();
        let alice_ship = mint(&mut state, &mut env, ALICE);
        mint(&mut state, &mut env, BOB);

        let err = attack(&mut state, &mut env, BOB, alice_ship, 500).unwrap_err();
        assert_eq!(
            err.error,
            FleetError::NotShipOwner {
                caller: BOB,
                token_id: alice_ship
            }
        );
        assert!(state.last_attack_result(alice_ship).unwrap().is_empty());
    }

    #[test]
    fn attack_with_token_zero_is_unknown_ship() {
        let mut state = FleetState::new();
        let mut env = PlainEnv::default();
        mint(&mut state, &mut env, ALICE);

        let err = attack(&mut state, &mut env, ALICE, TokenId::NONE, 10).unwrap_err();
        assert_eq!(err.error, FleetError::UnknownShip(TokenId::NONE));
    }

    #[test]
    fn proof_bound_to_other_caller_reverts_during_apply() {
        let mut state = FleetState::new();
        let mut env = PlainEnv::default();
        let token_id = mint(&mut state, &mut env, ALICE);

        let (handle, proof) = env.encrypt_input(150, &ctx(BOB));
        let action = FleetAction::from(LaunchAttack::new(token_id, handle, proof));
        let before = state.clone();

        let err = FleetEngine::new(&mut state)
            .execute(&mut env, &ctx(ALICE), &action)
            .unwrap_err();

        assert_eq!(err.phase, TransitionPhase::Apply);
        assert!(matches!(err.error, FleetError::InvalidEncryptedInput(_)));
        assert_eq!(state, before);
    }

    #[test]
    fn failed_call_keeps_earlier_uncommitted_calls() {
        let mut state = FleetState::new();
        let mut env = PlainEnv::default();
        mint(&mut state, &mut env, ALICE);
        state.commit();
        let committed = state.clone();

        let token_id = mint(&mut state, &mut env, BOB);
        let result = attack(&mut state, &mut env, BOB, token_id, 160).unwrap();
        assert!(state.has_uncommitted());

        let err = attack(&mut state, &mut env, ALICE, token_id, 10).unwrap_err();
        assert!(matches!(err.error, FleetError::NotShipOwner { .. }));
        assert_eq!(state.last_attack_result(token_id), Ok(result));
        assert_eq!(state.total_supply(), 2);

        state.rollback();
        assert!(!state.has_uncommitted());
        assert_eq!(state, committed);
        assert_eq!(state.ship_of(&BOB), TokenId::NONE);
        assert_eq!(
            state.last_attack_result(token_id),
            Err(FleetError::UnknownShip(token_id))
        );
    }

    #[test]
    fn unknown_token_lookups_fail() {
        let state = FleetState::new();
        assert_eq!(
            state.attack_power(TokenId(7)),
            Err(FleetError::UnknownShip(TokenId(7)))
        );
        assert_eq!(
            state.last_attack_result(TokenId(7)),
            Err(FleetError::UnknownShip(TokenId(7)))
        );
    }

    #[test]
    fn state_survives_bincode_snapshot() {
        let mut state = FleetState::new();
        let mut env = PlainEnv::default();
        let token_id = mint(&mut state, &mut env, ALICE);
        attack(&mut state, &mut env, ALICE, token_id, 42).unwrap();

        let bytes = bincode::serialize(&state).unwrap();
        let restored: FleetState = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, state);
    }
}
