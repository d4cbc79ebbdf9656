//! Authoritative registry state.
//!
//! Runtime layers clone or query this state but mutate it exclusively
//! through [`crate::engine::FleetEngine`]. Every mutation is recorded in an
//! undo journal until the owner calls [`FleetState::commit`], so a call can
//! be reverted without copying the registry.
use std::collections::BTreeMap;

use crate::error::FleetError;
use crate::types::{Address, EncryptedBool, EncryptedU32, TokenId};

/// One pilot's ship. Created once, never transferred or deleted.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShipRecord {
    pub owner: Address,
    pub token_id: TokenId,
    /// Fixed at mint, never reassigned.
    pub attack_power: EncryptedU32,
    /// Empty until the first attack, then overwritten by every attack.
    pub last_attack_result: EncryptedBool,
}

/// Reverse of one uncommitted mutation.
#[derive(Clone, Debug)]
enum StateChange {
    ShipInserted { owner: Address, token_id: TokenId },
    ResultOverwritten { token_id: TokenId, previous: EncryptedBool },
}

/// Position in the undo journal, see [`FleetState::journal_mark`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JournalMark(usize);

/// Canonical snapshot of one deployed registry.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FleetState {
    ship_of: BTreeMap<Address, TokenId>,
    ships: BTreeMap<TokenId, ShipRecord>,
    /// Monotonic, one increment per successful mint.
    total_supply: u64,
    #[cfg_attr(feature = "serde", serde(skip))]
    journal: Vec<StateChange>,
}

/// Equality ignores uncommitted journal entries.
impl PartialEq for FleetState {
    fn eq(&self, other: &Self) -> bool {
        self.ship_of == other.ship_of
            && self.ships == other.ships
            && self.total_supply == other.total_supply
    }
}

impl Eq for FleetState {}

impl FleetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token owned by `pilot`, or [`TokenId::NONE`].
    pub fn ship_of(&self, pilot: &Address) -> TokenId {
        self.ship_of.get(pilot).copied().unwrap_or(TokenId::NONE)
    }

    pub fn ship(&self, token_id: TokenId) -> Option<&ShipRecord> {
        self.ships.get(&token_id)
    }

    pub fn attack_power(&self, token_id: TokenId) -> Result<EncryptedU32, FleetError> {
        self.ship(token_id)
            .map(|ship| ship.attack_power)
            .ok_or(FleetError::UnknownShip(token_id))
    }

    /// Latest attack outcome. A minted ship that never attacked yields
    /// [`EncryptedBool::EMPTY`].
    pub fn last_attack_result(&self, token_id: TokenId) -> Result<EncryptedBool, FleetError> {
        self.ship(token_id)
            .map(|ship| ship.last_attack_result)
            .ok_or(FleetError::UnknownShip(token_id))
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn ships(&self) -> impl Iterator<Item = &ShipRecord> {
        self.ships.values()
    }

    /// Id the next successful mint will receive.
    pub fn next_token_id(&self) -> TokenId {
        TokenId(crate::FleetConfig::FIRST_TOKEN_ID + self.total_supply)
    }

    /// Current end of the undo journal.
    pub fn journal_mark(&self) -> JournalMark {
        JournalMark(self.journal.len())
    }

    /// Whether mutations are waiting for [`FleetState::commit`].
    pub fn has_uncommitted(&self) -> bool {
        !self.journal.is_empty()
    }

    /// Undoes every mutation recorded after `mark`, newest first.
    pub fn revert_to(&mut self, mark: JournalMark) {
        while self.journal.len() > mark.0 {
            let Some(change) = self.journal.pop() else {
                break;
            };
            match change {
                StateChange::ShipInserted { owner, token_id } => {
                    self.ship_of.remove(&owner);
                    self.ships.remove(&token_id);
                    self.total_supply -= 1;
                }
                StateChange::ResultOverwritten { token_id, previous } => {
                    if let Some(ship) = self.ships.get_mut(&token_id) {
                        ship.last_attack_result = previous;
                    }
                }
            }
        }
    }

    /// Undoes every uncommitted mutation.
    pub fn rollback(&mut self) {
        self.revert_to(JournalMark(0));
    }

    /// Makes recorded mutations permanent.
    pub fn commit(&mut self) {
        self.journal.clear();
    }

    pub(crate) fn insert_ship(&mut self, record: ShipRecord) {
        self.journal.push(StateChange::ShipInserted {
            owner: record.owner,
            token_id: record.token_id,
        });
        self.ship_of.insert(record.owner, record.token_id);
        self.ships.insert(record.token_id, record);
        self.total_supply += 1;
    }

    pub(crate) fn set_last_attack_result(
        &mut self,
        token_id: TokenId,
        result: EncryptedBool,
    ) -> Result<(), FleetError> {
        let ship = self
            .ships
            .get_mut(&token_id)
            .ok_or(FleetError::UnknownShip(token_id))?;
        let previous = std::mem::replace(&mut ship.last_attack_result, result);
        self.journal
            .push(StateChange::ResultOverwritten { token_id, previous });
        Ok(())
    }
}
