//! Read-only registry methods.

use fleet_core::{Address, EncryptedBool, EncryptedU32, TokenId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FleetQuery {
    /// `shipOf(address)`
    ShipOf(Address),
    /// `getAttackPower(tokenId)`
    AttackPower(TokenId),
    /// `getLastAttackResult(tokenId)`
    LastAttackResult(TokenId),
    /// `totalSupply()`
    TotalSupply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryResponse {
    ShipOf(TokenId),
    AttackPower(EncryptedU32),
    LastAttackResult(EncryptedBool),
    TotalSupply(u64),
}
