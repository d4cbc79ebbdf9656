/// Registry constants.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FleetConfig {
    /// Name under which the registry is deployed and looked up.
    pub contract_name: String,
}

impl FleetConfig {
    /// Attack power every freshly minted ship receives (encrypted at mint).
    pub const ATTACK_POWER: u32 = 100;

    /// First token id handed out. `0` is reserved for "no ship".
    pub const FIRST_TOKEN_ID: u64 = 1;

    pub const DEFAULT_CONTRACT_NAME: &'static str = "CipherverseFleet";

    pub fn new() -> Self {
        Self {
            contract_name: Self::DEFAULT_CONTRACT_NAME.to_string(),
        }
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self::new()
    }
}
