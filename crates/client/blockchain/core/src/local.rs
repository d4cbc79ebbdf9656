//! Clients backed by an in-process ledger.

use std::collections::BTreeMap;

use async_trait::async_trait;
use fhe::{ClearValue, UserDecryptRequest};
use fleet_core::{
    Address, EncryptedBool, EncryptedU32, FleetConfig, Handle, InputProof, LaunchAttack,
    MintShip, TokenId,
};
use runtime::{FleetQuery, LedgerHandle, QueryResponse, Receipt, Transaction};

use crate::error::{Result, TransportError};
use crate::traits::{FhevmInstance, FleetContract, FleetReader, FleetWriter};
use crate::types::PendingCall;
use crate::wallet::Wallet;

/// Registry client talking to the local ledger worker.
#[derive(Clone)]
pub struct LocalFleetClient {
    ledger: LedgerHandle,
    address: Address,
    network: String,
}

impl LocalFleetClient {
    /// Binds to an existing deployment, checking that it exists.
    pub fn connect(ledger: LedgerHandle, address: Address, network: impl Into<String>) -> Result<Self> {
        if ledger.contract(&address).is_none() {
            return Err(TransportError::NotFound(format!(
                "{} deployment at {address}",
                FleetConfig::DEFAULT_CONTRACT_NAME
            )));
        }

        Ok(Self {
            ledger,
            address,
            network: network.into(),
        })
    }

    /// Deploys a fresh registry from `deployer` and binds to it.
    pub async fn deploy(
        ledger: LedgerHandle,
        deployer: &Wallet,
        network: impl Into<String>,
    ) -> Result<(Self, Receipt)> {
        let tx = Transaction::deploy(deployer.address(), FleetConfig::DEFAULT_CONTRACT_NAME);
        let signed = deployer.sign_transaction(tx, ledger.chain_id());
        let receipt = PendingCall::queued(ledger.submit(signed).await?)
            .confirmed()
            .await?;

        let address = receipt.contract_address.ok_or_else(|| {
            TransportError::UnexpectedResponse("deployment receipt without address".to_string())
        })?;
        tracing::info!(%address, block = receipt.block_number, "registry deployed");

        let client = Self {
            ledger,
            address,
            network: network.into(),
        };
        Ok((client, receipt))
    }

    pub fn ledger(&self) -> &LedgerHandle {
        &self.ledger
    }

    fn query(&self, query: FleetQuery) -> Result<QueryResponse> {
        Ok(self.ledger.query(&self.address, query)?)
    }

    async fn send(&self, wallet: &Wallet, tx: Transaction) -> Result<PendingCall> {
        let method = tx.method().to_string();
        let signed = wallet.sign_transaction(tx, self.ledger.chain_id());
        let pending = self.ledger.submit(signed).await?;
        tracing::debug!(hash = %pending.hash(), %method, "transaction submitted");
        Ok(PendingCall::queued(pending))
    }
}

fn unexpected(expected: &str, found: QueryResponse) -> TransportError {
    TransportError::UnexpectedResponse(format!("expected {expected}, got {found:?}"))
}

#[async_trait]
impl FleetReader for LocalFleetClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn ship_of(&self, pilot: Address) -> Result<TokenId> {
        match self.query(FleetQuery::ShipOf(pilot))? {
            QueryResponse::ShipOf(token_id) => Ok(token_id),
            other => Err(unexpected("shipOf", other)),
        }
    }

    async fn attack_power(&self, token_id: TokenId) -> Result<EncryptedU32> {
        match self.query(FleetQuery::AttackPower(token_id))? {
            QueryResponse::AttackPower(power) => Ok(power),
            other => Err(unexpected("getAttackPower", other)),
        }
    }

    async fn last_attack_result(&self, token_id: TokenId) -> Result<EncryptedBool> {
        match self.query(FleetQuery::LastAttackResult(token_id))? {
            QueryResponse::LastAttackResult(result) => Ok(result),
            other => Err(unexpected("getLastAttackResult", other)),
        }
    }

    async fn total_supply(&self) -> Result<u64> {
        match self.query(FleetQuery::TotalSupply)? {
            QueryResponse::TotalSupply(supply) => Ok(supply),
            other => Err(unexpected("totalSupply", other)),
        }
    }
}

#[async_trait]
impl FleetWriter for LocalFleetClient {
    async fn mint_ship(&self, wallet: &Wallet) -> Result<PendingCall> {
        let tx = Transaction::call(wallet.address(), self.address, MintShip);
        self.send(wallet, tx).await
    }

    async fn launch_attack(
        &self,
        wallet: &Wallet,
        token_id: TokenId,
        defense: Handle,
        input_proof: InputProof,
    ) -> Result<PendingCall> {
        let attack = LaunchAttack::new(token_id, defense, input_proof);
        let tx = Transaction::call(wallet.address(), self.address, attack);
        self.send(wallet, tx).await
    }
}

impl FleetContract for LocalFleetClient {
    fn name(&self) -> &str {
        FleetConfig::DEFAULT_CONTRACT_NAME
    }

    fn network(&self) -> &str {
        &self.network
    }
}

/// Relayer stand-in that forwards decryption requests to the ledger's
/// coprocessor.
#[derive(Clone)]
pub struct LocalFhevm {
    ledger: LedgerHandle,
    grant_duration_days: u32,
}

impl LocalFhevm {
    pub fn new(ledger: LedgerHandle) -> Self {
        Self {
            ledger,
            grant_duration_days: fhe::DecryptionGrant::DEFAULT_DURATION_DAYS,
        }
    }

    pub fn with_grant_duration(mut self, days: u32) -> Self {
        self.grant_duration_days = days;
        self
    }
}

#[async_trait]
impl FhevmInstance for LocalFhevm {
    fn chain_id(&self) -> u64 {
        self.ledger.chain_id()
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn grant_duration_days(&self) -> u32 {
        self.grant_duration_days
    }

    async fn user_decrypt(&self, request: UserDecryptRequest) -> Result<BTreeMap<Handle, ClearValue>> {
        Ok(self.ledger.user_decrypt(&request)?)
    }
}
