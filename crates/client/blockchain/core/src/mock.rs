//! Mock registry client for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use fhe::{ClearValue, DecryptionService, MockCoprocessor, UserDecryptRequest};
use fleet_core::{
    Address, CallContext, EncryptedBool, EncryptedU32, FleetAction, FleetEngine, FleetState,
    Handle, InputProof, LaunchAttack, MintShip, TokenId,
};
use runtime::{Receipt, RevertReason, TxHash, TxStatus};

use crate::error::Result;
use crate::traits::{FhevmInstance, FleetContract, FleetReader, FleetWriter};
use crate::types::PendingCall;
use crate::wallet::Wallet;

/// In-memory registry plus coprocessor, without a ledger worker.
///
/// Calls execute immediately; the returned [`PendingCall`] already holds
/// the receipt.
#[derive(Clone)]
pub struct MockFleetClient {
    address: Address,
    inner: Arc<Mutex<MockChain>>,
    relayer_ready: Arc<AtomicBool>,
}

struct MockChain {
    state: FleetState,
    fhe: MockCoprocessor,
    block_number: u64,
}

impl MockFleetClient {
    pub const ADDRESS: Address = Address([0xF1; 20]);

    pub fn new() -> Self {
        Self {
            address: Self::ADDRESS,
            inner: Arc::new(Mutex::new(MockChain {
                state: FleetState::new(),
                fhe: MockCoprocessor::default(),
                block_number: 0,
            })),
            relayer_ready: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulates the relayer going up or down.
    pub fn set_relayer_ready(&self, ready: bool) {
        self.relayer_ready.store(ready, Ordering::SeqCst);
    }

    fn chain(&self) -> MutexGuard<'_, MockChain> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn block_number(&self) -> u64 {
        self.chain().block_number
    }

    fn execute(&self, wallet: &Wallet, action: FleetAction) -> PendingCall {
        let mut chain = self.chain();
        chain.block_number += 1;
        let block_number = chain.block_number;

        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&block_number.to_be_bytes());

        let ctx = CallContext::new(self.address, wallet.address(), block_number);
        let MockChain { state, fhe, .. } = &mut *chain;
        let mark = fhe.journal_mark();
        let outcome = FleetEngine::new(state).execute(fhe, &ctx, &action);

        let mut receipt = Receipt {
            tx_hash: TxHash(hash),
            block_number,
            from: wallet.address(),
            to: Some(self.address),
            contract_address: None,
            status: TxStatus::Success,
            output: None,
            revert_reason: None,
            events: Vec::new(),
        };
        match outcome {
            Ok(outcome) => {
                receipt.output = Some(outcome.output);
                receipt.events = outcome.events;
            }
            Err(err) => {
                fhe.revert_to(mark);
                receipt.status = TxStatus::Reverted;
                receipt.revert_reason = Some(RevertReason {
                    code: err.error.error_code().to_string(),
                    message: err.error.to_string(),
                    phase: err.phase,
                });
            }
        }
        state.commit();
        fhe.commit();

        PendingCall::included(receipt)
    }
}

impl Default for MockFleetClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FleetReader for MockFleetClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn ship_of(&self, pilot: Address) -> Result<TokenId> {
        Ok(self.chain().state.ship_of(&pilot))
    }

    async fn attack_power(&self, token_id: TokenId) -> Result<EncryptedU32> {
        let power = self.chain().state.attack_power(token_id);
        Ok(power.map_err(runtime::LedgerError::from)?)
    }

    async fn last_attack_result(&self, token_id: TokenId) -> Result<EncryptedBool> {
        let result = self.chain().state.last_attack_result(token_id);
        Ok(result.map_err(runtime::LedgerError::from)?)
    }

    async fn total_supply(&self) -> Result<u64> {
        Ok(self.chain().state.total_supply())
    }
}

#[async_trait]
impl FleetWriter for MockFleetClient {
    async fn mint_ship(&self, wallet: &Wallet) -> Result<PendingCall> {
        Ok(self.execute(wallet, MintShip.into()))
    }

    async fn launch_attack(
        &self,
        wallet: &Wallet,
        token_id: TokenId,
        defense: Handle,
        input_proof: InputProof,
    ) -> Result<PendingCall> {
        Ok(self.execute(wallet, LaunchAttack::new(token_id, defense, input_proof).into()))
    }
}

impl FleetContract for MockFleetClient {
    fn name(&self) -> &str {
        "CipherverseFleet"
    }

    fn network(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl FhevmInstance for MockFleetClient {
    fn chain_id(&self) -> u64 {
        self.chain().fhe.chain_id()
    }

    fn is_ready(&self) -> bool {
        self.relayer_ready.load(Ordering::SeqCst)
    }

    async fn user_decrypt(&self, request: UserDecryptRequest) -> Result<BTreeMap<Handle, ClearValue>> {
        Ok(self.chain().fhe.user_decrypt(&request, Utc::now())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransportError;

    #[tokio::test]
    async fn mock_runs_registry_rules() {
        let mock = MockFleetClient::new();
        let pilot = Wallet::dev_account(1);

        let receipt = mock.mint_ship(&pilot).await.unwrap().wait().await.unwrap();
        assert!(receipt.is_success());
        assert_eq!(mock.ship_of(pilot.address()).await.unwrap(), TokenId(1));

        let again = mock.mint_ship(&pilot).await.unwrap().wait().await.unwrap();
        assert_eq!(again.status, TxStatus::Reverted);
        assert_eq!(mock.total_supply().await.unwrap(), 1);
        assert_eq!(mock.block_number(), 2);
    }

    #[tokio::test]
    async fn relayer_readiness_gates_decryption() {
        let mock = MockFleetClient::new();
        let pilot = Wallet::dev_account(1);
        mock.mint_ship(&pilot).await.unwrap().confirmed().await.unwrap();
        let power = mock.attack_power(TokenId(1)).await.unwrap();

        mock.set_relayer_ready(false);
        let err = mock
            .user_decrypt_euint(&pilot, power.handle(), mock.address())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::RelayerUnready));

        mock.set_relayer_ready(true);
        let clear = mock
            .user_decrypt_euint(&pilot, power.handle(), mock.address())
            .await
            .unwrap();
        assert_eq!(clear, 100);
    }
}
