//! Contract and encryption-client traits.
//!
//! - [`FleetReader`]: the registry's view methods
//! - [`FleetWriter`]: the two state-changing calls
//! - [`FleetContract`]: composite of both, bound to one deployment
//! - [`FhevmInstance`]: client side of the encryption runtime

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use fhe::{
    ClearValue, DecryptionGrant, EncryptedInputBuilder, EphemeralKeypair, UserDecryptRequest,
};
use fleet_core::{Address, EncryptedBool, EncryptedU32, FheType, Handle, InputProof, TokenId};

use crate::error::{Result, TransportError};
use crate::types::PendingCall;
use crate::wallet::Wallet;

/// Read-only registry methods.
#[async_trait]
pub trait FleetReader: Send + Sync {
    /// Address of the registry this client is bound to.
    fn address(&self) -> Address;

    /// `shipOf(pilot)`: [`TokenId::NONE`] when the pilot has not minted.
    async fn ship_of(&self, pilot: Address) -> Result<TokenId>;

    async fn attack_power(&self, token_id: TokenId) -> Result<EncryptedU32>;

    /// Empty handle until the ship's first attack.
    async fn last_attack_result(&self, token_id: TokenId) -> Result<EncryptedBool>;

    async fn total_supply(&self) -> Result<u64>;
}

/// State-changing registry calls.
///
/// Both return as soon as the transaction is queued; await the
/// [`PendingCall`] before reading dependent state.
#[async_trait]
pub trait FleetWriter: Send + Sync {
    async fn mint_ship(&self, wallet: &Wallet) -> Result<PendingCall>;

    async fn launch_attack(
        &self,
        wallet: &Wallet,
        token_id: TokenId,
        defense: Handle,
        input_proof: InputProof,
    ) -> Result<PendingCall>;
}

/// Complete registry client.
pub trait FleetContract: FleetReader + FleetWriter + Send + Sync {
    /// Contract name, e.g. `CipherverseFleet`.
    fn name(&self) -> &str;

    /// Network the deployment lives on, e.g. `localhost`.
    fn network(&self) -> &str;
}

/// Client side of the encryption runtime (the relayer SDK instance).
#[async_trait]
pub trait FhevmInstance: Send + Sync {
    fn chain_id(&self) -> u64;

    /// Whether the relayer accepts requests.
    fn is_ready(&self) -> bool;

    /// Validity window requested for new grants.
    fn grant_duration_days(&self) -> u32 {
        DecryptionGrant::DEFAULT_DURATION_DAYS
    }

    fn create_encrypted_input(&self, contract: Address, user: Address) -> EncryptedInputBuilder {
        EncryptedInputBuilder::new(contract, user)
    }

    fn generate_keypair(&self) -> EphemeralKeypair {
        EphemeralKeypair::generate()
    }

    /// Builds a grant starting now for the given contracts.
    fn create_grant(&self, public_key: [u8; 32], contracts: Vec<Address>) -> Result<DecryptionGrant> {
        Ok(DecryptionGrant::new(
            public_key,
            contracts,
            Utc::now(),
            self.grant_duration_days(),
        )?)
    }

    /// Forwards a signed request and returns the clear values.
    async fn user_decrypt(&self, request: UserDecryptRequest) -> Result<BTreeMap<Handle, ClearValue>>;

    /// Full handshake for one handle: ephemeral keypair, grant, wallet
    /// signature, relayer round trip.
    async fn user_decrypt_handle(
        &self,
        wallet: &Wallet,
        handle: Handle,
        contract: Address,
    ) -> Result<ClearValue> {
        if !self.is_ready() {
            return Err(TransportError::RelayerUnready);
        }

        let keypair = self.generate_keypair();
        let grant = self.create_grant(keypair.public_key(), vec![contract])?;
        let signature = wallet.sign_grant(&grant, self.chain_id());

        let request = UserDecryptRequest {
            handles: vec![(handle, contract)],
            user: wallet.address(),
            grant,
            signer: wallet.public_key(),
            signature,
        };

        let mut values = self.user_decrypt(request).await?;
        values
            .remove(&handle)
            .ok_or_else(|| TransportError::NotFound(format!("clear value for {handle}")))
    }

    /// `userDecryptEuint(FhevmType.euint32, ...)`.
    async fn user_decrypt_euint(&self, wallet: &Wallet, handle: Handle, contract: Address) -> Result<u32> {
        let value = self.user_decrypt_handle(wallet, handle, contract).await?;
        value.as_u32().ok_or_else(|| {
            fhe::FheError::TypeMismatch {
                handle,
                expected: FheType::Uint32,
                found: value.fhe_type(),
            }
            .into()
        })
    }

    /// `userDecryptEbool(...)`.
    async fn user_decrypt_ebool(&self, wallet: &Wallet, handle: Handle, contract: Address) -> Result<bool> {
        let value = self.user_decrypt_handle(wallet, handle, contract).await?;
        value.as_bool().ok_or_else(|| {
            fhe::FheError::TypeMismatch {
                handle,
                expected: FheType::Bool,
                found: value.fhe_type(),
            }
            .into()
        })
    }
}
