//! Pilot session: wallet and relayer state plus the panel flows.
//!
//! Every flow records its outcome on the panel (success message or error
//! text) and also returns it, so the session stays usable after a failure.
//! A fresh [`PanelFrame`] is published after each state change for
//! renderers that watch the session from another task.
use std::sync::Arc;

use client_blockchain_core::{
    Address, ClearValue, FhevmInstance, FleetContract, Handle, TokenId, TransportError, Wallet,
};
use fleet_core::FleetEvent;
use runtime::{ContractEvent, Event};
use tokio::sync::watch;

use crate::config::FrontendConfig;
use crate::error::FrontendError;
use crate::event::{EventConsumer, EventImpact};
use crate::message::{MessageEntry, MessageLevel, MessageLog};
use crate::view_model::{Busy, PanelFrame, PanelState, Tab};

const MESSAGE_LIMIT: usize = 8;

/// Encryption relayer lifecycle.
#[derive(Clone)]
pub enum RelayerState {
    Initializing,
    Ready(Arc<dyn FhevmInstance>),
    Failed(String),
}

impl RelayerState {
    pub fn status_message(&self) -> &str {
        match self {
            Self::Initializing => "Initializing Zama FHE relayer...",
            Self::Failed(message) => message,
            Self::Ready(_) => "Relayer ready for encrypted operations",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(instance) if instance.is_ready())
    }
}

pub struct FleetSession {
    fleet: Arc<dyn FleetContract>,
    relayer: RelayerState,
    account: Option<Address>,
    signer: Option<Wallet>,
    state: PanelState,
    messages: MessageLog,
    show_tx_hashes: bool,
    frames: watch::Sender<PanelFrame>,
}

impl FleetSession {
    pub fn new(fleet: Arc<dyn FleetContract>, config: &FrontendConfig) -> Self {
        let state = PanelState::default();
        let messages = MessageLog::new(config.messages.capacity);
        let relayer = RelayerState::Initializing;
        let frame = PanelFrame::build(
            &state,
            None,
            relayer.status_message(),
            false,
            &messages,
            MESSAGE_LIMIT,
        );
        let (frames, _) = watch::channel(frame);

        Self {
            fleet,
            relayer,
            account: None,
            signer: None,
            state,
            messages,
            show_tx_hashes: config.messages.show_tx_hashes,
            frames,
        }
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn relayer(&self) -> &RelayerState {
        &self.relayer
    }

    pub fn frame(&self) -> PanelFrame {
        PanelFrame::build(
            &self.state,
            self.account,
            self.relayer.status_message(),
            self.relayer.is_ready(),
            &self.messages,
            MESSAGE_LIMIT,
        )
    }

    /// Receives a new frame after every state change.
    pub fn subscribe(&self) -> watch::Receiver<PanelFrame> {
        self.frames.subscribe()
    }

    fn publish(&self) {
        self.frames.send_replace(self.frame());
    }

    pub fn relayer_ready(&mut self, instance: Arc<dyn FhevmInstance>) {
        self.relayer = RelayerState::Ready(instance);
        self.publish();
    }

    pub fn relayer_failed(&mut self, message: impl Into<String>) {
        self.relayer = RelayerState::Failed(message.into());
        self.publish();
    }

    /// Connects a wallet able to sign.
    pub fn connect(&mut self, wallet: Wallet) {
        self.switch_account(Some(wallet.address()));
        self.signer = Some(wallet);
        self.publish();
    }

    /// Connects an account without a signer; writes and decryption fail with
    /// [`FrontendError::SignerUnavailable`].
    pub fn connect_read_only(&mut self, address: Address) {
        self.switch_account(Some(address));
        self.signer = None;
        self.publish();
    }

    pub fn disconnect(&mut self) {
        self.switch_account(None);
        self.signer = None;
        self.publish();
    }

    fn switch_account(&mut self, account: Option<Address>) {
        if self.account != account {
            self.state.clear_pilot();
        }
        self.account = account;
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.state.active_tab = tab;
        self.publish();
    }

    pub fn set_defense_input(&mut self, input: impl Into<String>) {
        self.state.defense_input = input.into();
        self.publish();
    }

    /// Re-reads the registry for the connected pilot.
    pub async fn refresh(&mut self) -> Result<(), FrontendError> {
        self.state.total_supply = self.fleet.total_supply().await?;

        let ship_id = match self.account {
            Some(account) => self.fleet.ship_of(account).await?,
            None => TokenId::NONE,
        };
        if ship_id != self.state.ship_id {
            self.state.decrypted_power = None;
            self.state.decrypted_result = None;
        }
        self.state.ship_id = ship_id;

        if ship_id.is_some() {
            let power = self.fleet.attack_power(ship_id).await?;
            let result = self.fleet.last_attack_result(ship_id).await?;
            if self.state.encrypted_result != Some(result) {
                self.state.decrypted_result = None;
            }
            self.state.encrypted_power = Some(power);
            self.state.encrypted_result = Some(result);
        } else {
            self.state.encrypted_power = None;
            self.state.encrypted_result = None;
        }

        self.publish();
        Ok(())
    }

    fn require_signer(&self) -> Result<Wallet, FrontendError> {
        if self.account.is_none() {
            return Err(FrontendError::WalletUnavailable);
        }
        self.signer.clone().ok_or(FrontendError::SignerUnavailable)
    }

    fn require_instance(&self) -> Result<Arc<dyn FhevmInstance>, FrontendError> {
        match &self.relayer {
            RelayerState::Ready(instance) if instance.is_ready() => Ok(Arc::clone(instance)),
            _ => Err(FrontendError::RelayerUnready),
        }
    }

    fn begin(&mut self, flag: Busy) {
        self.state.busy.insert(flag);
        self.publish();
    }

    fn end(&mut self, flag: Busy) {
        self.state.busy.remove(flag);
        self.publish();
    }

    fn log(&mut self, text: impl Into<String>, level: MessageLevel) {
        self.messages.push(MessageEntry::new(text, None, level));
    }

    /// `mintShip()` for the connected pilot.
    pub async fn mint_ship(&mut self) -> Result<TokenId, FrontendError> {
        self.state.mint_error = None;
        self.state.mint_message = None;
        self.begin(Busy::MINTING);

        let outcome = self.try_mint().await;
        match &outcome {
            Ok(_) => {
                self.state.mint_message = Some("Spaceship successfully minted!".to_string());
                self.log("Spaceship successfully minted!", MessageLevel::Success);
            }
            Err(err) => {
                self.state.mint_error = Some(err.to_string());
                self.log(err.to_string(), MessageLevel::Error);
            }
        }

        self.end(Busy::MINTING);
        outcome
    }

    async fn try_mint(&mut self) -> Result<TokenId, FrontendError> {
        let signer = self.require_signer()?;
        let pending = self.fleet.mint_ship(&signer).await?;

        let waiting = format!("Waiting for confirmation: {}", pending.hash());
        if self.show_tx_hashes {
            self.log(waiting.clone(), MessageLevel::Info);
        }
        self.state.mint_message = Some(waiting);
        self.publish();

        let receipt = pending.wait().await?;
        if !receipt.is_success() {
            tracing::warn!(hash = %receipt.tx_hash, reason = ?receipt.revert_reason, "mint reverted");
            return Err(FrontendError::MintReverted);
        }

        self.state.decrypted_power = None;
        self.state.decrypted_result = None;
        self.refresh().await?;
        Ok(self.state.ship_id)
    }

    /// Decrypts the ship's attack power. `Ok(None)` when there is nothing
    /// to decrypt yet.
    pub async fn decrypt_power(&mut self) -> Result<Option<u32>, FrontendError> {
        let Some(power) = self.state.encrypted_power else {
            return Ok(None);
        };
        if self.account.is_none() || !self.state.has_ship() {
            return Ok(None);
        }

        self.begin(Busy::DECRYPTING_POWER);
        let outcome = self
            .decrypt(power.handle(), FrontendError::PowerMissing)
            .await
            .and_then(|value| value.as_u32().ok_or(FrontendError::PowerMissing));

        match &outcome {
            Ok(value) => self.state.decrypted_power = Some(*value),
            Err(err) => {
                self.state.mint_error = Some(err.to_string());
                self.log(err.to_string(), MessageLevel::Error);
            }
        }

        self.end(Busy::DECRYPTING_POWER);
        outcome.map(Some)
    }

    /// `launchAttack` with the defense value typed into the panel.
    pub async fn launch_attack(&mut self) -> Result<(), FrontendError> {
        if self.account.is_none() || !self.state.has_ship() {
            return Err(self.attack_failed(FrontendError::NoShip));
        }
        let Some(defense) = parse_defense(&self.state.defense_input) else {
            return Err(self.attack_failed(FrontendError::InvalidDefense));
        };

        self.state.attack_error = None;
        self.state.last_attack_tx = None;
        self.begin(Busy::ATTACKING);

        let outcome = self.try_attack(defense).await;
        match &outcome {
            Ok(()) => self.log(format!("Attack launched with defense {defense}"), MessageLevel::Success),
            Err(err) => {
                self.state.attack_error = Some(err.to_string());
                self.log(err.to_string(), MessageLevel::Error);
            }
        }

        self.end(Busy::ATTACKING);
        outcome
    }

    fn attack_failed(&mut self, err: FrontendError) -> FrontendError {
        self.state.attack_error = Some(err.to_string());
        self.publish();
        err
    }

    async fn try_attack(&mut self, defense: u32) -> Result<(), FrontendError> {
        let instance = self.require_instance()?;
        let signer = self.require_signer()?;

        let input = instance
            .create_encrypted_input(self.fleet.address(), signer.address())
            .add32(defense)
            .encrypt()
            .map_err(TransportError::from)?;
        let handle = input
            .handles
            .first()
            .copied()
            .ok_or_else(|| TransportError::NotFound("encrypted defense handle".to_string()))?;

        let pending = self
            .fleet
            .launch_attack(&signer, self.state.ship_id, handle, input.input_proof)
            .await?;
        self.state.last_attack_tx = Some(pending.hash());
        if self.show_tx_hashes {
            self.log(format!("Waiting for confirmation: {}", pending.hash()), MessageLevel::Info);
        }
        self.publish();

        let receipt = pending.wait().await?;
        if !receipt.is_success() {
            tracing::warn!(hash = %receipt.tx_hash, reason = ?receipt.revert_reason, "attack reverted");
            return Err(FrontendError::AttackReverted);
        }

        self.state.defense_input.clear();
        self.state.last_attack_tx = None;
        self.state.decrypted_result = None;
        let result = self.fleet.last_attack_result(self.state.ship_id).await?;
        self.state.encrypted_result = Some(result);
        Ok(())
    }

    /// Decrypts the latest attack outcome. `Ok(None)` when the ship has not
    /// attacked yet.
    pub async fn decrypt_last_result(&mut self) -> Result<Option<bool>, FrontendError> {
        let Some(result) = self.state.encrypted_result else {
            return Ok(None);
        };
        if self.account.is_none() || !self.state.has_ship() || result.is_empty() {
            return Ok(None);
        }

        self.begin(Busy::DECRYPTING_RESULT);
        let outcome = self
            .decrypt(result.handle(), FrontendError::ResultMissing)
            .await
            .and_then(|value| value.as_bool().ok_or(FrontendError::ResultMissing));

        match &outcome {
            Ok(value) => self.state.decrypted_result = Some(*value),
            Err(err) => {
                self.state.attack_error = Some(err.to_string());
                self.log(err.to_string(), MessageLevel::Error);
            }
        }

        self.end(Busy::DECRYPTING_RESULT);
        outcome.map(Some)
    }

    async fn decrypt(&self, handle: Handle, missing: FrontendError) -> Result<ClearValue, FrontendError> {
        let instance = self.require_instance()?;
        let signer = self.require_signer()?;

        match instance
            .user_decrypt_handle(&signer, handle, self.fleet.address())
            .await
        {
            Ok(value) => Ok(value),
            Err(TransportError::NotFound(_)) => Err(missing),
            Err(err) => Err(err.into()),
        }
    }
}

impl FleetSession {
    /// Feeds recorded registry events through [`EventConsumer::on_event`],
    /// oldest first, so the message log shows activity from before the
    /// session started.
    pub fn replay(&mut self, history: impl IntoIterator<Item = ContractEvent>) -> EventImpact {
        history
            .into_iter()
            .fold(EventImpact::none(), |impact, event| {
                impact.combine(self.on_event(&Event::Contract(event)))
            })
    }
}

impl EventConsumer for FleetSession {
    fn on_event(&mut self, event: &Event) -> EventImpact {
        let Event::Contract(contract_event) = event else {
            return EventImpact::none();
        };
        if contract_event.contract != self.fleet.address() {
            return EventImpact::none();
        }

        let block = Some(contract_event.block_number);
        let text = match &contract_event.event {
            FleetEvent::ShipMinted { pilot, token_id } => {
                format!("Spaceship #{token_id} minted by {pilot}")
            }
            FleetEvent::AttackLaunched { token_id, .. } => {
                format!("Spaceship #{token_id} launched an attack")
            }
        };
        self.messages.push(MessageEntry::new(text, block, MessageLevel::Info));
        self.publish();

        EventImpact::refresh()
    }

    fn message_log(&self) -> &MessageLog {
        &self.messages
    }

    fn message_log_mut(&mut self) -> &mut MessageLog {
        &mut self.messages
    }
}

/// Non-negative integer that fits the encrypted `u32` input.
///
/// Only ASCII digits are accepted, so signs are rejected along with
/// fractions and exponents.
pub fn parse_defense(input: &str) -> Option<u32> {
    let digits = input.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok()
}
