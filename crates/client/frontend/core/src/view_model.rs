//! View-model snapshots of the pilot panel.
//!
//! [`PanelState`] is what the session tracks; [`PanelFrame`] is the
//! render-ready text derived from it.
use bitflags::bitflags;
use client_blockchain_core::{Address, EncryptedBool, EncryptedU32, TokenId, TxHash};

use crate::message::{MessageEntry, MessageLog};

bitflags! {
    /// Operations currently in flight.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Busy: u8 {
        const MINTING = 1 << 0;
        const DECRYPTING_POWER = 1 << 1;
        const DECRYPTING_RESULT = 1 << 2;
        const ATTACKING = 1 << 3;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Hangar,
    Battle,
}

impl Tab {
    pub fn title(self) -> &'static str {
        match self {
            Tab::Hangar => "Hangar",
            Tab::Battle => "Battle Simulator",
        }
    }
}

/// Registry data and flow state for the connected pilot.
#[derive(Clone, Debug, Default)]
pub struct PanelState {
    pub ship_id: TokenId,
    pub total_supply: u64,
    pub encrypted_power: Option<EncryptedU32>,
    pub encrypted_result: Option<EncryptedBool>,
    pub decrypted_power: Option<u32>,
    pub decrypted_result: Option<bool>,
    pub busy: Busy,
    pub mint_message: Option<String>,
    pub mint_error: Option<String>,
    pub attack_error: Option<String>,
    pub last_attack_tx: Option<TxHash>,
    pub defense_input: String,
    pub active_tab: Tab,
}

impl PanelState {
    pub fn has_ship(&self) -> bool {
        self.ship_id.is_some()
    }

    /// Drops everything tied to a pilot, keeping fleet-wide data.
    pub fn clear_pilot(&mut self) {
        *self = Self {
            total_supply: self.total_supply,
            active_tab: self.active_tab,
            ..Self::default()
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusCard {
    pub label: &'static str,
    pub value: String,
    pub helper: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonView {
    pub label: String,
    pub enabled: bool,
}

impl ButtonView {
    fn new(label: impl Into<String>, enabled: bool) -> Self {
        Self {
            label: label.into(),
            enabled,
        }
    }
}

/// A card showing a ciphertext handle and its decrypt button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedCard {
    pub label: &'static str,
    pub value: String,
    pub button: ButtonView,
}

/// Render-ready snapshot of the whole panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelFrame {
    pub pilot: StatusCard,
    pub spaceship: StatusCard,
    pub attack_power: EncryptedCard,
    pub last_attack: EncryptedCard,
    pub relayer_status: String,
    pub active_tab: Tab,
    pub mint_button: ButtonView,
    pub mint_message: Option<String>,
    pub mint_error: Option<String>,
    pub attack_button: ButtonView,
    pub attack_notice: Option<String>,
    pub attack_error: Option<String>,
    pub messages: Vec<MessageEntry>,
}

impl PanelFrame {
    pub fn build(
        state: &PanelState,
        account: Option<Address>,
        relayer_status: &str,
        relayer_ready: bool,
        messages: &MessageLog,
        message_limit: usize,
    ) -> Self {
        let connected = account.is_some();
        let has_ship = state.has_ship();
        let busy = state.busy;

        let pilot = StatusCard {
            label: "Pilot Status",
            value: if connected { "Connected" } else { "Wallet disconnected" }.to_string(),
            helper: account.map_or_else(|| "Connect a wallet to begin".to_string(), |a| a.to_string()),
        };

        let spaceship = StatusCard {
            label: "Spaceship",
            value: if has_ship {
                format!("Token #{}", state.ship_id)
            } else {
                "No ship minted".to_string()
            },
            helper: format!("Fleet supply: {}", state.total_supply),
        };

        let power_label = if busy.contains(Busy::DECRYPTING_POWER) {
            "Decrypting...".to_string()
        } else if let Some(power) = state.decrypted_power {
            format!("Decrypted: {power}")
        } else {
            "Decrypt power".to_string()
        };
        let attack_power = EncryptedCard {
            label: "Attack Power (encrypted)",
            value: state
                .encrypted_power
                .map_or_else(|| "0x00".to_string(), |power| power.handle().to_string()),
            button: ButtonView::new(
                power_label,
                has_ship && !busy.contains(Busy::DECRYPTING_POWER) && relayer_ready && connected,
            ),
        };

        let attacked = state.encrypted_result.is_some_and(|result| !result.is_empty());
        let result_label = if busy.contains(Busy::DECRYPTING_RESULT) {
            "Decrypting..."
        } else {
            match state.decrypted_result {
                None => "Decrypt result",
                Some(true) => "Success",
                Some(false) => "Failed",
            }
        };
        let last_attack = EncryptedCard {
            label: "Last Attack Result",
            value: match state.encrypted_result {
                Some(result) if !result.is_empty() => result.handle().to_string(),
                _ => "No attacks yet".to_string(),
            },
            button: ButtonView::new(
                result_label,
                attacked && !busy.contains(Busy::DECRYPTING_RESULT) && relayer_ready && connected,
            ),
        };

        let mint_label = if has_ship {
            "Spaceship minted"
        } else if busy.contains(Busy::MINTING) {
            "Minting..."
        } else {
            "Mint my spaceship"
        };
        let mint_button = ButtonView::new(
            mint_label,
            !busy.contains(Busy::MINTING) && connected && !has_ship,
        );

        let attack_button = ButtonView::new(
            if busy.contains(Busy::ATTACKING) {
                "Engaging..."
            } else {
                "Launch attack"
            },
            has_ship && connected && !busy.contains(Busy::ATTACKING) && !state.defense_input.is_empty(),
        );

        Self {
            pilot,
            spaceship,
            attack_power,
            last_attack,
            relayer_status: relayer_status.to_string(),
            active_tab: state.active_tab,
            mint_button,
            mint_message: state.mint_message.clone(),
            mint_error: state.mint_error.clone(),
            attack_button,
            attack_notice: state
                .last_attack_tx
                .map(|hash| format!("Broadcasting attack transaction: {hash}")),
            attack_error: state.attack_error.clone(),
            messages: collect_messages(messages, message_limit),
        }
    }
}

fn collect_messages(log: &MessageLog, limit: usize) -> Vec<MessageEntry> {
    let mut messages: Vec<_> = log.recent(limit).cloned().collect();
    messages.reverse();
    messages
}

#[cfg(test)]
mod tests {
    use client_blockchain_core::Handle;

    use super::*;

    const PILOT: Address = Address([0x42; 20]);

    fn frame(state: &PanelState, account: Option<Address>) -> PanelFrame {
        PanelFrame::build(state, account, "ready", true, &MessageLog::new(4), 4)
    }

    #[test]
    fn disconnected_panel() {
        let frame = frame(&PanelState::default(), None);

        assert_eq!(frame.pilot.value, "Wallet disconnected");
        assert_eq!(frame.pilot.helper, "Connect a wallet to begin");
        assert_eq!(frame.spaceship.value, "No ship minted");
        assert_eq!(frame.spaceship.helper, "Fleet supply: 0");
        assert_eq!(frame.attack_power.value, "0x00");
        assert_eq!(frame.last_attack.value, "No attacks yet");
        assert!(!frame.mint_button.enabled);
        assert!(!frame.attack_power.button.enabled);
    }

    #[test]
    fn minted_ship_without_attacks() {
        let state = PanelState {
            ship_id: TokenId(3),
            total_supply: 3,
            encrypted_power: Some(EncryptedU32(Handle([0x11; 32]))),
            encrypted_result: Some(EncryptedBool::EMPTY),
            decrypted_power: Some(100),
            ..PanelState::default()
        };
        let frame = frame(&state, Some(PILOT));

        assert_eq!(frame.pilot.value, "Connected");
        assert_eq!(frame.spaceship.value, "Token #3");
        assert_eq!(frame.mint_button.label, "Spaceship minted");
        assert!(!frame.mint_button.enabled);
        assert_eq!(frame.attack_power.button.label, "Decrypted: 100");
        assert!(frame.attack_power.value.starts_with("0x1111"));
        assert_eq!(frame.last_attack.value, "No attacks yet");
        assert!(!frame.last_attack.button.enabled);
        assert!(!frame.attack_button.enabled);
    }

    #[test]
    fn busy_labels() {
        let mut state = PanelState {
            ship_id: TokenId(1),
            encrypted_result: Some(EncryptedBool(Handle([0x22; 32]))),
            defense_input: "60".to_string(),
            busy: Busy::ATTACKING | Busy::DECRYPTING_POWER | Busy::DECRYPTING_RESULT,
            ..PanelState::default()
        };
        let busy = frame(&state, Some(PILOT));
        assert_eq!(busy.attack_button.label, "Engaging...");
        assert_eq!(busy.attack_power.button.label, "Decrypting...");
        assert_eq!(busy.last_attack.button.label, "Decrypting...");
        assert!(!busy.attack_button.enabled);

        state.busy = Busy::empty();
        state.decrypted_result = Some(false);
        let idle = frame(&state, Some(PILOT));
        assert_eq!(idle.attack_button.label, "Launch attack");
        assert!(idle.attack_button.enabled);
        assert_eq!(idle.last_attack.button.label, "Failed");

        let mut minting = PanelState::default();
        minting.busy = Busy::MINTING;
        assert_eq!(frame(&minting, Some(PILOT)).mint_button.label, "Minting...");
    }

    #[test]
    fn clear_pilot_keeps_supply_and_tab() {
        let mut state = PanelState {
            ship_id: TokenId(2),
            total_supply: 5,
            decrypted_power: Some(100),
            active_tab: Tab::Battle,
            ..PanelState::default()
        };
        state.clear_pilot();

        assert!(!state.has_ship());
        assert_eq!(state.total_supply, 5);
        assert_eq!(state.decrypted_power, None);
        assert_eq!(state.active_tab, Tab::Battle);
    }
}
