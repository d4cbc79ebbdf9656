//! Session flows against the in-memory registry.

use std::sync::Arc;

use client_blockchain_core::{FleetReader, MockFleetClient, TokenId, TxHash, Wallet};
use client_frontend_core::{
    EventConsumer, FleetSession, FrontendConfig, FrontendError, MessageLevel, RelayerState,
};
use fleet_core::{Address, FleetEvent};
use runtime::{ContractEvent, Event};

fn session() -> (FleetSession, MockFleetClient) {
    let mock = MockFleetClient::new();
    let mut session = FleetSession::new(Arc::new(mock.clone()), &FrontendConfig::default());
    session.relayer_ready(Arc::new(mock.clone()));
    (session, mock)
}

#[tokio::test]
async fn mint_and_decrypt_power() {
    let (mut session, _) = session();
    session.connect(Wallet::dev_account(1));
    session.refresh().await.unwrap();
    assert_eq!(session.frame().spaceship.value, "No ship minted");

    let token_id = session.mint_ship().await.unwrap();
    assert_eq!(token_id, TokenId(1));

    let frame = session.frame();
    assert_eq!(frame.mint_message.as_deref(), Some("Spaceship successfully minted!"));
    assert_eq!(frame.spaceship.value, "Token #1");
    assert_eq!(frame.spaceship.helper, "Fleet supply: 1");
    assert_eq!(frame.mint_button.label, "Spaceship minted");
    assert_eq!(frame.last_attack.value, "No attacks yet");

    assert_eq!(session.decrypt_power().await.unwrap(), Some(100));
    assert_eq!(session.frame().attack_power.button.label, "Decrypted: 100");
}

#[tokio::test]
async fn second_mint_reverts_and_session_stays_usable() {
    let (mut session, mock) = session();
    let pilot = Wallet::dev_account(1);
    session.connect(pilot.clone());

    session.mint_ship().await.unwrap();
    let err = session.mint_ship().await.unwrap_err();
    assert!(matches!(err, FrontendError::MintReverted));
    assert_eq!(
        session.frame().mint_error.as_deref(),
        Some("Mint transaction reverted")
    );

    assert_eq!(mock.total_supply().await.unwrap(), 1);
    assert_eq!(session.decrypt_power().await.unwrap(), Some(100));
}

#[tokio::test]
async fn attacks_overwrite_last_result() {
    let (mut session, _) = session();
    session.connect(Wallet::dev_account(2));
    session.mint_ship().await.unwrap();

    assert_eq!(session.decrypt_last_result().await.unwrap(), None);

    for (defense, expected) in [("60", false), ("160", true), ("100", true), ("99", false)] {
        session.set_defense_input(defense);
        session.launch_attack().await.unwrap();
        assert!(session.state().defense_input.is_empty());
        assert_eq!(session.decrypt_last_result().await.unwrap(), Some(expected));
    }

    let frame = session.frame();
    assert_eq!(frame.last_attack.button.label, "Failed");
    assert_eq!(frame.spaceship.helper, "Fleet supply: 1");
}

#[tokio::test]
async fn attack_input_is_validated() {
    let (mut session, _) = session();
    session.connect(Wallet::dev_account(3));

    session.set_defense_input("60");
    assert!(matches!(
        session.launch_attack().await,
        Err(FrontendError::NoShip)
    ));
    assert_eq!(
        session.frame().attack_error.as_deref(),
        Some("Mint your spaceship before launching an attack")
    );

    session.mint_ship().await.unwrap();
    for bad in ["-5", "abc", "1.5"] {
        session.set_defense_input(bad);
        assert!(matches!(
            session.launch_attack().await,
            Err(FrontendError::InvalidDefense)
        ));
    }
    assert_eq!(
        session.frame().attack_error.as_deref(),
        Some("Defense value must be a non-negative integer")
    );
}

#[tokio::test]
async fn wallet_and_relayer_preconditions() {
    let mock = MockFleetClient::new();
    let mut session = FleetSession::new(Arc::new(mock.clone()), &FrontendConfig::default());
    assert_eq!(
        session.frame().relayer_status,
        "Initializing Zama FHE relayer..."
    );

    let err = session.mint_ship().await.unwrap_err();
    assert_eq!(err.to_string(), "Connect your wallet to continue");

    let pilot = Wallet::dev_account(4);
    session.connect_read_only(pilot.address());
    let err = session.mint_ship().await.unwrap_err();
    assert_eq!(err.to_string(), "Wallet signer unavailable");

    session.connect(pilot);
    session.mint_ship().await.unwrap();
    let err = session.decrypt_power().await.unwrap_err();
    assert_eq!(err.to_string(), "Encryption service not ready yet");

    session.relayer_failed("relayer offline");
    assert_eq!(session.frame().relayer_status, "relayer offline");
    assert!(matches!(session.relayer(), RelayerState::Failed(_)));

    session.relayer_ready(Arc::new(mock));
    assert_eq!(
        session.frame().relayer_status,
        "Relayer ready for encrypted operations"
    );
    assert_eq!(session.decrypt_power().await.unwrap(), Some(100));
}

#[tokio::test]
async fn switching_wallet_resets_pilot_view() {
    let (mut session, _) = session();
    session.connect(Wallet::dev_account(5));
    session.mint_ship().await.unwrap();
    session.decrypt_power().await.unwrap();

    session.connect(Wallet::dev_account(6));
    session.refresh().await.unwrap();

    let frame = session.frame();
    assert_eq!(frame.spaceship.value, "No ship minted");
    assert_eq!(frame.attack_power.button.label, "Decrypt power");
    assert_eq!(frame.spaceship.helper, "Fleet supply: 1");

    session.disconnect();
    assert_eq!(session.frame().pilot.value, "Wallet disconnected");
}

#[tokio::test]
async fn frames_are_published_to_watchers() {
    let (mut session, _) = session();
    let mut frames = session.subscribe();

    session.connect(Wallet::dev_account(7));
    session.mint_ship().await.unwrap();

    assert!(frames.has_changed().unwrap());
    let latest = frames.borrow_and_update().clone();
    assert_eq!(latest.spaceship.value, "Token #1");
    assert_eq!(latest.mint_button.label, "Spaceship minted");
}

#[tokio::test]
async fn registry_events_are_logged() {
    let (mut session, _) = session();
    let pilot = Wallet::dev_account(8).address();

    let minted = Event::Contract(ContractEvent {
        contract: MockFleetClient::ADDRESS,
        block_number: 4,
        tx_hash: TxHash([0x01; 32]),
        event: FleetEvent::ShipMinted {
            pilot,
            token_id: TokenId(2),
        },
    });
    assert!(session.on_event(&minted).requires_refresh);

    let entry = session.message_log().iter().last().unwrap();
    assert_eq!(entry.text, format!("Spaceship #2 minted by {pilot}"));
    assert_eq!(entry.block, Some(4));
    assert_eq!(entry.level, MessageLevel::Info);

    let elsewhere = Event::Contract(ContractEvent {
        contract: Address([0x99; 20]),
        block_number: 5,
        tx_hash: TxHash([0x02; 32]),
        event: FleetEvent::ShipMinted {
            pilot,
            token_id: TokenId(1),
        },
    });
    assert!(!session.on_event(&elsewhere).requires_refresh);
}

#[tokio::test]
async fn replayed_history_fills_the_log_in_order() {
    let (mut session, _) = session();
    let pilot = Wallet::dev_account(8).address();
    let event = |block_number: u64, contract: Address, token_id: u64| ContractEvent {
        contract,
        block_number,
        tx_hash: TxHash([block_number as u8; 32]),
        event: FleetEvent::ShipMinted {
            pilot,
            token_id: TokenId(token_id),
        },
    };

    let impact = session.replay([
        event(2, MockFleetClient::ADDRESS, 1),
        event(3, Address([0x99; 20]), 1),
        event(4, MockFleetClient::ADDRESS, 2),
    ]);
    assert!(impact.requires_refresh);

    let blocks: Vec<_> = session.frame().messages.iter().map(|entry| entry.block).collect();
    assert_eq!(blocks, vec![Some(2), Some(4)]);

    assert!(!session.replay([event(5, Address([0x99; 20]), 3)]).requires_refresh);
    assert!(!session.replay(Vec::new()).requires_refresh);
}
