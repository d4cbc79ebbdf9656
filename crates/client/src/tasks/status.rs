use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use client_blockchain_core::{Address, FleetReader};
use client_bootstrap::RuntimeSetup;
use client_frontend_core::{EncryptedCard, FleetSession, FrontendConfig, PanelFrame, StatusCard};

const LABEL_WIDTH: usize = 26;

/// Renders the pilot panel for the configured wallet, followed by the
/// registry's recent activity. With `decrypt`, the attack power and last
/// attack result are decrypted first.
pub async fn status(
    setup: &RuntimeSetup,
    contract: Option<Address>,
    decrypt: bool,
    out: &mut impl Write,
) -> Result<()> {
    let fleet = setup.fleet(contract)?;
    let history = setup.handle().contract_events(&fleet.address());
    let mut session = FleetSession::new(Arc::new(fleet), &FrontendConfig::from_env());
    session.relayer_ready(Arc::new(setup.fhevm()));
    session.connect(setup.wallet.clone());

    let replayed = history.len();
    if session.replay(history).requires_refresh {
        tracing::debug!(replayed, "replayed registry events");
    }
    session.refresh().await?;

    if decrypt {
        session.decrypt_power().await?;
        session.decrypt_last_result().await?;
    }

    render(&session.frame(), out)
}

fn render(frame: &PanelFrame, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", frame.relayer_status)?;
    writeln!(out)?;
    status_card(&frame.pilot, out)?;
    status_card(&frame.spaceship, out)?;
    encrypted_card(&frame.attack_power, out)?;
    encrypted_card(&frame.last_attack, out)?;

    if !frame.messages.is_empty() {
        writeln!(out)?;
        writeln!(out, "Recent activity")?;
        for entry in &frame.messages {
            match entry.block {
                Some(block) => writeln!(out, "  block {block:<6}{}", entry.text)?,
                None => writeln!(out, "  {:<12}{}", "", entry.text)?,
            }
        }
    }
    Ok(())
}

fn status_card(card: &StatusCard, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{:<LABEL_WIDTH$}{}", card.label, card.value)?;
    writeln!(out, "{:<LABEL_WIDTH$}{}", "", card.helper)?;
    Ok(())
}

fn encrypted_card(card: &EncryptedCard, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{:<LABEL_WIDTH$}{}", card.label, card.value)?;
    writeln!(out, "{:<LABEL_WIDTH$}[{}]", "", card.button.label)?;
    Ok(())
}
