use std::io::Write;

use anyhow::Result;
use client_blockchain_core::{Address, FhevmInstance, FleetContract, FleetReader, FleetWriter};
use client_bootstrap::RuntimeSetup;

use super::await_receipt;

/// Mints a spaceship for the pilot unless they already own one.
pub async fn mint_ship(
    setup: &RuntimeSetup,
    contract: Option<Address>,
    out: &mut impl Write,
) -> Result<()> {
    let fleet = setup.fleet(contract)?;
    writeln!(out, "{}: {}", fleet.name(), fleet.address())?;

    let pilot = &setup.wallet;
    let existing = fleet.ship_of(pilot.address()).await?;
    if existing.is_some() {
        writeln!(out, "Pilot already owns spaceship tokenId {existing}.")?;
        return Ok(());
    }

    let pending = fleet.mint_ship(pilot).await?;
    await_receipt(pending, out).await?;

    let token_id = fleet.ship_of(pilot.address()).await?;
    tracing::info!(%token_id, pilot = %pilot.address(), "spaceship minted");
    writeln!(
        out,
        "Minted spaceship tokenId {token_id} for pilot {}",
        pilot.address()
    )?;
    Ok(())
}

/// Decrypts the pilot's attack power.
pub async fn decrypt_attack(
    setup: &RuntimeSetup,
    contract: Option<Address>,
    out: &mut impl Write,
) -> Result<()> {
    let fleet = setup.fleet(contract)?;
    writeln!(out, "{}: {}", fleet.name(), fleet.address())?;

    let pilot = &setup.wallet;
    let token_id = fleet.ship_of(pilot.address()).await?;
    if token_id.is_none() {
        writeln!(out, "No spaceship minted for this address.")?;
        return Ok(());
    }

    let power = fleet.attack_power(token_id).await?;
    let clear = setup
        .fhevm()
        .user_decrypt_euint(pilot, power.handle(), fleet.address())
        .await?;

    writeln!(out, "Spaceship tokenId : {token_id}")?;
    writeln!(out, "Encrypted power   : {}", power.handle())?;
    writeln!(out, "Clear attack power: {clear}")?;
    Ok(())
}
