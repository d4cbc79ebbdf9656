use std::io::Write;

use anyhow::{Context, Result, anyhow, bail};
use client_blockchain_core::{Address, FhevmInstance, FleetContract, FleetReader, FleetWriter};
use client_bootstrap::RuntimeSetup;
use client_frontend_core::parse_defense;

use super::await_receipt;

/// Encrypts `defense`, attacks with the pilot's ship and decrypts the outcome.
pub async fn launch_attack(
    setup: &RuntimeSetup,
    contract: Option<Address>,
    defense: &str,
    out: &mut impl Write,
) -> Result<()> {
    let Some(value) = parse_defense(defense) else {
        bail!("Argument --defense must be a non-negative integer");
    };

    let fleet = setup.fleet(contract)?;
    writeln!(out, "{}: {}", fleet.name(), fleet.address())?;

    let pilot = &setup.wallet;
    let token_id = fleet.ship_of(pilot.address()).await?;
    if token_id.is_none() {
        bail!("Pilot has no spaceship. Run mint-ship first.");
    }

    let fhevm = setup.fhevm();
    let input = fhevm
        .create_encrypted_input(fleet.address(), pilot.address())
        .add32(value)
        .encrypt()
        .context("failed to encrypt defense value")?;
    let handle = input
        .handles
        .first()
        .copied()
        .ok_or_else(|| anyhow!("encrypted input has no handles"))?;

    let pending = fleet
        .launch_attack(pilot, token_id, handle, input.input_proof)
        .await?;
    await_receipt(pending, out).await?;

    let result = fleet.last_attack_result(token_id).await?;
    let success = fhevm
        .user_decrypt_ebool(pilot, result.handle(), fleet.address())
        .await?;
    tracing::info!(%token_id, success, "attack resolved");

    writeln!(out, "Encrypted result: {}", result.handle())?;
    writeln!(out, "Attack success  : {success}")?;
    Ok(())
}
