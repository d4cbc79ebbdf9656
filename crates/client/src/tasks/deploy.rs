use std::io::Write;

use anyhow::Result;
use client_blockchain_core::{Address, FleetContract, FleetReader};
use client_bootstrap::RuntimeSetup;

/// Deploys the registry, reusing a live recorded deployment unless `force`.
pub async fn deploy(setup: &RuntimeSetup, force: bool, out: &mut impl Write) -> Result<()> {
    let outcome = setup.deploy(force).await?;
    let record = &outcome.record;

    if outcome.newly_deployed {
        writeln!(
            out,
            "deploying \"{}\" (tx: {})...: deployed at {} in block {}",
            record.contract_name, record.tx_hash, record.address, record.block_number
        )?;
    } else {
        writeln!(out, "reusing \"{}\" at {}", record.contract_name, record.address)?;
    }
    writeln!(out, "{} contract:  {}", record.contract_name, record.address)?;

    Ok(())
}

/// Prints the registry address.
pub fn address(setup: &RuntimeSetup, contract: Option<Address>, out: &mut impl Write) -> Result<()> {
    let fleet = setup.fleet(contract)?;
    writeln!(out, "{} address is {}", fleet.name(), fleet.address())?;
    Ok(())
}
