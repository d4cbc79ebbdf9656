//! Registry tasks run by the `fleet` binary.
//!
//! Every task writes its report to `out` and returns an error for the
//! binary to print when the task cannot complete.
mod attack;
mod deploy;
mod ship;
mod status;

use std::io::Write;

use anyhow::{Context, Result, bail};
use client_blockchain_core::{Address, PendingCall, Receipt};
use client_bootstrap::RuntimeSetup;

use crate::cli::Command;

pub use attack::launch_attack;
pub use deploy::{address, deploy};
pub use ship::{decrypt_attack, mint_ship};
pub use status::status;

/// Dispatches a parsed command.
pub async fn run(
    setup: &RuntimeSetup,
    contract: Option<Address>,
    command: &Command,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Deploy { force } => deploy(setup, *force, out).await,
        Command::Address => address(setup, contract, out),
        Command::MintShip => mint_ship(setup, contract, out).await,
        Command::DecryptAttack => decrypt_attack(setup, contract, out).await,
        Command::LaunchAttack { defense } => launch_attack(setup, contract, defense, out).await,
        Command::Status { decrypt } => status(setup, contract, *decrypt, out).await,
    }
}

/// Runs `command`, then stops the ledger runtime.
///
/// A task error is returned ahead of a flush or shutdown failure, which is
/// then only logged.
pub async fn run_to_completion(
    setup: RuntimeSetup,
    contract: Option<Address>,
    command: &Command,
    out: &mut impl Write,
) -> Result<()> {
    let outcome = run(&setup, contract, command, out).await;
    let flushed = out.flush();
    let shutdown = setup.runtime.shutdown().await;

    if let Err(err) = outcome {
        if let Err(shutdown_err) = &shutdown {
            tracing::error!("ledger shutdown failed: {shutdown_err}");
        }
        return Err(err);
    }
    flushed?;
    shutdown.context("ledger shutdown failed")?;
    Ok(())
}

/// Prints the inclusion lines for a transaction and fails on a revert.
async fn await_receipt(pending: PendingCall, out: &mut impl Write) -> Result<Receipt> {
    let hash = pending.hash();
    writeln!(out, "Wait for tx:{hash}...")?;

    let receipt = pending.wait().await?;
    writeln!(out, "tx:{hash} status={}", receipt.status.code())?;

    if !receipt.is_success() {
        match &receipt.revert_reason {
            Some(reason) => bail!("transaction {hash} reverted: {reason}"),
            None => bail!("transaction {hash} reverted"),
        }
    }
    Ok(receipt)
}
