//! Cipherverse fleet command line client.
//!
//! The `fleet` binary is the composition root: it loads configuration,
//! assembles the local ledger through `client-bootstrap` and runs one task
//! against the registry. Task functions write their report to any
//! [`std::io::Write`] so they can be driven from tests.
pub mod cli;
pub mod logging;
pub mod tasks;

pub use cli::{Cli, Command};
