//! Worker tasks that back the runtime orchestration.

mod ledger;

pub use ledger::{Command, LedgerWorker, Persistence};
