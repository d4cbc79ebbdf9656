//! Topic-based event bus for ledger events.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{ContractEvent, DeploymentEvent, TransactionEvent};
