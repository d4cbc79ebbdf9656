//! Utilities for reacting to ledger events inside UI layers.
use runtime::Event;

use crate::message::MessageLog;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventImpact {
    /// Registry state shown on the panel may be stale.
    pub requires_refresh: bool,
}

impl EventImpact {
    pub const fn none() -> Self {
        Self {
            requires_refresh: false,
        }
    }

    pub const fn refresh() -> Self {
        Self {
            requires_refresh: true,
        }
    }

    pub fn combine(self, other: Self) -> Self {
        Self {
            requires_refresh: self.requires_refresh || other.requires_refresh,
        }
    }
}

pub trait EventConsumer {
    fn on_event(&mut self, event: &Event) -> EventImpact;
    fn message_log(&self) -> &MessageLog;
    fn message_log_mut(&mut self) -> &mut MessageLog;
}
