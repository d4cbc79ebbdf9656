//! Cross-frontend primitives for presenting the fleet.
//!
//! Houses the pilot session (wallet, relayer, mint/attack/decrypt flows), the
//! message log and the view-model frame any renderer can draw.
pub mod config;
pub mod error;
pub mod event;
pub mod message;
pub mod session;
pub mod view_model;

pub use config::{FrontendConfig, MessageConfig};
pub use error::FrontendError;
pub use event::{EventConsumer, EventImpact};
pub use message::{MessageEntry, MessageLevel, MessageLog};
pub use session::{FleetSession, RelayerState, parse_defense};
pub use view_model::{ButtonView, Busy, EncryptedCard, PanelFrame, PanelState, StatusCard, Tab};
