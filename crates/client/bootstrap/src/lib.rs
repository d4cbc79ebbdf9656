//! Shared bootstrap utilities for client front-ends.
//!
//! Provides configuration loading, wallet selection, runtime assembly and
//! deployment lookup that the CLI tasks and any other front-end reuse.
pub mod builder;
pub mod config;

pub use builder::{DeployOutcome, RuntimeBuilder, RuntimeSetup};
pub use config::ClientConfig;
