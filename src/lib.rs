//! Telegram control bot for a background farming worker.

pub mod channel;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod store;
pub mod worker;

pub use config::ControlSettings;
pub use lifecycle::{Orchestrator, Shutdown};
pub use routing::CommandRouter;
