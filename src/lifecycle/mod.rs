//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load settings → Read credentials → Open stores → Wire router → Orchestrator
//!
//! Run (orchestrator.rs):
//!     channel activity ─┐
//!                       ├─ supervised side by side, failures isolated
//!     worker activity ──┘  (started after a fixed delay, restarted when the
//!                           proxy list changes while it runs)
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → stop channel → stop worker → exit
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: the channel stops taking commands before the worker stops
//! - Best effort: no forced termination, no deadline

pub mod orchestrator;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use orchestrator::Orchestrator;
pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{assemble, StartupError};
