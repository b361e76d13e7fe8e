//! Command routing subsystem.
//!
//! # Data Flow
//! ```text
//! InboundMessage
//!     → command.rs (classify: Command | UnknownCommand | DirectConfig | Ignored)
//!     → security::AuthorizationGate (every non-ignored message)
//!     → router.rs (handler per CommandKind)
//!     → input.rs (payload validation)
//!     → ConfigStore | ProxyStore | WorkerHandle
//!     → Reply
//! ```
//!
//! # Design Decisions
//! - Classification happens before authorization so plain chatter stays silent
//! - Each handled message yields exactly one reply
//! - No retries: a command is a single best-effort attempt

pub mod command;
pub mod error;
pub mod input;
pub mod replies;
pub mod router;

pub use command::{classify, Command, CommandKind, Inbound};
pub use error::{CommandError, ValidationError};
pub use router::{CommandRouter, Reply};
