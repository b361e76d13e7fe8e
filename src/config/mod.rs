//! Runtime settings subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CLI overrides (main.rs)
//!     → ControlSettings (validated, immutable)
//!
//! environment (.env, process env)
//!     → loader.rs Credentials (bot token, admin set)
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded
//! - All fields have defaults to allow a missing settings file
//! - Secrets never live in the settings file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, Credentials, CredentialsError, SettingsError};
pub use schema::{ControlSettings, ObservabilitySettings, StorageSettings, TelegramSettings, WorkerSettings};
