//! Security subsystem.
//!
//! # Responsibilities
//! - Admin identity set, loaded once and frozen
//! - Authorization gate applied to every inbound command
//!
//! # Design Decisions
//! - Binary model: admin or not, no per-command permissions
//! - Fail closed: unknown and malformed identities are treated alike

pub mod auth;

pub use auth::{AdminSet, AdminSetError, AuthorizationGate, REFUSAL};
