//! # TokenAffirm Core
//!
//! Core verification engine and domain layer for TokenAffirm, a
//! challenge-response session manager for step-up confirmation flows.
//! This crate contains the session entity, the verification engine, the
//! request governor, the session-store abstraction, and error types.
//! Transport bindings and real delivery channels live outside this crate.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
