//! Domain layer containing the session entity and contact value object.

pub mod entities;

// Re-export commonly used domain types
pub use entities::*;
