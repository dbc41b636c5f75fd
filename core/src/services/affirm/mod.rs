//! Challenge-response verification engine
//!
//! This module provides the complete step-up confirmation workflow:
//! - one-time token generation and out-of-band delivery with timeout
//! - pending-session lifecycle with supersede-on-reissue
//! - single-shot verification with constant-time token comparison
//! - per-identity request throttling via the governor

mod config;
mod generator;
mod registry;
mod service;
mod traits;

#[cfg(test)]
mod tests;

pub use config::AffirmConfig;
pub use generator::{
    NumericTokenGenerator, SecureTokenGenerator, TokenGenerator,
};
pub use registry::{FactorEntry, FactorRegistry};
pub use service::{AffirmService, OPERATIONS};
pub use traits::{ContactResolver, DeliveryFactor};
