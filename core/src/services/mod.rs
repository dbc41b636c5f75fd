//! Business services containing the verification engine and its governor.

pub mod affirm;
pub mod governor;

// Re-export commonly used types
pub use affirm::{
    AffirmConfig, AffirmService, ContactResolver, DeliveryFactor, FactorEntry, FactorRegistry,
    NumericTokenGenerator, SecureTokenGenerator, TokenGenerator, OPERATIONS,
};
pub use governor::{FixedWindowGovernor, GovernorConfig, RequestGovernor};
