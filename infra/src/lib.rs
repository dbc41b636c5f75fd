//! # TokenAffirm Infrastructure
//!
//! Delivery channel adapters for the TokenAffirm verification engine.
//! Real channels (SMS gateways, mail providers, chat webhooks) plug in by
//! implementing `ta_core::DeliveryFactor`; this crate ships the console
//! adapter used in development and tests.

pub mod delivery;

pub use delivery::{mask_contact, ConsoleDelivery};
