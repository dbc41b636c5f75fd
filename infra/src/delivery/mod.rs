//! Delivery factor implementations.

pub mod console;

pub use console::{mask_contact, ConsoleDelivery};
