//! Domain entities representing core verification objects.

pub mod contact;
pub mod session;

// Re-export commonly used types
pub use contact::ContactProfile;
pub use session::{
    Session, DEFAULT_EXPIRY_SECS, DEFAULT_RETAIN_SECS, DEFAULT_TOKEN_LENGTH,
};
