//! One-time token generation.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};

use crate::domain::entities::session::DEFAULT_TOKEN_LENGTH;

/// Pluggable source of one-time tokens
///
/// Tokens must be unpredictable to an adversary who does not control the
/// delivery channel, so implementations should draw from a CSPRNG rather
/// than a general-purpose generator.
pub trait TokenGenerator: Send + Sync {
    /// Produce a fresh token
    fn generate(&self) -> String;
}

/// Default generator: fixed-length alphanumeric codes from the OS CSPRNG
pub struct SecureTokenGenerator {
    length: usize,
}

impl SecureTokenGenerator {
    /// Create a generator producing codes of `length` characters
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for SecureTokenGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_LENGTH)
    }
}

impl TokenGenerator for SecureTokenGenerator {
    fn generate(&self) -> String {
        OsRng
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

/// Decimal OTP generator for channels that want digit-only codes
pub struct NumericTokenGenerator {
    length: usize,
}

impl NumericTokenGenerator {
    /// Create a generator producing codes of `length` digits
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for NumericTokenGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_LENGTH)
    }
}

impl TokenGenerator for NumericTokenGenerator {
    fn generate(&self) -> String {
        let mut rng = OsRng;
        (0..self.length)
            .map(|_| {
                let mut bytes = [0u8; 4];
                rng.fill_bytes(&mut bytes);
                // Modulo bias over 10 values is negligible for u32 input.
                let digit = u32::from_le_bytes(bytes) % 10;
                char::from_digit(digit, 10).unwrap_or('0')
            })
            .collect()
    }
}
