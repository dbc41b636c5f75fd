//! Contact profile value object.

use serde::{Deserialize, Serialize};

/// Per-identity contact metadata resolved from the caller's profile
///
/// The engine only reads this shape; it is maintained by the integrating
/// application under the engine's configured profile namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactProfile {
    /// Address to deliver tokens to, e.g. a phone number or email address
    pub contact: String,

    /// Name of the delivery factor to use, e.g. "email" or "sms"
    pub factor: String,
}

impl ContactProfile {
    /// Creates a new contact profile
    pub fn new(contact: impl Into<String>, factor: impl Into<String>) -> Self {
        Self {
            contact: contact.into(),
            factor: factor.into(),
        }
    }

    /// Checks that both fields are present and non-empty
    ///
    /// A profile failing this check is treated the same as a missing one.
    pub fn is_well_formed(&self) -> bool {
        !self.contact.is_empty() && !self.factor.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_profile() {
        let profile = ContactProfile::new("+61412345678", "sms");
        assert!(profile.is_well_formed());
    }

    #[test]
    fn test_malformed_profile() {
        assert!(!ContactProfile::new("", "sms").is_well_formed());
        assert!(!ContactProfile::new("+61412345678", "").is_well_formed());
    }

    #[test]
    fn test_deserialize_shape() {
        let profile: ContactProfile =
            serde_json::from_str(r#"{"contact":"alice@example.com","factor":"email"}"#).unwrap();
        assert_eq!(profile.contact, "alice@example.com");
        assert_eq!(profile.factor, "email");
    }
}
