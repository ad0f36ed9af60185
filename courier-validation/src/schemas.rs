// Common field rules and schemas

use crate::sanitize::{lowercase_trim, strip_phone_separators};
use crate::{FieldRule, ValidationSchema};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$").unwrap()
});

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_]+$").unwrap());

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").unwrap());

/// Minimum number of strength criteria a password must meet.
pub const MIN_PASSWORD_SCORE: u8 = 4;

/// Which strength criteria a password meets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordStrength {
    pub min_length: bool,
    pub lowercase: bool,
    pub uppercase: bool,
    pub digit: bool,
    pub special: bool,
}

impl PasswordStrength {
    /// Number of criteria met, 0..=5.
    pub fn score(&self) -> u8 {
        [
            self.min_length,
            self.lowercase,
            self.uppercase,
            self.digit,
            self.special,
        ]
        .into_iter()
        .filter(|met| *met)
        .count() as u8
    }

    pub fn is_strong(&self) -> bool {
        self.score() >= MIN_PASSWORD_SCORE
    }
}

pub fn password_strength(password: &str) -> PasswordStrength {
    PasswordStrength {
        min_length: password.chars().count() >= 8,
        lowercase: password.chars().any(|c| c.is_lowercase()),
        uppercase: password.chars().any(|c| c.is_uppercase()),
        digit: password.chars().any(|c| c.is_ascii_digit()),
        special: password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
    }
}

/// Prebuilt rules for fields shared by the auth and user flows.
pub struct CommonSchemas;

impl CommonSchemas {
    pub fn email() -> FieldRule {
        FieldRule::for_field("email")
            .required()
            .max_length(254)
            .pattern(EMAIL_REGEX.clone(), "Please enter a valid email address")
            .sanitize(lowercase_trim)
    }

    pub fn username() -> FieldRule {
        FieldRule::for_field("username")
            .required()
            .length(3, 20)
            .pattern(
                USERNAME_REGEX.clone(),
                "Username can only contain lowercase letters, numbers and underscores",
            )
            .sanitize(lowercase_trim)
    }

    /// Password with the strength rule; passwords are never sanitized.
    pub fn password() -> FieldRule {
        FieldRule::for_field("password")
            .required()
            .min_length(8)
            .custom(|value| match value.as_str() {
                Some(password) if password_strength(password).is_strong() => Ok(()),
                _ => Err(
                    "Password must contain at least 4 of: 8+ characters, lowercase, uppercase, number, special character"
                        .to_string(),
                ),
            })
            .sanitize(Value::clone)
    }

    pub fn phone() -> FieldRule {
        FieldRule::for_field("phone")
            .pattern(PHONE_REGEX.clone(), "Please enter a valid phone number")
            .sanitize(strip_phone_separators)
    }

    pub fn first_name() -> FieldRule {
        FieldRule::for_field("firstName").required().length(1, 50)
    }

    pub fn last_name() -> FieldRule {
        FieldRule::for_field("lastName").required().length(1, 50)
    }

    pub fn otp() -> FieldRule {
        FieldRule::for_field("otp")
            .required()
            .length(6, 6)
            .custom(|value| match value.as_str() {
                Some(otp) if otp.chars().all(|c| c.is_ascii_digit()) => Ok(()),
                _ => Err("Code must be 6 digits".to_string()),
            })
    }

    /// Email and password, without the strength rule.
    pub fn login() -> ValidationSchema {
        ValidationSchema::new().field(Self::email()).field(
            FieldRule::for_field("password")
                .required()
                .sanitize(Value::clone),
        )
    }

    pub fn register() -> ValidationSchema {
        ValidationSchema::new()
            .field(Self::email())
            .field(Self::username())
            .field(Self::password())
            .field(Self::first_name())
            .field(Self::last_name())
            .field(Self::phone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_strength() {
        assert_eq!(password_strength("Abcdef1!").score(), 5);
        assert!(password_strength("Abcdef1!").is_strong());
        assert_eq!(password_strength("abcdefgh").score(), 2);
        assert!(!password_strength("abcdefgh").is_strong());
        assert!(password_strength("abcdef1!").is_strong());
        assert_eq!(password_strength("").score(), 0);
    }

    #[test]
    fn test_patterns() {
        assert!(EMAIL_REGEX.is_match("test@example.com"));
        assert!(!EMAIL_REGEX.is_match("test@localhost"));
        assert!(USERNAME_REGEX.is_match("john_doe42"));
        assert!(!USERNAME_REGEX.is_match("John-Doe"));
        assert!(PHONE_REGEX.is_match("+15551234567"));
        assert!(!PHONE_REGEX.is_match("12345"));
    }
}
