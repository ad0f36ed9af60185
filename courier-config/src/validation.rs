// Configuration validation

use crate::{ConfigError, Result};

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Field-level checks shared by configuration types
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    /// Validate that a number is within range
    pub fn in_range<T: PartialOrd + std::fmt::Display>(
        value: T,
        min: T,
        max: T,
        field: &str,
    ) -> Result<()> {
        if value < min || value > max {
            return Err(ConfigError::ValidationError(format!(
                "{} must be between {} and {}, got {}",
                field, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate an absolute http(s) URL
    pub fn is_url(value: &str, field: &str) -> Result<()> {
        match url::Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
            _ => Err(ConfigError::ValidationError(format!(
                "{} must be a valid http(s) URL, got {:?}",
                field, value
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_empty() {
        assert!(ConfigValidator::not_empty("1.0.0", "app_version").is_ok());
        assert!(ConfigValidator::not_empty("  ", "app_version").is_err());
    }

    #[test]
    fn test_in_range() {
        assert!(ConfigValidator::in_range(3, 0, 10, "retries").is_ok());
        assert!(ConfigValidator::in_range(11, 0, 10, "retries").is_err());
    }

    #[test]
    fn test_is_url() {
        assert!(ConfigValidator::is_url("https://api.example.com/auth", "auth").is_ok());
        assert!(ConfigValidator::is_url("http://localhost:3000", "auth").is_ok());
        assert!(ConfigValidator::is_url("ftp://example.com", "auth").is_err());
        assert!(ConfigValidator::is_url("not a url", "auth").is_err());
    }
}
