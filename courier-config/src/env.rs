// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;

/// Default prefix for Courier environment variables.
pub const ENV_PREFIX: &str = "COURIER";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Loader for `COURIER_*` variables
    pub fn courier() -> Self {
        Self::new(Some(ENV_PREFIX.to_string()))
    }

    /// Load all matching variables from the process environment
    pub fn load(&self) -> HashMap<String, String> {
        self.filter(env::vars())
    }

    /// Keep variables carrying the prefix, keyed by the lowercased remainder.
    ///
    /// `COURIER_API_RETRIES=5` becomes `api_retries => "5"`.
    pub fn filter<I>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = HashMap::new();

        for (key, value) in vars {
            match &self.prefix {
                Some(prefix) => {
                    if let Some(rest) = key.strip_prefix(prefix.as_str()) {
                        let trimmed = rest.trim_start_matches('_');
                        if !trimmed.is_empty() {
                            config.insert(trimmed.to_lowercase(), value);
                        }
                    }
                }
                None => {
                    config.insert(key.to_lowercase(), value);
                }
            }
        }

        config
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        };

        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::courier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_strips_prefix() {
        let loader = EnvLoader::courier();
        let vars = vec![
            ("COURIER_API_RETRIES".to_string(), "5".to_string()),
            ("COURIER_AUTH_URL".to_string(), "http://auth".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
            ("COURIER".to_string(), "ignored".to_string()),
        ];

        let loaded = loader.filter(vars);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("api_retries").map(String::as_str), Some("5"));
        assert_eq!(loaded.get("auth_url").map(String::as_str), Some("http://auth"));
    }

    #[test]
    fn test_filter_without_prefix() {
        let loader = EnvLoader::new(None);
        let loaded = loader.filter(vec![("HOME".to_string(), "/root".to_string())]);
        assert_eq!(loaded.get("home").map(String::as_str), Some("/root"));
    }

    #[test]
    fn test_load_var_or_default() {
        let loader = EnvLoader::courier();
        assert_eq!(loader.load_var_or("NONEXISTENT_VAR_12345", "fallback"), "fallback");
    }

    #[test]
    fn test_load_missing_var() {
        let loader = EnvLoader::courier();
        assert!(loader.load_var("MISSING_VAR_67890").is_err());
    }
}
