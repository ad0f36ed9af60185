//! Courier logging setup
//!
//! Every Courier crate logs through `tracing`. This crate installs a global
//! subscriber configured from the environment:
//!
//! - `COURIER_DEBUG=1` - Enable debug logging
//! - `COURIER_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `COURIER_LOG_FORMAT=pretty|json|compact` - Set output format
//! - `COURIER_LOG_COLOR=1|0` - Enable/disable ANSI colors
//!
//! `RUST_LOG`, when set, replaces the level-derived filter.
//!
//! ```rust
//! courier_log::init();
//! tracing::info!(service = "auth", "client ready");
//! ```

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::env;
use std::fmt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

// ============================================================================
// Log Levels
// ============================================================================

/// Minimum level for Courier logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl Level {
    /// Get level from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    /// Directive understood by `EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_directive().to_uppercase())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line human readable output
    Pretty,
    /// Single-line output
    Compact,
    /// One JSON object per line
    Json,
}

impl Format {
    /// Get format from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// Whether debug mode is enabled
    pub debug: bool,
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether ANSI colors are enabled
    pub color: bool,
    /// Whether to include the event target
    pub target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Json,
            color: false,
            target: true,
        }
    }
}

impl LogConfig {
    /// Create config from `COURIER_*` environment variables.
    pub fn from_env() -> Self {
        let vars = env::vars()
            .filter(|(key, _)| key.starts_with("COURIER_") || key == "NO_COLOR" || key == "TERM")
            .collect();
        Self::from_vars(&vars)
    }

    /// Create config from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let flag = |key: &str| vars.get(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        let debug = flag("COURIER_DEBUG").unwrap_or(false);

        let level = vars
            .get("COURIER_LOG_LEVEL")
            .and_then(|s| Level::from_str(s))
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = vars
            .get("COURIER_LOG_FORMAT")
            .and_then(|s| Format::from_str(s))
            .unwrap_or(Format::Json);

        let color = flag("COURIER_LOG_COLOR")
            .unwrap_or_else(|| !vars.contains_key("NO_COLOR") && vars.contains_key("TERM"));

        let target = flag("COURIER_LOG_TARGET").unwrap_or(true);

        Self {
            debug,
            level,
            format,
            color,
            target,
        }
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_directive()))
    }
}

// ============================================================================
// Subscriber
// ============================================================================

/// Error returned when a global subscriber is already installed.
#[derive(Debug)]
pub struct InitError(String);

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to install tracing subscriber: {}", self.0)
    }
}

impl std::error::Error for InitError {}

static INSTALLED: OnceCell<LogConfig> = OnceCell::new();

/// Install the global subscriber from environment configuration.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let _ = try_init_with(LogConfig::from_env());
}

/// Install the global subscriber with an explicit configuration.
pub fn try_init_with(config: LogConfig) -> Result<&'static LogConfig, InitError> {
    if let Some(existing) = INSTALLED.get() {
        return Ok(existing);
    }

    let registry = tracing_subscriber::registry().with(config.filter());
    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(config.color)
        .with_target(config.target);

    let result = match config.format {
        Format::Json => registry.with(layer.json()).try_init(),
        Format::Pretty => registry.with(layer.pretty()).try_init(),
        Format::Compact => registry.with(layer.compact()).try_init(),
    };
    result.map_err(|e| InitError(e.to_string()))?;

    Ok(INSTALLED.get_or_init(|| config))
}

/// Configuration of the installed subscriber, if any.
pub fn installed() -> Option<&'static LogConfig> {
    INSTALLED.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Off);
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!(Level::from_str("DEBUG"), Some(Level::Debug));
        assert_eq!(Level::from_str("warning"), Some(Level::Warn));
        assert_eq!(Level::from_str("none"), Some(Level::Off));
        assert_eq!(Level::from_str("loud"), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(Format::from_str("pretty"), Some(Format::Pretty));
        assert_eq!(Format::from_str("Compact"), Some(Format::Compact));
        assert_eq!(Format::from_str("json"), Some(Format::Json));
        assert_eq!(Format::from_str("xml"), None);
    }

    #[test]
    fn test_defaults_from_empty_env() {
        let config = LogConfig::from_vars(&HashMap::new());
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn test_debug_flag_lowers_level() {
        let config = LogConfig::from_vars(&vars(&[("COURIER_DEBUG", "true")]));
        assert!(config.debug);
        assert_eq!(config.level, Level::Debug);

        let config = LogConfig::from_vars(&vars(&[
            ("COURIER_DEBUG", "1"),
            ("COURIER_LOG_LEVEL", "warn"),
        ]));
        assert_eq!(config.level, Level::Warn);
    }

    #[test]
    fn test_format_and_color() {
        let config = LogConfig::from_vars(&vars(&[
            ("COURIER_LOG_FORMAT", "pretty"),
            ("TERM", "xterm-256color"),
        ]));
        assert_eq!(config.format, Format::Pretty);
        assert!(config.color);

        let config = LogConfig::from_vars(&vars(&[("TERM", "xterm"), ("NO_COLOR", "1")]));
        assert!(!config.color);

        let config = LogConfig::from_vars(&vars(&[("COURIER_LOG_COLOR", "0"), ("TERM", "xterm")]));
        assert!(!config.color);
    }

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        assert!(installed().is_some() || tracing::dispatcher::has_been_set());
    }
}
