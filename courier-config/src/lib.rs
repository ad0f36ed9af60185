// Configuration for the Courier request layer
//
// Defaults come from the target environment and can be overridden from a
// JSON/TOML file, `COURIER_*` environment variables, or a `.env` file.

pub mod api_config;
pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use api_config::{ApiConfig, ApiConfigBuilder, Environment};
pub use env::{ENV_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{ConfigValidator, Validate};
