//! Input validation for Courier request payloads
//!
//! Payloads are JSON objects checked against a [`ValidationSchema`]. Each
//! field is sanitized, then checked in order: required, length, pattern,
//! custom. Errors accumulate across fields; within a field the first failing
//! check wins.
//!
//! ```
//! use courier_validation::{CommonSchemas, InputValidator};
//! use serde_json::json;
//!
//! let data = json!({"email": "  Test@Example.com ", "password": "password"});
//! let payload = data.as_object().unwrap();
//!
//! let result = InputValidator::validate(payload, &CommonSchemas::login());
//! assert!(result.is_valid);
//! assert_eq!(result.sanitized_data["email"], "test@example.com");
//! ```

mod errors;
mod rules;
pub mod sanitize;
mod schemas;
mod validator;

pub use errors::{Constraint, ValidationError};
pub use rules::{FieldRule, ValidationSchema};
pub use schemas::{CommonSchemas, MIN_PASSWORD_SCORE, PasswordStrength, password_strength};
pub use validator::{InputValidator, ValidationResult};
