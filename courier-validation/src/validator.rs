// Schema validation

use crate::rules::FieldRule;
use crate::sanitize::default_sanitize;
use crate::{Constraint, ValidationError, ValidationSchema};
use courier_core::ApiError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Outcome of validating a payload against a schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    /// Every schema field, sanitized; missing fields are `null`.
    pub sanitized_data: Map<String, Value>,
}

impl ValidationResult {
    /// Errors reported for one field.
    pub fn field_errors(&self, field: &str) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.field == field).collect()
    }
}

/// Validates and sanitizes key/value payloads.
pub struct InputValidator;

impl InputValidator {
    /// Validate every field of `schema`, accumulating errors across fields.
    pub fn validate(data: &Map<String, Value>, schema: &ValidationSchema) -> ValidationResult {
        let mut errors = Vec::new();
        let mut sanitized_data = Map::new();

        for rule in schema.rules() {
            let raw = data.get(&rule.field).unwrap_or(&Value::Null);
            let value = match &rule.sanitize {
                Some(sanitize) => sanitize(raw),
                None => default_sanitize(raw),
            };

            if let Some(error) = check_field(rule, &value) {
                errors.push(error);
            }
            sanitized_data.insert(rule.field.clone(), value);
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            sanitized_data,
        }
    }

    /// Strict validation for use before a request is sent.
    ///
    /// Returns the sanitized payload, or a `VALIDATION_ERROR` naming the
    /// first failing field and carrying every message.
    pub fn validate_api_request(
        data: &Map<String, Value>,
        schema: &ValidationSchema,
    ) -> Result<Map<String, Value>, ApiError> {
        let result = Self::validate(data, schema);
        match result.errors.first() {
            None => Ok(result.sanitized_data),
            Some(first) => {
                let message = result
                    .errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(ApiError::validation(first.field.clone(), message))
            }
        }
    }
}

/// Run one field's checks; the first failure wins.
fn check_field(rule: &FieldRule, value: &Value) -> Option<ValidationError> {
    let field = rule.field.as_str();
    let error = |message: String, constraint| Some(ValidationError::new(field, message, constraint));

    if is_empty(value) {
        if rule.required {
            return error(format!("{} is required", display_name(field)), Constraint::Required);
        }
        return None;
    }

    if let Value::String(s) = value {
        let len = s.chars().count();

        if let Some(min) = rule.min_length
            && len < min
        {
            return error(
                format!("{} must be at least {} characters", display_name(field), min),
                Constraint::MinLength,
            );
        }

        if let Some(max) = rule.max_length
            && len > max
        {
            return error(
                format!("{} must be at most {} characters", display_name(field), max),
                Constraint::MaxLength,
            );
        }

        if let Some((pattern, message)) = &rule.pattern
            && !pattern.is_match(s)
        {
            return error(message.clone(), Constraint::Pattern);
        }
    }

    if let Some(custom) = &rule.custom
        && let Err(message) = custom(value)
    {
        return error(message, Constraint::Custom);
    }

    None
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// `firstName` -> `First name`
fn display_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 2);
    for (i, c) in field.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.extend(c.to_lowercase());
        } else if c == '_' {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}
