// Field rules and schemas

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub(crate) type CustomFn = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;
pub(crate) type SanitizeFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Checks for one field, applied in a fixed order:
/// sanitize, required, length, pattern, custom.
#[derive(Clone)]
pub struct FieldRule {
    pub(crate) field: String,
    pub(crate) required: bool,
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) pattern: Option<(Regex, String)>,
    pub(crate) custom: Option<CustomFn>,
    pub(crate) sanitize: Option<SanitizeFn>,
}

impl FieldRule {
    pub fn for_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            required: false,
            min_length: None,
            max_length: None,
            pattern: None,
            custom: None,
            sanitize: None,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn length(self, min: usize, max: usize) -> Self {
        self.min_length(min).max_length(max)
    }

    /// Require string values to match `pattern`; `message` is reported on mismatch.
    pub fn pattern(mut self, pattern: Regex, message: impl Into<String>) -> Self {
        self.pattern = Some((pattern, message.into()));
        self
    }

    /// Extra check returning an error message on failure.
    pub fn custom<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(validator));
        self
    }

    /// Replace the default sanitizer for this field.
    pub fn sanitize<F>(mut self, sanitizer: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.sanitize = Some(Arc::new(sanitizer));
        self
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("field", &self.field)
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("pattern", &self.pattern.as_ref().map(|(re, _)| re.as_str()))
            .field("custom", &self.custom.is_some())
            .field("sanitize", &self.sanitize.is_some())
            .finish()
    }
}

/// Ordered set of field rules.
#[derive(Debug, Clone, Default)]
pub struct ValidationSchema {
    rules: Vec<FieldRule>,
}

impl ValidationSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the rule for a field.
    pub fn field(mut self, rule: FieldRule) -> Self {
        match self.rules.iter_mut().find(|r| r.field == rule.field) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
        self
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
