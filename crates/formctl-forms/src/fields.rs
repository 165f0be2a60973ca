//! Field definitions and rule evaluation.
//!
//! Each [`FieldDef`] names one field and carries its [`FieldType`], which
//! decides how a candidate value is checked and normalized. The
//! [`clean_field_value`] function evaluates a definition against one value
//! and reports the first failed constraint.
//!
//! Rules follow these conventions:
//!
//! - A missing (`null`) value fails with code `required` on required fields
//!   and passes as `null` on optional ones.
//! - An empty string is *not* missing; length constraints decide whether it
//!   is acceptable.
//! - Lengths count Unicode scalar values, not bytes.
//! - Every default message is looked up through the i18n catalog by its
//!   template, with placeholders such as `{min}` and `{len}` filled in after
//!   translation. A message can be replaced per field and code with
//!   [`FieldDef::error_message`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use formctl_core::i18n::gettext;
use formctl_core::ValidationError;

/// A caller-supplied rule: returns the normalized value or a failure.
pub type RuleFn = Arc<dyn Fn(&Value) -> Result<Value, ValidationError> + Send + Sync>;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("valid regex"));

/// The type of a form field, including type-specific constraints.
#[derive(Clone)]
pub enum FieldType {
    /// A string field.
    Char {
        /// Minimum length (characters).
        min_length: Option<usize>,
        /// Maximum length (characters).
        max_length: Option<usize>,
        /// Whether to strip leading/trailing whitespace before checking.
        strip: bool,
    },
    /// An integer field. Accepts JSON integers and numeric strings.
    Integer {
        /// Minimum allowed value.
        min_value: Option<i64>,
        /// Maximum allowed value.
        max_value: Option<i64>,
    },
    /// A floating-point field. Accepts JSON numbers and numeric strings.
    Float {
        /// Minimum allowed value.
        min_value: Option<f64>,
        /// Maximum allowed value.
        max_value: Option<f64>,
    },
    /// A boolean field. Accepts JSON booleans and "true"/"false"-like strings.
    Boolean,
    /// An email address.
    Email,
    /// An http(s) URL.
    Url,
    /// A string matching a regular expression.
    Regex {
        /// The pattern. Compiled once when the schema is resolved.
        regex: String,
    },
    /// A single choice among `(value, label)` pairs.
    Choice {
        /// Available choices.
        choices: Vec<(String, String)>,
    },
    /// A caller-supplied rule.
    Custom(RuleFn),
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char {
                min_length,
                max_length,
                strip,
            } => f
                .debug_struct("Char")
                .field("min_length", min_length)
                .field("max_length", max_length)
                .field("strip", strip)
                .finish(),
            Self::Integer {
                min_value,
                max_value,
            } => f
                .debug_struct("Integer")
                .field("min_value", min_value)
                .field("max_value", max_value)
                .finish(),
            Self::Float {
                min_value,
                max_value,
            } => f
                .debug_struct("Float")
                .field("min_value", min_value)
                .field("max_value", max_value)
                .finish(),
            Self::Boolean => f.write_str("Boolean"),
            Self::Email => f.write_str("Email"),
            Self::Url => f.write_str("Url"),
            Self::Regex { regex } => f.debug_struct("Regex").field("regex", regex).finish(),
            Self::Choice { choices } => f.debug_struct("Choice").field("choices", choices).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Complete definition of a form field.
#[derive(Clone)]
pub struct FieldDef {
    /// The field name.
    pub name: String,
    /// The field type, controlling checking and normalization.
    pub field_type: FieldType,
    /// Whether a `null` value is rejected.
    pub required: bool,
    /// Additional rules applied to the normalized value, in order.
    pub validators: Vec<RuleFn>,
    /// Custom error messages keyed by error code.
    pub error_messages: HashMap<String, String>,
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("validators", &self.validators.len())
            .field("error_messages", &self.error_messages)
            .finish()
    }
}

impl FieldDef {
    /// Creates a required field with the given type.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            validators: Vec::new(),
            error_messages: HashMap::new(),
        }
    }

    /// Creates a string field with optional length bounds.
    pub fn char(name: impl Into<String>, min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self::new(
            name,
            FieldType::Char {
                min_length,
                max_length,
                strip: false,
            },
        )
    }

    /// Creates a field checked entirely by a caller-supplied rule.
    pub fn custom<F>(name: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ValidationError> + Send + Sync + 'static,
    {
        Self::new(name, FieldType::Custom(Arc::new(rule)))
    }

    /// Sets whether this field is required.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Adds a rule that runs after the type check on the normalized value.
    #[must_use]
    pub fn validator<F>(mut self, rule: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ValidationError> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(rule));
        self
    }

    /// Sets a custom error message for a given code.
    #[must_use]
    pub fn error_message(mut self, code: impl Into<String>, msg: impl Into<String>) -> Self {
        self.error_messages.insert(code.into(), msg.into());
        self
    }

    fn fail(&self, code: &str, default: &str) -> ValidationError {
        self.fail_with(code, default, &[])
    }

    /// Fails with `template` translated first and `{name}` placeholders
    /// filled from `params` afterwards. Each param is also recorded on the
    /// error.
    fn fail_with(&self, code: &str, template: &str, params: &[(&str, String)]) -> ValidationError {
        let mut message = self
            .error_messages
            .get(code)
            .cloned()
            .unwrap_or_else(|| gettext(template));
        for (name, value) in params {
            message = message.replace(&format!("{{{name}}}"), value);
        }
        params
            .iter()
            .fold(ValidationError::new(message, code), |err, (name, value)| {
                err.with_param(*name, value.clone())
            })
    }
}

/// Checks and normalizes one candidate value against a field definition.
///
/// `pattern` is the compiled form of a [`FieldType::Regex`] pattern and is
/// ignored for every other type.
pub fn clean_field_value(
    field: &FieldDef,
    pattern: Option<&Regex>,
    raw: &Value,
) -> Result<Value, ValidationError> {
    if raw.is_null() {
        if field.required {
            return Err(field.fail("required", "This field is required."));
        }
        return Ok(Value::Null);
    }

    let mut value = match &field.field_type {
        FieldType::Char {
            min_length,
            max_length,
            strip,
        } => {
            let s = expect_str(field, raw)?;
            let s = if *strip { s.trim() } else { s };
            let len = s.chars().count();
            if let Some(min) = min_length {
                if len < *min {
                    return Err(field.fail_with(
                        "min_length",
                        "Ensure this value has at least {min} characters (it has {len}).",
                        &[("min", min.to_string()), ("len", len.to_string())],
                    ));
                }
            }
            if let Some(max) = max_length {
                if len > *max {
                    return Err(field.fail_with(
                        "max_length",
                        "Ensure this value has at most {max} characters (it has {len}).",
                        &[("max", max.to_string()), ("len", len.to_string())],
                    ));
                }
            }
            Value::String(s.to_string())
        }

        FieldType::Integer {
            min_value,
            max_value,
        } => {
            let n = match raw {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }
            .ok_or_else(|| field.fail("invalid", "Enter a whole number."))?;
            if let Some(min) = min_value {
                if n < *min {
                    return Err(field.fail_with(
                        "min_value",
                        "Ensure this value is greater than or equal to {min}.",
                        &[("min", min.to_string())],
                    ));
                }
            }
            if let Some(max) = max_value {
                if n > *max {
                    return Err(field.fail_with(
                        "max_value",
                        "Ensure this value is less than or equal to {max}.",
                        &[("max", max.to_string())],
                    ));
                }
            }
            Value::from(n)
        }

        FieldType::Float {
            min_value,
            max_value,
        } => {
            let n = match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
            .filter(|n| n.is_finite())
            .ok_or_else(|| field.fail("invalid", "Enter a number."))?;
            if let Some(min) = min_value {
                if n < *min {
                    return Err(field.fail_with(
                        "min_value",
                        "Ensure this value is greater than or equal to {min}.",
                        &[("min", min.to_string())],
                    ));
                }
            }
            if let Some(max) = max_value {
                if n > *max {
                    return Err(field.fail_with(
                        "max_value",
                        "Ensure this value is less than or equal to {max}.",
                        &[("max", max.to_string())],
                    ));
                }
            }
            Value::from(n)
        }

        FieldType::Boolean => match raw {
            Value::Bool(b) => Value::Bool(*b),
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Value::Bool(true),
                "false" | "0" | "no" | "off" | "" => Value::Bool(false),
                _ => return Err(field.fail("invalid", "Enter a valid boolean.")),
            },
            _ => return Err(field.fail("invalid", "Enter a valid boolean.")),
        },

        FieldType::Email => {
            let s = expect_str(field, raw)?;
            if !EMAIL_RE.is_match(s) {
                return Err(field.fail("invalid", "Enter a valid email address."));
            }
            Value::String(s.to_string())
        }

        FieldType::Url => {
            let s = expect_str(field, raw)?;
            if !URL_RE.is_match(s) {
                return Err(field.fail("invalid", "Enter a valid URL."));
            }
            Value::String(s.to_string())
        }

        FieldType::Regex { .. } => {
            let s = expect_str(field, raw)?;
            if !pattern.is_some_and(|re| re.is_match(s)) {
                return Err(field.fail("invalid", "Enter a valid value."));
            }
            Value::String(s.to_string())
        }

        FieldType::Choice { choices } => {
            let s = expect_str(field, raw)?;
            if !choices.iter().any(|(v, _)| v == s) {
                return Err(field.fail_with(
                    "invalid_choice",
                    "Select a valid choice. {value} is not one of the available choices.",
                    &[("value", s.to_string())],
                ));
            }
            Value::String(s.to_string())
        }

        FieldType::Custom(rule) => rule(raw)?,
    };

    for validator in &field.validators {
        value = validator(&value)?;
    }

    Ok(value)
}

fn expect_str<'a>(field: &FieldDef, raw: &'a Value) -> Result<&'a str, ValidationError> {
    raw.as_str()
        .ok_or_else(|| field.fail("invalid", "Enter a text value."))
}
