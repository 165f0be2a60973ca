//! Validation pipeline.
//!
//! A [`FieldValidator`] is the per-field validation function derived from a
//! schema entry: a pure `validate(raw) -> Result<normalized, failure>`. The
//! pipeline functions below run validators over a whole set of values:
//!
//! 1. [`clean_fields`] validates each field in isolation. Errors accumulate
//!    rather than short-circuiting, so one failing field never hides another.
//! 2. [`clean_form`] runs cross-field rules against the normalized values.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use formctl_core::{FormError, FormResult, ValidationError};

use crate::fields::{clean_field_value, FieldDef, FieldType};
use crate::schema::FormValidatorFn;
use crate::values::FormValues;

/// Validators keyed by field name.
pub type ValidatorMap = BTreeMap<String, FieldValidator>;

/// Per-field error messages keyed by field name.
pub type FieldErrors = BTreeMap<String, String>;

/// The validation function for one field.
///
/// Cheap to clone; the definition and any compiled pattern are shared.
#[derive(Clone)]
pub struct FieldValidator {
    field: Arc<FieldDef>,
    pattern: Option<Arc<Regex>>,
}

impl FieldValidator {
    /// Builds the validator for a definition, compiling its pattern if any.
    pub fn from_def(field: FieldDef) -> FormResult<Self> {
        let pattern = match &field.field_type {
            FieldType::Regex { regex } => {
                let compiled = Regex::new(regex).map_err(|e| FormError::InvalidRegex {
                    field: field.name.clone(),
                    message: e.to_string(),
                })?;
                Some(Arc::new(compiled))
            }
            _ => None,
        };
        Ok(Self {
            field: Arc::new(field),
            pattern,
        })
    }

    /// Returns the name of the field this validator checks.
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// Returns the field definition.
    pub fn def(&self) -> &FieldDef {
        &self.field
    }

    /// Checks one candidate value, returning its normalized form.
    pub fn validate(&self, raw: &Value) -> Result<Value, ValidationError> {
        clean_field_value(&self.field, self.pattern.as_deref(), raw)
    }
}

impl fmt::Debug for FieldValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValidator")
            .field("field", &self.field.name)
            .finish_non_exhaustive()
    }
}

/// Validates every field in `validators` against `raw`.
///
/// A field absent from `raw` is validated as `null`. Returns the normalized
/// values of the fields that passed and the messages of those that failed.
pub fn clean_fields(validators: &ValidatorMap, raw: &FormValues) -> (FormValues, FieldErrors) {
    let mut cleaned = FormValues::new();
    let mut errors = FieldErrors::new();

    for (name, validator) in validators {
        let value = raw.get(name).unwrap_or(&Value::Null);
        match validator.validate(value) {
            Ok(normalized) => {
                cleaned.insert(name.clone(), normalized);
            }
            Err(err) => {
                errors.insert(name.clone(), err.message);
            }
        }
    }

    (cleaned, errors)
}

/// Runs cross-field rules over normalized values.
///
/// When a rule reports several messages for one field, the first wins.
pub fn clean_form(rules: &[FormValidatorFn], cleaned: &FormValues) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for rule in rules {
        for (name, message) in rule(cleaned) {
            errors.entry(name).or_insert(message);
        }
    }
    errors
}
