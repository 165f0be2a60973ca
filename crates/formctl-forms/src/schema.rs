//! Form schemas.
//!
//! A [`FormSchema`] is the declarative description of a form: an ordered list
//! of [`FieldDef`]s plus optional cross-field rules. Per-field validators are
//! resolved from it once, when a controller is built, through
//! [`FormSchema::validator_for`] and [`FormSchema::validators`].

use std::fmt;
use std::sync::Arc;

use formctl_core::{FormError, FormResult};

use crate::fields::FieldDef;
use crate::validation::{FieldValidator, ValidatorMap};
use crate::values::FormValues;

/// A cross-field rule. Receives the normalized values of every field and
/// returns `(field name, message)` pairs for each violation.
pub type FormValidatorFn = Arc<dyn Fn(&FormValues) -> Vec<(String, String)> + Send + Sync>;

/// The declarative description of a form.
///
/// # Examples
///
/// ```
/// use formctl_forms::fields::FieldDef;
/// use formctl_forms::schema::FormSchema;
///
/// let schema = FormSchema::new()
///     .field(FieldDef::char("message", Some(150), Some(2000)))
///     .field(FieldDef::char("name", None, Some(50)));
///
/// assert_eq!(schema.names().collect::<Vec<_>>(), vec!["message", "name"]);
/// assert!(schema.validator_for("message").is_ok());
/// assert!(schema.validator_for("missing").is_err());
/// ```
#[derive(Clone, Default)]
pub struct FormSchema {
    fields: Vec<FieldDef>,
    form_validators: Vec<FormValidatorFn>,
}

impl FormSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field definition.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a cross-field rule.
    ///
    /// Cross-field rules run only at submit time and only after every field
    /// passed its own rule, so they never prevent a field from being checked
    /// on its own.
    #[must_use]
    pub fn form_validator<F>(mut self, rule: F) -> Self
    where
        F: Fn(&FormValues) -> Vec<(String, String)> + Send + Sync + 'static,
    {
        self.form_validators.push(Arc::new(rule));
        self
    }

    /// Returns the field definitions in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Returns the field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the definition of `name`, if declared.
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the cross-field rules.
    pub fn form_validators(&self) -> &[FormValidatorFn] {
        &self.form_validators
    }

    /// Resolves the validator for one field.
    ///
    /// # Errors
    ///
    /// [`FormError::UnknownField`] if `name` is not declared, or
    /// [`FormError::InvalidRegex`] if its pattern does not compile.
    pub fn validator_for(&self, name: &str) -> FormResult<FieldValidator> {
        let field = self
            .get(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        FieldValidator::from_def(field.clone())
    }

    /// Resolves the validators for every field.
    ///
    /// # Errors
    ///
    /// [`FormError::DuplicateField`] if a name is declared twice, or any
    /// error from [`validator_for`](Self::validator_for).
    pub fn validators(&self) -> FormResult<ValidatorMap> {
        let mut map = ValidatorMap::new();
        for field in &self.fields {
            if map.contains_key(&field.name) {
                return Err(FormError::DuplicateField(field.name.clone()));
            }
            map.insert(field.name.clone(), FieldValidator::from_def(field.clone())?);
        }
        Ok(map)
    }
}

impl fmt::Debug for FormSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSchema")
            .field("fields", &self.fields)
            .field("form_validators", &self.form_validators.len())
            .finish()
    }
}
