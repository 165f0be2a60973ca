//! Core error types for formctl.
//!
//! Two kinds of failure exist in a form controller and they are kept apart:
//!
//! - [`ValidationError`] is a user-facing failure produced by a field rule. It
//!   is recovered locally and stored as that field's error.
//! - [`FormError`] is a programmer or environment error (unknown field names,
//!   mismatched default values, unreadable configuration). It is returned as
//!   `Err` from construction and configuration APIs.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A failure raised by a field rule.
///
/// Carries the human-readable message shown next to the field, a short code
/// identifying the failed constraint, and optional parameters.
///
/// # Examples
///
/// ```
/// use formctl_core::error::ValidationError;
///
/// let err = ValidationError::new("150文字以上必須です", "min_length")
///     .with_param("min", "150");
/// assert_eq!(err.to_string(), "150文字以上必須です");
/// assert_eq!(err.code, "min_length");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The message shown to the user.
    pub message: String,
    /// A short code identifying the failed constraint (e.g. "required", "min_length").
    pub code: String,
    /// Additional parameters providing context for the message.
    pub params: HashMap<String, String>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The library error type for formctl.
///
/// Every variant describes a mistake in how a form was wired up or configured.
/// Failures the end user can cause (bad input, a rejected submission) are
/// never reported through this type; they surface as form state.
#[derive(Error, Debug)]
pub enum FormError {
    // ── Schema wiring ────────────────────────────────────────────────

    /// A field name was looked up that the schema does not define.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A schema field has no entry in the default values.
    #[error("Missing default value for field: {0}")]
    MissingDefault(String),

    /// A default value was supplied for a name the schema does not define.
    #[error("Default value supplied for undeclared field: {0}")]
    UnexpectedDefault(String),

    /// The same field name was declared twice in one schema.
    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    /// A controller was built without a submit handler.
    #[error("No submit handler configured")]
    MissingSubmitHandler,

    /// A regex rule carries a pattern that does not compile.
    #[error("Invalid regex for field '{field}': {message}")]
    InvalidRegex {
        /// The field carrying the pattern.
        field: String,
        /// The compiler's message.
        message: String,
    },

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// Form values could not be converted to or from a caller type.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for FormError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, FormError>`.
pub type FormResult<T> = Result<T, FormError>;
