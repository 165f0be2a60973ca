//! Server error classification.
//!
//! A submit handler fails with an [`anyhow::Error`]. The classifier decides
//! whether that failure is a structured validation failure that maps onto
//! fields or an opaque failure shown as a single message:
//!
//! 1. No [`TransportError`] anywhere in the error chain: generic message.
//! 2. A `TransportError` whose payload the [`ValidationErrorMapper`]
//!    recognizes: per-field errors.
//! 3. Anything else: generic message.
//!
//! Classification never fails. The wire format of validation payloads is not
//! assumed here; callers supply the mapper that understands their backend.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use formctl_core::i18n::{catalog, gettext};
use formctl_core::DEFAULT_SERVER_ERROR_MESSAGE;

use crate::validation::FieldErrors;

/// A failure reported by the transport a submit handler talks to.
///
/// Handlers return this (wrapped in `anyhow::Error`) when the server answered
/// with something the classifier may be able to map onto fields.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    /// The transport status code, if any.
    pub status: Option<u16>,
    /// A human-readable description.
    pub message: String,
    /// The structured body of the response, if any.
    pub payload: Option<Value>,
}

impl TransportError {
    /// Creates a transport error with no status or payload.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            payload: None,
        }
    }

    /// Sets the status code.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the response payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Recognizes validation payloads and maps them to field errors.
///
/// Returning `None`, or an empty map, means "not a validation failure".
pub trait ValidationErrorMapper: Send + Sync {
    fn map(&self, error: &TransportError) -> Option<FieldErrors>;
}

impl<F> ValidationErrorMapper for F
where
    F: Fn(&TransportError) -> Option<FieldErrors> + Send + Sync,
{
    fn map(&self, error: &TransportError) -> Option<FieldErrors> {
        self(error)
    }
}

/// The result of classifying a submit failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerErrorOutcome {
    /// Messages to attach to individual fields.
    FieldErrors(BTreeMap<String, String>),
    /// A single message for the whole form.
    GenericMessage(String),
}

/// Classifies submit failures for one form.
#[derive(Clone)]
pub struct ServerErrorClassifier {
    mapper: Option<Arc<dyn ValidationErrorMapper>>,
    fallback: Option<String>,
    known_fields: BTreeSet<String>,
}

impl ServerErrorClassifier {
    /// Creates a classifier for a form with the given field names.
    ///
    /// Without a mapper every failure classifies as the generic message.
    pub fn new<I, S>(known_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mapper: None,
            fallback: None,
            known_fields: known_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the validation payload mapper.
    #[must_use]
    pub fn with_mapper(mut self, mapper: Arc<dyn ValidationErrorMapper>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    /// Overrides the generic fallback message.
    #[must_use]
    pub fn with_fallback(mut self, message: impl Into<String>) -> Self {
        self.fallback = Some(message.into());
        self
    }

    /// Pins the generic message to its translation in `language_code`, or the
    /// untranslated default when the catalog has no entry.
    #[must_use]
    pub fn with_language(self, language_code: &str) -> Self {
        let message = catalog::translate(language_code, DEFAULT_SERVER_ERROR_MESSAGE)
            .unwrap_or_else(|| DEFAULT_SERVER_ERROR_MESSAGE.to_string());
        self.with_fallback(message)
    }

    /// Returns the generic message. Without a fallback set, it is translated
    /// into the language active on the calling thread.
    pub fn fallback_message(&self) -> String {
        self.fallback
            .clone()
            .unwrap_or_else(|| gettext(DEFAULT_SERVER_ERROR_MESSAGE))
    }

    /// Classifies a submit failure.
    pub fn classify(&self, error: &anyhow::Error) -> ServerErrorOutcome {
        let Some(transport) = error.chain().find_map(|e| e.downcast_ref::<TransportError>())
        else {
            tracing::debug!(error = %error, "submit failed without a transport error");
            return self.generic();
        };

        let Some(mapped) = self.mapper.as_ref().and_then(|m| m.map(transport)) else {
            tracing::debug!(status = ?transport.status, "transport error not recognized as validation failure");
            return self.generic();
        };

        let mut errors = FieldErrors::new();
        for (name, message) in mapped {
            if self.known_fields.contains(&name) {
                errors.insert(name, message);
            } else {
                tracing::warn!(field = %name, "dropping server error for unknown field");
            }
        }

        if errors.is_empty() {
            self.generic()
        } else {
            ServerErrorOutcome::FieldErrors(errors)
        }
    }

    fn generic(&self) -> ServerErrorOutcome {
        ServerErrorOutcome::GenericMessage(self.fallback_message())
    }
}

impl fmt::Debug for ServerErrorClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerErrorClassifier")
            .field("has_mapper", &self.mapper.is_some())
            .field("fallback", &self.fallback)
            .field("known_fields", &self.known_fields)
            .finish()
    }
}
