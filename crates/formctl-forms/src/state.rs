//! Field and form state.
//!
//! [`FieldState`] is what the field-state engine stores per field.
//! [`FormState`] is the snapshot derived from it after every change; it is
//! never stored independently, so `is_valid` and `is_touched` cannot drift
//! from the per-field data.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Per-field state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldState {
    /// The current raw value as entered.
    pub value: Value,
    /// Whether the field received a change or blur since creation or reset.
    pub touched: bool,
    /// The message of the most recent failed check, if any.
    pub error: Option<String>,
    /// `true` while the field's rule is running.
    pub is_validating: bool,
}

impl FieldState {
    /// Creates an untouched, error-free state holding `value`.
    pub const fn new(value: Value) -> Self {
        Self {
            value,
            touched: false,
            error: None,
            is_validating: false,
        }
    }
}

/// Where the controller is in its submission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitPhase {
    /// Accepting edits and submits.
    #[default]
    Idle,
    /// Running every field rule ahead of a submit.
    Validating,
    /// Waiting on the submit handler.
    Submitting,
}

/// A snapshot of the whole form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormState {
    /// Per-field state keyed by field name.
    pub fields: BTreeMap<String, FieldState>,
    /// No field currently carries an error.
    pub is_valid: bool,
    /// The submit handler is in flight.
    pub is_submitting: bool,
    /// At least one field is touched.
    pub is_touched: bool,
    pub phase: SubmitPhase,
    /// Number of submits that reached the handler and succeeded.
    pub submit_count: u32,
    /// The generic server failure message; empty when there is none.
    pub server_error_message: String,
}

impl FormState {
    /// Derives a snapshot from field states and lifecycle data.
    pub fn derive(
        fields: BTreeMap<String, FieldState>,
        phase: SubmitPhase,
        submit_count: u32,
        server_error_message: String,
    ) -> Self {
        let is_valid = fields.values().all(|f| f.error.is_none());
        let is_touched = fields.values().any(|f| f.touched);
        Self {
            fields,
            is_valid,
            is_submitting: phase == SubmitPhase::Submitting,
            is_touched,
            phase,
            submit_count,
            server_error_message,
        }
    }

    /// Returns the state of `name`, if declared.
    pub fn field(&self, name: &str) -> Option<&FieldState> {
        self.fields.get(name)
    }

    /// Returns the error message of every field that has one.
    pub fn errors(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(name, f)| f.error.clone().map(|e| (name.clone(), e)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> BTreeMap<String, FieldState> {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), FieldState::new(json!("")));
        map.insert("b".to_string(), FieldState::new(json!(0)));
        map
    }

    #[test]
    fn test_fresh_state_is_valid_and_untouched() {
        let state = FormState::derive(fields(), SubmitPhase::Idle, 0, String::new());
        assert!(state.is_valid);
        assert!(!state.is_touched);
        assert!(!state.is_submitting);
        assert!(state.errors().is_empty());
    }

    #[test]
    fn test_any_error_makes_invalid() {
        let mut f = fields();
        f.get_mut("b").unwrap().error = Some("bad".into());
        let state = FormState::derive(f, SubmitPhase::Idle, 0, String::new());
        assert!(!state.is_valid);
        assert_eq!(state.errors().get("b").map(String::as_str), Some("bad"));
    }

    #[test]
    fn test_any_touched_makes_touched() {
        let mut f = fields();
        f.get_mut("a").unwrap().touched = true;
        let state = FormState::derive(f, SubmitPhase::Idle, 0, String::new());
        assert!(state.is_touched);
    }

    #[test]
    fn test_submitting_follows_phase() {
        let submitting = FormState::derive(fields(), SubmitPhase::Submitting, 0, String::new());
        assert!(submitting.is_submitting);
        let validating = FormState::derive(fields(), SubmitPhase::Validating, 0, String::new());
        assert!(!validating.is_submitting);
    }

    #[test]
    fn test_serializes_phase_snake_case() {
        let state = FormState::derive(fields(), SubmitPhase::Submitting, 1, String::new());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["phase"], json!("submitting"));
        assert_eq!(json["submit_count"], json!(1));
    }
}
