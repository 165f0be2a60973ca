//! # formctl-forms
//!
//! The form controller for formctl. A form is declared as a [`FormSchema`] of
//! [`FieldDef`]s; a [`FormController`] built from it validates each field as
//! it changes, submits through a caller-supplied [`SubmitHandler`], maps server
//! failures back onto fields or a single message, and arms the navigation
//! guard while the form holds unsaved input.
//!
//! ## Modules
//!
//! - [`values`] - The name → value map handed in as defaults and out to handlers
//! - [`fields`] - Field types, built-in rules, and error codes
//! - [`schema`] - Form schemas and cross-field rules
//! - [`validation`] - Per-field validators and the validation pipeline
//! - [`state`] - Field and form state snapshots
//! - [`server_error`] - Transport errors and the server error classifier
//! - [`submit`] - The submit handler contract
//! - [`controller`] - The form controller and its field render contract

pub mod controller;
pub mod fields;
pub mod schema;
pub mod server_error;
pub mod state;
pub mod submit;
pub mod validation;
pub mod values;

pub use controller::{FieldHandle, FormController, FormControllerBuilder, SubmitOutcome};
pub use fields::{FieldDef, FieldType};
pub use schema::FormSchema;
pub use server_error::{
    ServerErrorClassifier, ServerErrorOutcome, TransportError, ValidationErrorMapper,
};
pub use state::{FieldState, FormState, SubmitPhase};
pub use submit::{FnSubmitHandler, SubmitHandler};
pub use validation::{FieldErrors, FieldValidator};
pub use values::FormValues;
