//! # formctl-core
//!
//! Core types for formctl: error types, settings, logging setup, and message
//! translation. This crate has no other formctl dependencies and is the
//! foundation for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Validation and library error types
//! - [`form_id`] - Identifiers for live form instances
//! - [`settings`] - Global configuration with sensible defaults
//! - [`settings_loader`] - TOML/JSON loading with environment overrides
//! - [`logging`] - Tracing-based logging integration
//! - [`i18n`] - Translation catalog for user-visible messages

pub mod error;
pub mod form_id;
pub mod i18n;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{FormError, FormResult, ValidationError};
pub use form_id::FormId;
pub use settings::{Settings, DEFAULT_SERVER_ERROR_MESSAGE, SETTINGS};
