//! # formctl
//!
//! A schema-validated form controller with server-error mapping and a
//! dirty-form navigation guard.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `formctl` to get everything, or depend on individual
//! crates for finer-grained control.
//!
//! ## Quick start
//!
//! ```
//! use formctl::prelude::*;
//!
//! let schema = FormSchema::new().field(
//!     FieldDef::char("message", Some(150), Some(2000))
//!         .error_message("min_length", "150文字以上必須です"),
//! );
//!
//! let form = FormController::builder(schema)
//!     .default_values(FormValues::new().with("message", ""))
//!     .on_submit(|values| async move {
//!         formctl::tracing::info!(fields = values.len(), "sending contact form");
//!         formctl::anyhow::Ok(())
//!     })
//!     .prevent_reload(true)
//!     .build()
//!     .unwrap();
//!
//! form.field("message").unwrap().handle_change(json!("short"));
//! assert_eq!(
//!     form.field("message").unwrap().error().as_deref(),
//!     Some("150文字以上必須です")
//! );
//! ```

/// Error types, settings, logging, and i18n.
pub use formctl_core as core;

/// Signal dispatcher and the host before-unload channel.
pub use formctl_signals as signals;

/// The dirty-form navigation guard.
pub use formctl_guard as guard;

/// Schemas, validation, server error mapping, and the form controller.
pub use formctl_forms as forms;

/// Test doubles for submit handlers and navigation.
#[cfg(feature = "testing")]
pub use formctl_test as test;

pub use anyhow;
pub use serde_json;
pub use tracing;

use formctl_core::{i18n, logging, Settings, SETTINGS};

/// Applies process-wide settings: stores them in [`SETTINGS`], installs the
/// tracing subscriber, and activates the configured language on the calling
/// thread.
///
/// Call once at startup. A second call keeps the first settings but still
/// activates the language on the calling thread.
pub fn init(settings: Settings) {
    logging::setup_logging(&settings);
    i18n::activate_from_settings(&settings);
    if SETTINGS.is_configured() {
        tracing::warn!("formctl settings already configured; ignoring new settings");
        return;
    }
    SETTINGS.configure(settings);
    tracing::debug!("formctl initialized");
}

/// The types most forms need.
pub mod prelude {
    pub use formctl_core::{FormError, FormId, FormResult, Settings, ValidationError};
    pub use formctl_forms::{
        FieldDef, FieldErrors, FieldHandle, FieldState, FieldType, FormController, FormSchema,
        FormState, FormValues, ServerErrorOutcome, SubmitHandler, SubmitOutcome, TransportError,
        ValidationErrorMapper,
    };
    pub use formctl_guard::NavigationGuard;
    pub use formctl_signals::{request_navigation, NavigationDecision, NavigationKind, SIGNALS};
    pub use serde_json::json;
}
