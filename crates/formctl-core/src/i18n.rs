//! Message translation.
//!
//! Every user-visible message produced by formctl itself (built-in rule
//! messages and the generic server error message) is passed through
//! [`gettext`] so applications can localize it by registering a catalog.
//!
//! ## Quick Start
//!
//! ```
//! use formctl_core::i18n;
//!
//! i18n::catalog::register_translations("ja", vec![
//!     ("This field is required.", "この項目は必須です"),
//! ]);
//!
//! i18n::activate("ja");
//! assert_eq!(i18n::gettext("This field is required."), "この項目は必須です");
//!
//! i18n::deactivate();
//! assert_eq!(i18n::gettext("This field is required."), "This field is required.");
//! ```

pub mod catalog;

use std::cell::RefCell;

use crate::settings::Settings;

// ── Thread-local language state ──────────────────────────────────────────

thread_local! {
    static CURRENT_LANGUAGE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Activates the given language code for the current thread.
pub fn activate(language_code: &str) {
    CURRENT_LANGUAGE.with(|cell| {
        *cell.borrow_mut() = Some(language_code.to_string());
    });
}

/// Activates the language configured in `settings` for the current thread.
pub fn activate_from_settings(settings: &Settings) {
    activate(&settings.language_code);
}

/// Deactivates the current thread's language setting, reverting to the default.
///
/// After deactivation, `get_language()` returns `"en"`.
pub fn deactivate() {
    CURRENT_LANGUAGE.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

/// Returns the language code active on the current thread, or `"en"`.
pub fn get_language() -> String {
    CURRENT_LANGUAGE.with(|cell| cell.borrow().clone().unwrap_or_else(|| "en".to_string()))
}

/// Translates a message using the current thread's active language.
///
/// If no translation is found, returns the original `msgid`.
pub fn gettext(msgid: &str) -> String {
    let lang = get_language();
    catalog::translate(&lang, msgid).unwrap_or_else(|| msgid.to_string())
}
