//! Translation catalog.
//!
//! A global, thread-safe registry of message translations keyed by language
//! code. Translations can be registered programmatically or loaded from JSON:
//!
//! ```json
//! {
//!   "messages": {
//!     "This field is required.": "この項目は必須です"
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::error::FormError;

/// A translation catalog for a single language.
#[derive(Debug, Clone, Default)]
pub struct TranslationCatalog {
    messages: HashMap<String, String>,
}

fn global_catalogs() -> &'static RwLock<HashMap<String, TranslationCatalog>> {
    static CATALOGS: OnceLock<RwLock<HashMap<String, TranslationCatalog>>> = OnceLock::new();
    CATALOGS.get_or_init(|| RwLock::new(HashMap::new()))
}

#[allow(clippy::significant_drop_tightening)]
fn with_catalog_mut<F>(language: &str, f: F)
where
    F: FnOnce(&mut TranslationCatalog),
{
    let mut catalogs = global_catalogs().write().expect("catalog lock poisoned");
    let catalog = catalogs.entry(language.to_string()).or_default();
    f(catalog);
}

// ── Registration API ─────────────────────────────────────────────────────

/// Registers message translations for a language.
///
/// Each entry is a `(msgid, translated)` pair. Entries are merged into any
/// existing catalog, overwriting duplicates.
///
/// # Examples
///
/// ```
/// use formctl_core::i18n::catalog;
///
/// catalog::register_translations("fr", vec![("This field is required.", "Ce champ est obligatoire.")]);
/// assert!(catalog::has_language("fr"));
/// ```
pub fn register_translations(language: &str, entries: Vec<(&str, &str)>) {
    with_catalog_mut(language, |catalog| {
        for (msgid, translated) in entries {
            catalog
                .messages
                .insert(msgid.to_string(), translated.to_string());
        }
    });
}

/// Loads translations from a JSON string with a top-level `"messages"` object.
///
/// # Errors
///
/// Returns [`FormError::SerializationError`] if the JSON is invalid.
pub fn load_from_json(language: &str, json_str: &str) -> Result<(), FormError> {
    let value: serde_json::Value = serde_json::from_str(json_str)?;

    with_catalog_mut(language, |catalog| {
        if let Some(messages) = value.get("messages").and_then(|v| v.as_object()) {
            for (msgid, translated) in messages {
                if let Some(t) = translated.as_str() {
                    catalog.messages.insert(msgid.clone(), t.to_string());
                }
            }
        }
    });

    Ok(())
}

// ── Lookup API ───────────────────────────────────────────────────────────

/// Looks up a translation in the catalog.
pub fn translate(language: &str, msgid: &str) -> Option<String> {
    let catalogs = global_catalogs().read().expect("catalog lock poisoned");
    catalogs
        .get(language)
        .and_then(|catalog| catalog.messages.get(msgid).cloned())
}

/// Returns `true` if translations are registered for the given language.
pub fn has_language(language: &str) -> bool {
    let catalogs = global_catalogs().read().expect("catalog lock poisoned");
    catalogs.contains_key(language)
}

/// Clears all translations for a given language.
pub fn clear_language(language: &str) {
    let mut catalogs = global_catalogs().write().expect("catalog lock poisoned");
    catalogs.remove(language);
}
