//! Settings for formctl.
//!
//! [`Settings`] holds the process-wide defaults used by form controllers, and
//! [`LazySettings`] is a globally accessible, configure-once holder for them.
//! Controllers fall back to [`Settings::default`] when nothing was configured.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// The message shown when a submission fails for a reason that cannot be
/// attributed to a particular field.
pub const DEFAULT_SERVER_ERROR_MESSAGE: &str =
    "エラーが発生しました。時間を空けて再度お試しください。";

/// The complete set of formctl settings.
///
/// # Examples
///
/// ```
/// use formctl_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(!settings.prevent_reload);
/// assert_eq!(settings.log_level, "info");
/// assert!(settings.server_error_message.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled. Selects the human-readable log format.
    pub debug: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log filter directive (e.g. "info", "formctl_forms=debug").
    pub log_level: String,

    // ── Internationalization ─────────────────────────────────────────

    /// The language activated for message lookups (e.g. "en", "ja").
    pub language_code: String,

    // ── Forms ────────────────────────────────────────────────────────

    /// Default for a controller's `prevent_reload` flag when the caller does not set one.
    pub prevent_reload: bool,
    /// Overrides the generic server error message. `None` uses the translated default.
    pub server_error_message: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            language_code: "en".to_string(),
            prevent_reload: false,
            server_error_message: None,
        }
    }
}

/// A lazily-configured, globally accessible settings holder.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called exactly once.
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured.
    pub fn configure(&self, settings: Settings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns a reference to the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if settings have not been configured.
    pub fn get(&self) -> &Settings {
        self.inner
            .get()
            .expect("Settings have not been configured. Call SETTINGS.configure() first.")
    }

    /// Returns the configured settings, if any.
    pub fn try_get(&self) -> Option<&Settings> {
        self.inner.get()
    }

    /// Returns the configured settings, or a fresh default set.
    pub fn get_or_default(&self) -> Settings {
        self.try_get().cloned().unwrap_or_default()
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
///
/// Call `SETTINGS.configure(settings)` once at application startup.
pub static SETTINGS: LazySettings = LazySettings::new();
