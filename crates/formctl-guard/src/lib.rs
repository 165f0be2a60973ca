//! # formctl-guard
//!
//! The dirty-form navigation guard. While the guard is enabled it keeps a
//! receiver connected to the host's `before_unload` signal, and every attempt
//! to reload, close, or navigate back is answered with a confirmation
//! request.
//!
//! The guard is process-wide state shared by every live form. Forms do not
//! toggle it directly; each touched form with `prevent_reload` set holds the
//! guard through [`NavigationGuard::acquire`] and lets go with
//! [`NavigationGuard::release`]. The guard is armed exactly while at least one
//! form holds it.
//!
//! The guard is best-effort: hosts may ignore a confirmation request, and the
//! guard neither retries nor reports anything when that happens.
//!
//! ## Usage
//!
//! ```
//! use formctl_core::FormId;
//! use formctl_guard::NavigationGuard;
//! use formctl_signals::{request_navigation, NavigationDecision, NavigationKind, Signal};
//! use std::sync::Arc;
//!
//! let host = Arc::new(Signal::new());
//! let guard = NavigationGuard::new(Arc::clone(&host));
//!
//! let form = FormId::new();
//! guard.acquire(form);
//! assert_eq!(
//!     request_navigation(&host, NavigationKind::Reload),
//!     NavigationDecision::ConfirmationRequired
//! );
//!
//! guard.release(form);
//! assert_eq!(request_navigation(&host, NavigationKind::Reload), NavigationDecision::Proceed);
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;

use formctl_core::FormId;
use formctl_signals::{BeforeUnload, Signal, SignalReceiver, SIGNALS};

/// A navigation guard bound to one host `before_unload` signal.
pub struct NavigationGuard {
    host: Arc<Signal<BeforeUnload>>,
    receiver_id: String,
    state: Mutex<GuardState>,
}

#[derive(Default)]
struct GuardState {
    enabled: bool,
    holders: HashSet<FormId>,
}

impl NavigationGuard {
    /// Creates a disabled guard that will intercept navigation on `host`.
    pub fn new(host: Arc<Signal<BeforeUnload>>) -> Self {
        Self {
            host,
            receiver_id: format!("formctl.navigation_guard.{}", uuid::Uuid::new_v4()),
            state: Mutex::new(GuardState::default()),
        }
    }

    /// Returns the process-wide guard attached to [`SIGNALS.before_unload`](SIGNALS).
    pub fn global() -> Arc<Self> {
        Arc::clone(&NAVIGATION_GUARD)
    }

    /// Arms the guard. Calling this while already enabled is a no-op.
    pub fn enable(&self) {
        let mut state = self.lock();
        self.enable_locked(&mut state);
    }

    /// Disarms the guard. Calling this while already disabled is a no-op.
    ///
    /// This ignores outstanding holders; forms should use [`release`](Self::release).
    pub fn disable(&self) {
        let mut state = self.lock();
        self.disable_locked(&mut state);
    }

    /// Returns `true` while navigation is being intercepted.
    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Registers `form` as a holder and arms the guard if needed.
    ///
    /// Returns `true` if `form` was not already a holder.
    pub fn acquire(&self, form: FormId) -> bool {
        let mut state = self.lock();
        let inserted = state.holders.insert(form);
        if inserted {
            tracing::debug!(%form, holders = state.holders.len(), "navigation guard acquired");
        }
        self.enable_locked(&mut state);
        inserted
    }

    /// Removes `form` as a holder and disarms the guard once no holders remain.
    ///
    /// Returns `true` if `form` was a holder.
    pub fn release(&self, form: FormId) -> bool {
        let mut state = self.lock();
        let removed = state.holders.remove(&form);
        if removed {
            tracing::debug!(%form, holders = state.holders.len(), "navigation guard released");
        }
        if state.holders.is_empty() {
            self.disable_locked(&mut state);
        }
        removed
    }

    /// Returns `true` if `form` currently holds the guard.
    pub fn holds(&self, form: FormId) -> bool {
        self.lock().holders.contains(&form)
    }

    /// Returns the number of forms holding the guard.
    pub fn holder_count(&self) -> usize {
        self.lock().holders.len()
    }

    fn enable_locked(&self, state: &mut GuardState) {
        if state.enabled {
            return;
        }
        let receiver: SignalReceiver<BeforeUnload> = Arc::new(|event: &BeforeUnload| {
            event.prevent_default();
            None
        });
        self.host.connect(self.receiver_id.clone(), receiver);
        state.enabled = true;
        tracing::debug!("navigation guard enabled");
    }

    fn disable_locked(&self, state: &mut GuardState) {
        if !state.enabled {
            return;
        }
        self.host.disconnect(&self.receiver_id);
        state.enabled = false;
        tracing::debug!("navigation guard disabled");
    }

    fn lock(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().expect("navigation guard lock poisoned")
    }
}

/// The process-wide guard shared by every form that does not bring its own.
static NAVIGATION_GUARD: Lazy<Arc<NavigationGuard>> =
    Lazy::new(|| Arc::new(NavigationGuard::new(Arc::clone(&SIGNALS.before_unload))));

#[cfg(test)]
mod tests {
    use super::*;
    use formctl_signals::{request_navigation, NavigationDecision, NavigationKind};

    fn isolated() -> (Arc<Signal<BeforeUnload>>, NavigationGuard) {
        let host = Arc::new(Signal::new());
        let guard = NavigationGuard::new(Arc::clone(&host));
        (host, guard)
    }

    #[test]
    fn test_starts_disabled() {
        let (host, guard) = isolated();
        assert!(!guard.is_enabled());
        assert_eq!(host.receiver_count(), 0);
        assert_eq!(guard.holder_count(), 0);
    }

    #[test]
    fn test_enable_is_idempotent() {
        let (host, guard) = isolated();
        guard.enable();
        guard.enable();
        assert!(guard.is_enabled());
        assert_eq!(host.receiver_count(), 1);
    }

    #[test]
    fn test_disable_when_disabled_is_noop() {
        let (host, guard) = isolated();
        guard.disable();
        assert!(!guard.is_enabled());
        guard.enable();
        guard.disable();
        guard.disable();
        assert!(!guard.is_enabled());
        assert_eq!(host.receiver_count(), 0);
    }

    #[test]
    fn test_enabled_guard_intercepts_every_kind() {
        let (host, guard) = isolated();
        guard.enable();
        for kind in [NavigationKind::Reload, NavigationKind::Close, NavigationKind::Back] {
            assert_eq!(
                request_navigation(&host, kind),
                NavigationDecision::ConfirmationRequired
            );
        }
    }

    #[test]
    fn test_acquire_release_counts_holders() {
        let (_host, guard) = isolated();
        let a = FormId::new();
        let b = FormId::new();

        assert!(guard.acquire(a));
        assert!(!guard.acquire(a));
        assert!(guard.acquire(b));
        assert_eq!(guard.holder_count(), 2);
        assert!(guard.is_enabled());

        assert!(guard.release(a));
        assert!(guard.is_enabled());
        assert!(!guard.holds(a));
        assert!(guard.holds(b));

        assert!(guard.release(b));
        assert!(!guard.is_enabled());
        assert!(!guard.release(b));
    }

    #[test]
    fn test_two_guards_on_one_host_do_not_collide() {
        let host = Arc::new(Signal::new());
        let first = NavigationGuard::new(Arc::clone(&host));
        let second = NavigationGuard::new(Arc::clone(&host));

        first.enable();
        second.enable();
        assert_eq!(host.receiver_count(), 2);

        first.disable();
        assert_eq!(
            request_navigation(&host, NavigationKind::Back),
            NavigationDecision::ConfirmationRequired
        );
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&NavigationGuard::global(), &NavigationGuard::global()));
    }
}
