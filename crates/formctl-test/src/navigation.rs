//! An isolated navigation guard for tests.
//!
//! Every form shares [`NavigationGuard::global`] by default, and tests running
//! in parallel would trip over each other through it. [`NavigationHarness`]
//! owns a private before-unload channel and a guard bound to it; pass
//! [`guard`](NavigationHarness::guard) to a controller builder and drive
//! navigation attempts with [`attempt`](NavigationHarness::attempt).

use std::sync::Arc;

use formctl_guard::NavigationGuard;
use formctl_signals::{request_navigation, BeforeUnload, NavigationDecision, NavigationKind, Signal};

/// A private before-unload channel with its own guard.
pub struct NavigationHarness {
    host: Arc<Signal<BeforeUnload>>,
    guard: Arc<NavigationGuard>,
}

impl Default for NavigationHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationHarness {
    pub fn new() -> Self {
        let host = Arc::new(Signal::new());
        let guard = Arc::new(NavigationGuard::new(Arc::clone(&host)));
        Self { host, guard }
    }

    /// Returns the guard to hand to controllers under test.
    pub fn guard(&self) -> Arc<NavigationGuard> {
        Arc::clone(&self.guard)
    }

    /// Returns the before-unload channel the guard listens on.
    pub fn host(&self) -> Arc<Signal<BeforeUnload>> {
        Arc::clone(&self.host)
    }

    /// Simulates a navigation attempt of the given kind.
    pub fn attempt(&self, kind: NavigationKind) -> NavigationDecision {
        request_navigation(&self.host, kind)
    }

    /// Returns `true` if a reload would ask for confirmation.
    pub fn is_blocked(&self) -> bool {
        self.attempt(NavigationKind::Reload) == NavigationDecision::ConfirmationRequired
    }

    /// Asserts that every kind of navigation asks for confirmation.
    ///
    /// # Panics
    ///
    /// Panics if any kind proceeds.
    pub fn assert_blocked(&self) {
        for kind in [NavigationKind::Reload, NavigationKind::Close, NavigationKind::Back] {
            assert_eq!(
                self.attempt(kind),
                NavigationDecision::ConfirmationRequired,
                "Expected {kind:?} to require confirmation"
            );
        }
    }

    /// Asserts that every kind of navigation proceeds.
    ///
    /// # Panics
    ///
    /// Panics if any kind asks for confirmation.
    pub fn assert_allowed(&self) {
        for kind in [NavigationKind::Reload, NavigationKind::Close, NavigationKind::Back] {
            assert_eq!(
                self.attempt(kind),
                NavigationDecision::Proceed,
                "Expected {kind:?} to proceed"
            );
        }
    }
}
