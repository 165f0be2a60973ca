//! # formctl-signals
//!
//! Signal dispatcher for formctl. Form controllers use signals to publish
//! state changes to presentation code, and the navigation guard uses the
//! global [`SIGNALS.before_unload`](SignalRegistry::before_unload) signal as
//! its boundary to the host environment: the host dispatches a
//! [`BeforeUnload`] event for every reload, tab close, or back navigation,
//! and any connected receiver may demand a confirmation prompt.
//!
//! ## Usage
//!
//! ```
//! use formctl_signals::Signal;
//! use std::sync::Arc;
//!
//! let signal: Signal<u32> = Signal::new();
//!
//! signal.connect("printer", Arc::new(|value: &u32| {
//!     println!("changed: {value}");
//!     None
//! }));
//!
//! let results = signal.send(&7);
//! assert_eq!(results.len(), 1);
//! ```

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

/// The type signature for a signal receiver callback.
///
/// Receivers accept a reference to the signal payload and may optionally
/// return a boxed value.
pub type SignalReceiver<T> = Arc<dyn Fn(&T) -> Option<Box<dyn Any + Send>> + Send + Sync>;

/// A signal that can be connected to and dispatched.
///
/// Receivers are called in the order they were connected. A receiver may
/// connect or disconnect receivers on the same signal while it runs; the
/// change takes effect from the next dispatch.
pub struct Signal<T: 'static> {
    receivers: RwLock<Vec<(String, SignalReceiver<T>)>>,
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Signal<T> {
    /// Creates a new signal with no connected receivers.
    pub fn new() -> Self {
        Self {
            receivers: RwLock::new(Vec::new()),
        }
    }

    /// Connects a receiver to this signal.
    ///
    /// If a receiver with the same ID is already connected, it is replaced,
    /// so connecting twice under one ID never registers two receivers.
    pub fn connect(&self, receiver_id: impl Into<String>, callback: SignalReceiver<T>) {
        let id = receiver_id.into();
        let mut receivers = self.receivers.write().expect("signal lock poisoned");

        if let Some(entry) = receivers.iter_mut().find(|(rid, _)| *rid == id) {
            entry.1 = callback;
        } else {
            receivers.push((id, callback));
        }
    }

    /// Disconnects the receiver with the given ID.
    ///
    /// Returns `true` if a receiver was found and removed.
    pub fn disconnect(&self, receiver_id: &str) -> bool {
        let mut receivers = self.receivers.write().expect("signal lock poisoned");
        let len_before = receivers.len();
        receivers.retain(|(id, _)| id != receiver_id);
        receivers.len() < len_before
    }

    /// Returns `true` if a receiver with the given ID is connected.
    pub fn is_connected(&self, receiver_id: &str) -> bool {
        self.receivers
            .read()
            .expect("signal lock poisoned")
            .iter()
            .any(|(id, _)| id == receiver_id)
    }

    /// Sends the signal to all connected receivers.
    ///
    /// Returns the return values from each receiver, in connection order.
    pub fn send(&self, sender: &T) -> Vec<Option<Box<dyn Any + Send>>> {
        let receivers: Vec<SignalReceiver<T>> = self
            .receivers
            .read()
            .expect("signal lock poisoned")
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        receivers.iter().map(|callback| callback(sender)).collect()
    }

    /// Returns the number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.receivers.read().expect("signal lock poisoned").len()
    }
}

// ── Host navigation events ───────────────────────────────────────────

/// The kind of navigation the user attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationKind {
    /// The page is being reloaded.
    Reload,
    /// The tab or window is being closed.
    Close,
    /// The user navigated back in history.
    Back,
}

/// Payload of the `before_unload` signal.
///
/// Receivers call [`prevent_default`](Self::prevent_default) to ask the host
/// to show a "leave this page?" confirmation instead of navigating away.
#[derive(Debug)]
pub struct BeforeUnload {
    kind: NavigationKind,
    prevented: AtomicBool,
}

impl BeforeUnload {
    /// Creates an event for the given navigation attempt.
    pub const fn new(kind: NavigationKind) -> Self {
        Self {
            kind,
            prevented: AtomicBool::new(false),
        }
    }

    /// Returns the kind of navigation being attempted.
    pub const fn kind(&self) -> NavigationKind {
        self.kind
    }

    /// Requests a confirmation prompt before the navigation proceeds.
    pub fn prevent_default(&self) {
        self.prevented.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if any receiver requested a confirmation prompt.
    pub fn is_default_prevented(&self) -> bool {
        self.prevented.load(Ordering::SeqCst)
    }
}

/// What the host should do with a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Nothing objected; navigate immediately.
    Proceed,
    /// Ask the user to confirm before leaving.
    ConfirmationRequired,
}

/// Dispatches a [`BeforeUnload`] event on `signal` and reports the outcome.
///
/// This is the entry point a host integration calls when the user tries to
/// leave the page.
pub fn request_navigation(signal: &Signal<BeforeUnload>, kind: NavigationKind) -> NavigationDecision {
    let event = BeforeUnload::new(kind);
    signal.send(&event);
    if event.is_default_prevented() {
        tracing::debug!(?kind, "navigation requires confirmation");
        NavigationDecision::ConfirmationRequired
    } else {
        NavigationDecision::Proceed
    }
}

// ── Global signal registry ───────────────────────────────────────────

/// A global registry holding well-known signals.
pub struct SignalRegistry {
    /// Fired by the host for every attempt to leave the page.
    pub before_unload: Arc<Signal<BeforeUnload>>,
}

impl SignalRegistry {
    fn new() -> Self {
        Self {
            before_unload: Arc::new(Signal::new()),
        }
    }
}

/// The global signal registry instance.
///
/// # Examples
///
/// ```
/// use formctl_signals::{request_navigation, NavigationDecision, NavigationKind, SIGNALS};
///
/// let decision = request_navigation(&SIGNALS.before_unload, NavigationKind::Reload);
/// assert_eq!(decision, NavigationDecision::Proceed);
/// ```
pub static SIGNALS: Lazy<SignalRegistry> = Lazy::new(SignalRegistry::new);
