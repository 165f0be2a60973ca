//! # formctl-test
//!
//! Test doubles for formctl. Provides submit handlers that record what they
//! were given and can be scripted to fail or held open mid-flight, and a
//! navigation harness that wires an isolated guard to its own before-unload
//! channel so tests never touch the process-wide one.
//!
//! ## Modules
//!
//! - [`submit_handlers`] - [`RecordingSubmitHandler`] and [`GatedSubmitHandler`]
//! - [`navigation`] - [`NavigationHarness`]

pub mod navigation;
pub mod submit_handlers;

pub use navigation::NavigationHarness;
pub use submit_handlers::{GatedSubmitHandler, RecordingSubmitHandler, ScriptedResponse};
