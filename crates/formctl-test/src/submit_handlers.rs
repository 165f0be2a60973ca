//! Recording and gated submit handlers.
//!
//! [`RecordingSubmitHandler`] captures every set of values it is handed and
//! answers with a scripted response. [`GatedSubmitHandler`] does the same but
//! parks inside `submit` until the test opens the gate, which makes the
//! in-flight window observable.
//!
//! ## Example
//!
//! ```rust,no_run
//! use formctl_test::submit_handlers::RecordingSubmitHandler;
//!
//! let handler = RecordingSubmitHandler::new();
//! handler.fail_with("backend offline");
//! // ... build a controller with `handler.as_submit_handler()` and submit ...
//! handler.assert_call_count(1);
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use formctl_forms::server_error::TransportError;
use formctl_forms::submit::SubmitHandler;
use formctl_forms::values::FormValues;

/// How a scripted handler answers.
#[derive(Debug, Clone, Default)]
pub enum ScriptedResponse {
    /// Resolve successfully.
    #[default]
    Succeed,
    /// Fail with a plain error carrying this message.
    Fail(String),
    /// Fail with a transport error.
    Transport(TransportError),
}

impl ScriptedResponse {
    fn into_result(self) -> anyhow::Result<()> {
        match self {
            Self::Succeed => Ok(()),
            Self::Fail(message) => Err(anyhow::anyhow!(message)),
            Self::Transport(err) => Err(anyhow::Error::new(err)),
        }
    }
}

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<FormValues>,
    response: ScriptedResponse,
}

/// A submit handler that records its calls.
///
/// Clones share the same recording, so a test can keep one clone for
/// assertions and hand another to the controller.
#[derive(Debug, Clone, Default)]
pub struct RecordingSubmitHandler {
    recording: Arc<Mutex<Recording>>,
}

impl RecordingSubmitHandler {
    /// Creates a handler that succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this handler as a trait object for a controller builder.
    pub fn as_submit_handler(&self) -> Arc<dyn SubmitHandler> {
        Arc::new(self.clone())
    }

    /// Answers every later call with `response`.
    pub fn respond_with(&self, response: ScriptedResponse) {
        self.lock().response = response;
    }

    /// Answers every later call successfully.
    pub fn succeed(&self) {
        self.respond_with(ScriptedResponse::Succeed);
    }

    /// Answers every later call with a plain error.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.respond_with(ScriptedResponse::Fail(message.into()));
    }

    /// Answers every later call with a transport error.
    pub fn fail_with_transport(&self, error: TransportError) {
        self.respond_with(ScriptedResponse::Transport(error));
    }

    /// Returns the values of every call, oldest first.
    pub fn calls(&self) -> Vec<FormValues> {
        self.lock().calls.clone()
    }

    /// Returns the number of calls.
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Returns the values of the most recent call, if any.
    pub fn last_values(&self) -> Option<FormValues> {
        self.lock().calls.last().cloned()
    }

    /// Asserts that the handler was called exactly `expected` times.
    ///
    /// # Panics
    ///
    /// Panics if the count does not match.
    pub fn assert_call_count(&self, expected: usize) {
        let actual = self.call_count();
        assert_eq!(
            actual, expected,
            "Expected {expected} submit call(s), but {actual} were made"
        );
    }

    /// Asserts that the handler was never called.
    ///
    /// # Panics
    ///
    /// Panics if any call was recorded.
    pub fn assert_not_called(&self) {
        self.assert_call_count(0);
    }

    fn record(&self, values: FormValues) -> ScriptedResponse {
        let mut recording = self.lock();
        recording.calls.push(values);
        recording.response.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recording> {
        self.recording
            .lock()
            .expect("RecordingSubmitHandler lock poisoned")
    }
}

#[async_trait]
impl SubmitHandler for RecordingSubmitHandler {
    async fn submit(&self, values: FormValues) -> anyhow::Result<()> {
        self.record(values).into_result()
    }
}

/// A submit handler that blocks until released.
///
/// The call is recorded on entry, then the handler waits for [`open`](Self::open)
/// before answering with its scripted response. Both signals store a permit,
/// so `open` may be called before the handler is entered.
#[derive(Debug, Clone, Default)]
pub struct GatedSubmitHandler {
    recorder: RecordingSubmitHandler,
    entered: Arc<Notify>,
    gate: Arc<Notify>,
}

impl GatedSubmitHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this handler as a trait object for a controller builder.
    pub fn as_submit_handler(&self) -> Arc<dyn SubmitHandler> {
        Arc::new(self.clone())
    }

    /// Returns the recorder holding this handler's calls and response.
    pub const fn recorder(&self) -> &RecordingSubmitHandler {
        &self.recorder
    }

    /// Waits until a call has entered the handler.
    pub async fn wait_until_entered(&self) {
        self.entered.notified().await;
    }

    /// Lets one waiting (or the next) call finish.
    pub fn open(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl SubmitHandler for GatedSubmitHandler {
    async fn submit(&self, values: FormValues) -> anyhow::Result<()> {
        let response = self.recorder.record(values);
        self.entered.notify_one();
        self.gate.notified().await;
        response.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_captures_values() {
        let handler = RecordingSubmitHandler::new();
        handler
            .submit(FormValues::new().with("message", "hi"))
            .await
            .unwrap();
        handler.assert_call_count(1);
        assert_eq!(
            handler.last_values().unwrap().get("message"),
            Some(&serde_json::json!("hi"))
        );
    }

    #[tokio::test]
    async fn test_recording_scripted_failures() {
        let handler = RecordingSubmitHandler::new();
        handler.fail_with("offline");
        let err = handler.submit(FormValues::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "offline");

        handler.fail_with_transport(TransportError::new("bad").with_status(422));
        let err = handler.submit(FormValues::new()).await.unwrap_err();
        assert!(err.downcast_ref::<TransportError>().is_some());

        handler.succeed();
        assert!(handler.submit(FormValues::new()).await.is_ok());
        assert_eq!(handler.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_clones_share_recording() {
        let handler = RecordingSubmitHandler::new();
        let object = handler.as_submit_handler();
        object.submit(FormValues::new()).await.unwrap();
        handler.assert_call_count(1);
    }

    #[tokio::test]
    async fn test_gate_opened_before_entry() {
        let handler = GatedSubmitHandler::new();
        handler.open();
        handler.submit(FormValues::new()).await.unwrap();
        handler.wait_until_entered().await;
        handler.recorder().assert_call_count(1);
    }

    #[tokio::test]
    async fn test_gate_holds_until_opened() {
        let handler = GatedSubmitHandler::new();
        let task = tokio::spawn({
            let handler = handler.clone();
            async move { handler.submit(FormValues::new()).await }
        });

        handler.wait_until_entered().await;
        assert!(!task.is_finished());
        handler.open();
        assert!(task.await.unwrap().is_ok());
    }
}
