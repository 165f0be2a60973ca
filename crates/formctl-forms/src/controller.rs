//! The form controller.
//!
//! [`FormController`] owns one form's field-state engine and its submission
//! lifecycle. It validates every change against the field's rule, re-derives
//! [`FormState`] after every mutation, keeps the navigation guard in step
//! with the form's touched state, and routes submit failures through the
//! [`ServerErrorClassifier`].
//!
//! ```text
//! IDLE ──submit──▶ VALIDATING ──invalid──▶ IDLE
//!                      │
//!                    valid
//!                      ▼
//!                 SUBMITTING ──success / classified failure──▶ IDLE
//! ```
//!
//! State lives behind a mutex that is never held across the submit handler's
//! `.await`, and subscribers are notified with the lock released, so a
//! subscriber may call back into the controller.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tracing::Instrument;

use formctl_core::logging::form_span;
use formctl_core::{FormError, FormId, FormResult, Settings, SETTINGS};
use formctl_guard::NavigationGuard;
use formctl_signals::{Signal, SignalReceiver};

use crate::schema::{FormSchema, FormValidatorFn};
use crate::server_error::{ServerErrorClassifier, ServerErrorOutcome, ValidationErrorMapper};
use crate::state::{FieldState, FormState, SubmitPhase};
use crate::submit::{FnSubmitHandler, SubmitHandler};
use crate::validation::{clean_fields, clean_form, FieldErrors, FieldValidator, ValidatorMap};
use crate::values::FormValues;

/// What a call to [`FormController::submit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The handler ran and succeeded.
    Submitted,
    /// At least one field failed its rule; the handler was not called.
    Invalid(FieldErrors),
    /// The handler failed; the classified failure has been applied to state.
    Rejected(ServerErrorOutcome),
    /// A submit was already in flight; this call did nothing.
    AlreadySubmitting,
}

impl SubmitOutcome {
    /// Returns `true` for [`SubmitOutcome::Submitted`].
    pub const fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted)
    }
}

struct EngineState {
    fields: BTreeMap<String, FieldState>,
    phase: SubmitPhase,
    submit_count: u32,
    server_error_message: String,
}

impl EngineState {
    fn from_defaults(defaults: &FormValues) -> Self {
        Self {
            fields: defaults
                .iter()
                .map(|(name, value)| (name.clone(), FieldState::new(value.clone())))
                .collect(),
            phase: SubmitPhase::Idle,
            submit_count: 0,
            server_error_message: String::new(),
        }
    }

    fn snapshot(&self) -> FormState {
        FormState::derive(
            self.fields.clone(),
            self.phase,
            self.submit_count,
            self.server_error_message.clone(),
        )
    }

    fn values(&self) -> FormValues {
        self.fields
            .iter()
            .map(|(name, f)| (name.clone(), f.value.clone()))
            .collect()
    }

    fn restore(&mut self, defaults: &FormValues) {
        for (name, value) in defaults.iter() {
            self.fields.insert(name.clone(), FieldState::new(value.clone()));
        }
        self.server_error_message.clear();
    }
}

/// A schema-validated form with a managed submission lifecycle.
///
/// # Examples
///
/// ```
/// use formctl_forms::controller::{FormController, SubmitOutcome};
/// use formctl_forms::fields::FieldDef;
/// use formctl_forms::schema::FormSchema;
/// use formctl_forms::values::FormValues;
///
/// # tokio_test_block(async {
/// let form = FormController::builder(
///     FormSchema::new().field(FieldDef::char("message", Some(3), Some(100))),
/// )
/// .default_values(FormValues::new().with("message", ""))
/// .on_submit(|_values| async { anyhow::Ok(()) })
/// .build()
/// .unwrap();
///
/// form.field("message").unwrap().handle_change("hello".into());
/// assert!(form.is_valid());
/// assert_eq!(form.submit().await, SubmitOutcome::Submitted);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct FormController {
    id: FormId,
    validators: ValidatorMap,
    form_validators: Vec<FormValidatorFn>,
    defaults: FormValues,
    handler: Arc<dyn SubmitHandler>,
    classifier: ServerErrorClassifier,
    guard: Arc<NavigationGuard>,
    prevent_reload: bool,
    reset_on_success: bool,
    engine: Mutex<EngineState>,
    changed: Signal<FormState>,
}

impl FormController {
    /// Starts building a controller for `schema`.
    pub fn builder(schema: FormSchema) -> FormControllerBuilder {
        FormControllerBuilder::new(schema)
    }

    /// Builds a controller from the four required inputs.
    ///
    /// # Errors
    ///
    /// See [`FormControllerBuilder::build`].
    pub fn new<F, Fut>(
        schema: FormSchema,
        default_values: FormValues,
        on_submit: F,
        prevent_reload: bool,
    ) -> FormResult<Self>
    where
        F: Fn(FormValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::builder(schema)
            .default_values(default_values)
            .on_submit(on_submit)
            .prevent_reload(prevent_reload)
            .build()
    }

    /// Returns this form's identity.
    pub const fn id(&self) -> FormId {
        self.id
    }

    /// Returns a fresh snapshot of the form.
    pub fn state(&self) -> FormState {
        self.lock().snapshot()
    }

    pub fn is_valid(&self) -> bool {
        self.lock().fields.values().all(|f| f.error.is_none())
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().phase == SubmitPhase::Submitting
    }

    pub fn is_touched(&self) -> bool {
        self.lock().fields.values().any(|f| f.touched)
    }

    /// Returns the generic server failure message, or an empty string.
    pub fn server_error_message(&self) -> String {
        self.lock().server_error_message.clone()
    }

    /// Returns the current raw value of every field.
    pub fn values(&self) -> FormValues {
        self.lock().values()
    }

    /// Returns the render contract for one field.
    ///
    /// # Errors
    ///
    /// [`FormError::UnknownField`] if `name` is not in the schema.
    pub fn field(&self, name: &str) -> FormResult<FieldHandle<'_>> {
        let validator = self.validator(name)?;
        Ok(FieldHandle {
            controller: self,
            name: validator.name().to_string(),
        })
    }

    /// Sets a field's value as if the user had typed it.
    ///
    /// # Errors
    ///
    /// [`FormError::UnknownField`] if `name` is not in the schema.
    pub fn set_value(&self, name: &str, value: Value) -> FormResult<()> {
        let validator = self.validator(name)?;
        self.change(validator, value);
        Ok(())
    }

    /// Marks a field touched as if it had lost focus.
    ///
    /// # Errors
    ///
    /// [`FormError::UnknownField`] if `name` is not in the schema.
    pub fn blur(&self, name: &str) -> FormResult<()> {
        self.validator(name)?;
        self.touch(name);
        Ok(())
    }

    /// Restores the default values and clears touched flags, errors, and the
    /// server message.
    pub fn reset(&self) {
        let snapshot = {
            let mut engine = self.lock();
            engine.restore(&self.defaults);
            self.commit(engine)
        };
        tracing::debug!(form = %self.id, "form reset");
        self.changed.send(&snapshot);
    }

    /// Registers a callback that receives every new [`FormState`].
    ///
    /// Subscribing twice under one `id` replaces the earlier callback.
    pub fn subscribe<F>(&self, id: impl Into<String>, callback: F)
    where
        F: Fn(&FormState) + Send + Sync + 'static,
    {
        let receiver: SignalReceiver<FormState> = Arc::new(move |state: &FormState| {
            callback(state);
            None
        });
        self.changed.connect(id, receiver);
    }

    /// Removes a callback. Returns `true` if one was registered under `id`.
    pub fn unsubscribe(&self, id: &str) -> bool {
        self.changed.disconnect(id)
    }

    /// Validates and submits the form.
    ///
    /// Runs inside a `form` span carrying this controller's id. If the
    /// returned future is dropped while the handler is in flight, the form
    /// returns to idle.
    pub async fn submit(&self) -> SubmitOutcome {
        let span = form_span(&self.id.to_string());
        self.run_submit().instrument(span).await
    }

    async fn run_submit(&self) -> SubmitOutcome {
        let raw = {
            let mut engine = self.lock();
            if engine.phase != SubmitPhase::Idle {
                tracing::debug!("submit ignored while another is in flight");
                return SubmitOutcome::AlreadySubmitting;
            }
            engine.phase = SubmitPhase::Validating;
            engine.values()
        };

        let (cleaned, mut errors) = clean_fields(&self.validators, &raw);
        if errors.is_empty() {
            errors = clean_form(&self.form_validators, &cleaned);
            errors.retain(|name, _| {
                let known = self.validators.contains_key(name);
                if !known {
                    tracing::warn!(field = %name, "dropping form-level error for unknown field");
                }
                known
            });
        }

        if !errors.is_empty() {
            let snapshot = {
                let mut engine = self.lock();
                for (name, field) in &mut engine.fields {
                    field.error = errors.get(name).cloned();
                }
                engine.phase = SubmitPhase::Idle;
                self.commit(engine)
            };
            tracing::info!(invalid_fields = errors.len(), "submit blocked by validation");
            self.changed.send(&snapshot);
            return SubmitOutcome::Invalid(errors);
        }

        let snapshot = {
            let mut engine = self.lock();
            for field in engine.fields.values_mut() {
                field.error = None;
            }
            engine.server_error_message.clear();
            engine.phase = SubmitPhase::Submitting;
            self.commit(engine)
        };
        self.changed.send(&snapshot);

        let _reset = SubmittingReset { controller: self };
        let result = self.handler.submit(cleaned).await;

        match result {
            Ok(()) => {
                let snapshot = {
                    let mut engine = self.lock();
                    engine.phase = SubmitPhase::Idle;
                    engine.submit_count += 1;
                    if self.reset_on_success {
                        engine.restore(&self.defaults);
                    }
                    self.commit(engine)
                };
                tracing::info!(submit_count = snapshot.submit_count, "form submitted");
                self.changed.send(&snapshot);
                SubmitOutcome::Submitted
            }
            Err(err) => {
                let outcome = self.classifier.classify(&err);
                let snapshot = {
                    let mut engine = self.lock();
                    engine.phase = SubmitPhase::Idle;
                    match &outcome {
                        ServerErrorOutcome::FieldErrors(map) => {
                            for (name, message) in map {
                                if let Some(field) = engine.fields.get_mut(name) {
                                    field.error = Some(message.clone());
                                }
                            }
                        }
                        ServerErrorOutcome::GenericMessage(message) => {
                            engine.server_error_message.clone_from(message);
                        }
                    }
                    self.commit(engine)
                };
                tracing::info!(error = %err, "submit rejected");
                self.changed.send(&snapshot);
                SubmitOutcome::Rejected(outcome)
            }
        }
    }

    fn validator(&self, name: &str) -> FormResult<&FieldValidator> {
        self.validators
            .get(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    fn change(&self, validator: &FieldValidator, value: Value) {
        let name = validator.name();
        let validating = {
            let mut engine = self.lock();
            if let Some(field) = engine.fields.get_mut(name) {
                field.is_validating = true;
            }
            engine.snapshot()
        };
        self.changed.send(&validating);

        let error = validator.validate(&value).err().map(|e| e.message);

        let snapshot = {
            let mut engine = self.lock();
            if let Some(field) = engine.fields.get_mut(name) {
                field.value = value;
                field.touched = true;
                field.error.clone_from(&error);
                field.is_validating = false;
            }
            self.commit(engine)
        };
        tracing::debug!(form = %self.id, field = name, valid = error.is_none(), "field changed");
        self.changed.send(&snapshot);
    }

    fn touch(&self, name: &str) {
        let snapshot = {
            let mut engine = self.lock();
            if let Some(field) = engine.fields.get_mut(name) {
                field.touched = true;
            }
            self.commit(engine)
        };
        tracing::debug!(form = %self.id, field = name, "field blurred");
        self.changed.send(&snapshot);
    }

    /// Takes a snapshot and settles the guard before the engine lock is
    /// released, so concurrent edits and resets cannot leave the guard out of
    /// step with the touched flags. Lock order is engine, then guard.
    fn commit(&self, engine: MutexGuard<'_, EngineState>) -> FormState {
        let snapshot = engine.snapshot();
        if self.prevent_reload {
            if snapshot.is_touched {
                self.guard.acquire(self.id);
            } else if self.guard.holds(self.id) {
                self.guard.release(self.id);
            }
        }
        snapshot
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.engine.lock().expect("form state lock poisoned")
    }
}

impl Drop for FormController {
    fn drop(&mut self) {
        if self.guard.holds(self.id) {
            self.guard.release(self.id);
        }
        tracing::debug!(form = %self.id, "form controller dropped");
    }
}

impl fmt::Debug for FormController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormController")
            .field("id", &self.id)
            .field("fields", &self.validators.keys().collect::<Vec<_>>())
            .field("prevent_reload", &self.prevent_reload)
            .field("reset_on_success", &self.reset_on_success)
            .finish_non_exhaustive()
    }
}

/// Returns the controller to idle if a submit is abandoned mid-flight.
struct SubmittingReset<'a> {
    controller: &'a FormController,
}

impl Drop for SubmittingReset<'_> {
    fn drop(&mut self) {
        let Ok(mut engine) = self.controller.engine.lock() else {
            return;
        };
        if engine.phase != SubmitPhase::Submitting {
            return;
        }
        engine.phase = SubmitPhase::Idle;
        let snapshot = engine.snapshot();
        drop(engine);
        tracing::debug!(form = %self.controller.id, "abandoned submit reset to idle");
        self.controller.changed.send(&snapshot);
    }
}

/// The render contract for one field.
///
/// Obtained from [`FormController::field`]; the name is known to be valid.
pub struct FieldHandle<'a> {
    controller: &'a FormController,
    name: String,
}

impl FieldHandle<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field's full state.
    pub fn state(&self) -> FieldState {
        self.controller
            .lock()
            .fields
            .get(&self.name)
            .cloned()
            .unwrap_or_else(|| FieldState::new(Value::Null))
    }

    pub fn value(&self) -> Value {
        self.state().value
    }

    pub fn error(&self) -> Option<String> {
        self.state().error
    }

    pub fn is_validating(&self) -> bool {
        self.state().is_validating
    }

    pub fn is_touched(&self) -> bool {
        self.state().touched
    }

    /// Applies a user edit: validates, stores, and marks the field touched.
    pub fn handle_change(&self, value: Value) {
        if let Some(validator) = self.controller.validators.get(&self.name) {
            self.controller.change(validator, value);
        }
    }

    /// Applies a focus loss: marks the field touched.
    pub fn handle_blur(&self) {
        self.controller.touch(&self.name);
    }
}

impl fmt::Debug for FieldHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHandle")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

/// Builder for [`FormController`].
pub struct FormControllerBuilder {
    schema: FormSchema,
    defaults: Option<FormValues>,
    handler: Option<Arc<dyn SubmitHandler>>,
    prevent_reload: Option<bool>,
    reset_on_success: bool,
    mapper: Option<Arc<dyn ValidationErrorMapper>>,
    guard: Option<Arc<NavigationGuard>>,
    settings: Option<Settings>,
}

impl FormControllerBuilder {
    fn new(schema: FormSchema) -> Self {
        Self {
            schema,
            defaults: None,
            handler: None,
            prevent_reload: None,
            reset_on_success: false,
            mapper: None,
            guard: None,
            settings: None,
        }
    }

    /// Sets the initial value of every field.
    #[must_use]
    pub fn default_values(mut self, values: FormValues) -> Self {
        self.defaults = Some(values);
        self
    }

    /// Sets the submit action from an async closure.
    #[must_use]
    pub fn on_submit<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(FormValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handler = Some(Arc::new(FnSubmitHandler::new(f)));
        self
    }

    /// Sets the submit action from a handler object.
    #[must_use]
    pub fn submit_handler(mut self, handler: Arc<dyn SubmitHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Arms the navigation guard while the form is touched.
    ///
    /// Defaults to [`Settings::prevent_reload`].
    #[must_use]
    pub const fn prevent_reload(mut self, enabled: bool) -> Self {
        self.prevent_reload = Some(enabled);
        self
    }

    /// Resets the form after each successful submit.
    #[must_use]
    pub const fn reset_on_success(mut self, enabled: bool) -> Self {
        self.reset_on_success = enabled;
        self
    }

    /// Sets the strategy that recognizes server validation failures.
    #[must_use]
    pub fn validation_error_mapper<M>(mut self, mapper: M) -> Self
    where
        M: ValidationErrorMapper + 'static,
    {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    /// Uses `guard` instead of [`NavigationGuard::global`].
    #[must_use]
    pub fn guard(mut self, guard: Arc<NavigationGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Uses `settings` instead of the global [`SETTINGS`].
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Resolves every validator and builds the controller.
    ///
    /// # Errors
    ///
    /// - [`FormError::DuplicateField`] or [`FormError::InvalidRegex`] from the schema
    /// - [`FormError::MissingDefault`] if a field has no default value
    /// - [`FormError::UnexpectedDefault`] if a default names no field
    /// - [`FormError::MissingSubmitHandler`] if no submit action was set
    pub fn build(self) -> FormResult<FormController> {
        let validators = self.schema.validators()?;
        let defaults = self.defaults.unwrap_or_default();

        if let Some(missing) = validators.keys().find(|name| !defaults.contains(name)) {
            return Err(FormError::MissingDefault(missing.clone()));
        }
        if let Some(extra) = defaults.names().find(|name| !validators.contains_key(*name)) {
            return Err(FormError::UnexpectedDefault(extra.to_string()));
        }

        let handler = self.handler.ok_or(FormError::MissingSubmitHandler)?;
        let settings = self.settings.unwrap_or_else(|| SETTINGS.get_or_default());
        let prevent_reload = self.prevent_reload.unwrap_or(settings.prevent_reload);

        let mut classifier = ServerErrorClassifier::new(validators.keys().cloned());
        if let Some(mapper) = self.mapper {
            classifier = classifier.with_mapper(mapper);
        }
        classifier = match settings.server_error_message {
            Some(message) => classifier.with_fallback(message),
            None => classifier.with_language(&settings.language_code),
        };

        let id = FormId::new();
        tracing::debug!(
            form = %id,
            fields = validators.len(),
            prevent_reload,
            "form controller built"
        );

        Ok(FormController {
            id,
            engine: Mutex::new(EngineState::from_defaults(&defaults)),
            validators,
            form_validators: self.schema.form_validators().to_vec(),
            defaults,
            handler,
            classifier,
            guard: self.guard.unwrap_or_else(NavigationGuard::global),
            prevent_reload,
            reset_on_success: self.reset_on_success,
            changed: Signal::new(),
        })
    }
}

impl fmt::Debug for FormControllerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormControllerBuilder")
            .field("schema", &self.schema)
            .field("defaults", &self.defaults)
            .field("has_handler", &self.handler.is_some())
            .field("prevent_reload", &self.prevent_reload)
            .field("reset_on_success", &self.reset_on_success)
            .finish_non_exhaustive()
    }
}
