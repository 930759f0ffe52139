//! Page-level runtime: one registration per discovered form.

use std::collections::BTreeMap;
use std::sync::Arc;

use leadform_core::{
    CAPTION_UNSET, ContactMode, Document, Error as CoreError, FieldRule, FormId, FormState,
    MaskController, RuleValidatorFactory, SharedForm, ValidationReport, Validator,
    ValidatorFactory, bind_validator, classes, compute_rules, lock_form, set_contact_mode,
    submit_ready,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::SubmitResult;
use crate::pipeline::{Failure, SkipReason, SubmissionPipeline, SubmitOutcome};

/// Events raised by validators and consumed by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteEvent {
    ValidSubmit(FormId),
}

/// What pressing a submit or retry button started.
#[derive(Debug)]
pub enum Dispatch {
    /// A request is in flight on its own task.
    Sent(JoinHandle<SubmitOutcome>),
    /// Nothing was sent.
    Skipped(SkipReason),
    /// The validator rejected the form.
    Rejected(ValidationReport),
}

impl Dispatch {
    pub fn is_sent(&self) -> bool {
        matches!(self, Dispatch::Sent(_))
    }

    /// Wait for the request, if any, to settle.
    pub async fn outcome(self) -> SubmitOutcome {
        match self {
            Dispatch::Sent(handle) => handle
                .await
                .unwrap_or_else(|err| SubmitOutcome::Failed(Failure::Transport(err.to_string()))),
            Dispatch::Skipped(reason) => SubmitOutcome::Skipped(reason),
            Dispatch::Rejected(report) => {
                SubmitOutcome::Skipped(SkipReason::Invalid(report.issues.len()))
            }
        }
    }
}

/// Per-form state owned by the site.
pub struct FormRegistration {
    pub id: FormId,
    pub form: SharedForm,
    pub mode: ContactMode,
    mask: MaskController,
    validator: Option<Box<dyn Validator>>,
    rules: Vec<FieldRule>,
}

impl FormRegistration {
    fn new(id: FormId, form: SharedForm) -> Self {
        Self {
            id,
            form,
            mode: ContactMode::Unset,
            mask: MaskController::phone(),
            validator: None,
            rules: Vec::new(),
        }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn mask(&self) -> &MaskController {
        &self.mask
    }

    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }
}

/// Wires every lead form on a page to its validator and the pipeline.
pub struct FormSite {
    document: Document,
    registrations: BTreeMap<FormId, FormRegistration>,
    factory: Box<dyn ValidatorFactory>,
    pipeline: Arc<SubmissionPipeline>,
    events_tx: mpsc::UnboundedSender<SiteEvent>,
    events_rx: mpsc::UnboundedReceiver<SiteEvent>,
}

impl FormSite {
    pub fn new(document: Document, pipeline: SubmissionPipeline) -> Self {
        Self::with_factory(document, pipeline, Box::new(RuleValidatorFactory))
    }

    pub fn with_factory(
        document: Document,
        pipeline: SubmissionPipeline,
        factory: Box<dyn ValidatorFactory>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            document,
            registrations: BTreeMap::new(),
            factory,
            pipeline: Arc::new(pipeline),
            events_tx,
            events_rx,
        }
    }

    /// Discover lead forms and bind each one. A form whose setup fails is
    /// logged and left unregistered; the others are unaffected.
    pub fn init(&mut self) -> Vec<FormId> {
        let mut ready = Vec::new();
        for (id, form) in self.document.discover_forms() {
            if let Some(group) = lock_form(&form).contact_group.as_mut() {
                group.caption = CAPTION_UNSET.to_string();
            }
            self.registrations
                .insert(id, FormRegistration::new(id, form));
            match self.rebind(id) {
                Ok(mode) => {
                    info!(event = "form_registered", form = %id, mode = %mode);
                    ready.push(id);
                }
                Err(err) => {
                    error!(event = "form_setup_failed", form = %id, error = %err);
                    self.registrations.remove(&id);
                }
            }
        }
        ready
    }

    /// Rebuild the form's contact controls, rules and validator from scratch.
    pub fn rebind(&mut self, id: FormId) -> SubmitResult<ContactMode> {
        let registration = self
            .registrations
            .get_mut(&id)
            .ok_or_else(|| CoreError::Configuration(format!("form {id} is not registered")))?;

        let (mode, rules) = {
            let mut form = lock_form(&registration.form);
            if let Some(mut previous) = registration.validator.take() {
                previous.destroy(&mut form);
            }
            let mode = FormState::capture(id, &form).mode();
            set_contact_mode(&mut form, id, mode, &mut registration.mask);
            let rules = compute_rules(&FormState::capture(id, &form));
            (mode, rules)
        };

        let mut validator =
            bind_validator(&self.document, id, Some(rules.clone()), self.factory.as_ref())?;
        let events = self.events_tx.clone();
        validator.on_valid_submit(Box::new(move |form| {
            if events.send(SiteEvent::ValidSubmit(form)).is_err() {
                warn!(event = "event_bus_closed", form = %form);
            }
        }));

        registration.validator = Some(validator);
        registration.rules = rules;
        registration.mode = mode;
        refresh_readiness(registration);
        Ok(mode)
    }

    /// Contact selector changed.
    pub fn select_contact(&mut self, id: FormId, value: &str) -> SubmitResult<ContactMode> {
        let registration = self.registration_result(id)?;
        let found = lock_form(&registration.form).set_value(classes::SELECT, value);
        if !found {
            return Err(CoreError::Configuration(format!("form {id} has no contact selector")).into());
        }
        self.rebind(id)
    }

    /// User typed into a control. Phone input goes through the mask; a new
    /// contact selector value rebinds the form.
    pub fn input(&mut self, id: FormId, class: &str, value: &str) -> SubmitResult<()> {
        if class == classes::SELECT {
            return self.select_contact(id, value).map(|_| ());
        }
        let registration = self.registration_result(id)?;
        let value = if class == classes::PHONE {
            registration.mask.apply(value)
        } else {
            value.to_string()
        };
        {
            let mut form = lock_form(&registration.form);
            let Some(control) = form.control_mut(class) else {
                return Err(
                    CoreError::Configuration(format!("form {id} has no control .{class}")).into(),
                );
            };
            control.filled = !value.is_empty();
            control.value = value;
        }
        refresh_readiness(registration);
        Ok(())
    }

    /// Submit through the validator gate. A valid form enters `submitting`
    /// right away and its request runs on a spawned task, so the site stays
    /// usable while it is in flight.
    pub fn submit(&mut self, id: FormId) -> SubmitResult<Dispatch> {
        let registration = self
            .registrations
            .get_mut(&id)
            .ok_or_else(|| CoreError::Configuration(format!("form {id} is not registered")))?;
        let report = {
            let mut form = lock_form(&registration.form);
            match registration.validator.as_mut() {
                Some(validator) => validator.handle_submit(&mut form),
                None => {
                    return Err(
                        CoreError::Configuration(format!("form {id} has no validator")).into(),
                    );
                }
            }
        };

        let mut dispatch = None;
        while let Ok(SiteEvent::ValidSubmit(form_id)) = self.events_rx.try_recv() {
            if let Some(started) = self.dispatch(form_id)
                && form_id == id
            {
                dispatch = Some(started);
            }
        }
        Ok(dispatch.unwrap_or(Dispatch::Rejected(report)))
    }

    fn dispatch(&self, id: FormId) -> Option<Dispatch> {
        let form = Arc::clone(&self.registrations.get(&id)?.form);
        let record = match self.pipeline.begin(id, &form) {
            Ok(record) => record,
            Err(reason) => return Some(Dispatch::Skipped(reason)),
        };
        let pipeline = Arc::clone(&self.pipeline);
        Some(Dispatch::Sent(tokio::spawn(async move {
            pipeline.complete(record).await
        })))
    }

    /// "Retry" button of the error modal.
    pub fn retry(&self) -> Dispatch {
        if self.pipeline.store().is_empty() {
            return Dispatch::Skipped(SkipReason::NothingToRetry);
        }
        let pipeline = Arc::clone(&self.pipeline);
        Dispatch::Sent(tokio::spawn(async move { pipeline.retry().await }))
    }

    /// "OK" button of a modal.
    pub fn acknowledge(&self, modal: Option<&str>) {
        self.pipeline.bridge().acknowledge(modal);
    }

    pub fn registration(&self, id: FormId) -> Option<&FormRegistration> {
        self.registrations.get(&id)
    }

    pub fn form_ids(&self) -> Vec<FormId> {
        self.registrations.keys().copied().collect()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn pipeline(&self) -> &SubmissionPipeline {
        &self.pipeline
    }

    fn registration_result(&self, id: FormId) -> SubmitResult<&FormRegistration> {
        self.registrations
            .get(&id)
            .ok_or_else(|| CoreError::Configuration(format!("form {id} is not registered")).into())
    }
}

/// Keep the submit button in step with the bound rules. Left untouched while
/// a request is in flight.
fn refresh_readiness(registration: &FormRegistration) {
    let mut form = lock_form(&registration.form);
    if form.submitting {
        return;
    }
    let ready = submit_ready(&form, &registration.rules);
    form.set_submit_disabled(!ready);
}
