//! Submission state machine: `idle -> submitting -> {success, error} -> idle`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use leadform_core::{Form, FormId, SharedForm, lock_form};
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::bridge::ModalBridge;
use crate::payload::FormPayload;
use crate::retry::{RetryStore, SubmissionRecord};
use crate::transport::Transport;

/// Caller hook run after a successful submission. Its errors are ignored.
pub type AfterSubmitHook =
    Arc<dyn Fn(FormId) -> Result<(), Box<dyn std::error::Error + Send + Sync>> + Send + Sync>;

/// Why a request did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Status(u16),
    Transport(String),
    Timeout(Duration),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Status(status) => write!(f, "unexpected status {status}"),
            Failure::Transport(err) => write!(f, "transport error: {err}"),
            Failure::Timeout(after) => write!(f, "timed out after {after:?}"),
        }
    }
}

/// Why nothing was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    AlreadySubmitting,
    NothingToRetry,
    /// The validator rejected the form with this many field issues.
    Invalid(usize),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadySubmitting => f.write_str("already submitting"),
            SkipReason::NothingToRetry => f.write_str("nothing to retry"),
            SkipReason::Invalid(issues) => write!(f, "{issues} invalid field(s)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Success,
    Failed(Failure),
    Skipped(SkipReason),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Success)
    }
}

/// Sends validated forms and replays the last one on request.
pub struct SubmissionPipeline {
    transport: Arc<dyn Transport>,
    store: Arc<RetryStore>,
    bridge: ModalBridge,
    destination: Url,
    timeout: Duration,
    after_submit: Option<AfterSubmitHook>,
}

impl SubmissionPipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<RetryStore>,
        bridge: ModalBridge,
        destination: Url,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            store,
            bridge,
            destination,
            timeout,
            after_submit: None,
        }
    }

    pub fn with_after_submit(mut self, hook: AfterSubmitHook) -> Self {
        self.after_submit = Some(hook);
        self
    }

    pub fn store(&self) -> &Arc<RetryStore> {
        &self.store
    }

    pub fn bridge(&self) -> &ModalBridge {
        &self.bridge
    }

    pub fn destination(&self) -> &Url {
        &self.destination
    }

    /// Send the form once. A form already submitting is left alone.
    ///
    /// Every outcome returns the form to idle with its submit control
    /// re-enabled; failures go to the error modal and keep the retry record.
    pub async fn submit(&self, id: FormId, form: &SharedForm) -> SubmitOutcome {
        match self.begin(id, form) {
            Ok(record) => self.complete(record).await,
            Err(reason) => SubmitOutcome::Skipped(reason),
        }
    }

    /// Enter `submitting`: mark the form busy, snapshot its payload and
    /// record it for retry. Nothing is sent yet.
    pub fn begin(&self, id: FormId, form: &SharedForm) -> Result<SubmissionRecord, SkipReason> {
        let record = {
            let mut guard = lock_form(form);
            if guard.submitting {
                debug!(event = "submission_skipped", form = %id, reason = "already_submitting");
                return Err(SkipReason::AlreadySubmitting);
            }
            guard.submitting = true;
            guard.set_loading(true);
            SubmissionRecord::capture(
                id,
                Arc::clone(form),
                FormPayload::from_form(&guard),
                self.destination.clone(),
            )
        };
        self.store.record(record.clone());
        info!(
            event = "submission_started",
            form = %id,
            submission = %record.id,
            fields = record.payload.len()
        );
        Ok(record)
    }

    /// Send a record produced by [`SubmissionPipeline::begin`] and settle the form.
    pub async fn complete(&self, record: SubmissionRecord) -> SubmitOutcome {
        let id = record.form_id;
        let result = self.send(&record).await;

        {
            let mut guard = lock_form(&record.form);
            guard.submitting = false;
            guard.set_loading(false);
        }

        match result {
            Ok(()) => {
                self.run_after_submit(id);
                self.bridge.notify_success();
                settle_success(&mut lock_form(&record.form));
                self.store.clear_if(record.id);
                info!(event = "submission_succeeded", form = %id, submission = %record.id);
                SubmitOutcome::Success
            }
            Err(failure) => {
                warn!(
                    event = "submission_failed",
                    form = %id,
                    submission = %record.id,
                    error = %failure
                );
                self.bridge.notify_error();
                SubmitOutcome::Failed(failure)
            }
        }
    }

    /// Replay the stored submission. Silent no-op when the store is empty.
    ///
    /// A failed replay is only logged; the record stays for further retries.
    pub async fn retry(&self) -> SubmitOutcome {
        let Some(record) = self.store.snapshot() else {
            debug!(event = "retry_skipped", reason = "empty_store");
            return SubmitOutcome::Skipped(SkipReason::NothingToRetry);
        };

        lock_form(&record.form).set_loading(true);
        info!(event = "retry_started", form = %record.form_id, submission = %record.id);

        let result = self.send(&record).await;

        lock_form(&record.form).set_loading(false);

        match result {
            Ok(()) => {
                self.bridge.replay_succeeded();
                settle_success(&mut lock_form(&record.form));
                self.store.clear_if(record.id);
                info!(event = "retry_succeeded", form = %record.form_id, submission = %record.id);
                SubmitOutcome::Success
            }
            Err(failure) => {
                warn!(
                    event = "retry_failed",
                    form = %record.form_id,
                    submission = %record.id,
                    error = %failure
                );
                SubmitOutcome::Failed(failure)
            }
        }
    }

    /// The request runs on its own task; a timeout stops waiting for it but
    /// leaves the request itself running.
    async fn send(&self, record: &SubmissionRecord) -> Result<(), Failure> {
        let transport = Arc::clone(&self.transport);
        let destination = record.destination.clone();
        let payload = record.payload.clone();
        let request =
            tokio::spawn(async move { transport.post(&destination, &payload).await });
        match tokio::time::timeout(self.timeout, request).await {
            Err(_) => Err(Failure::Timeout(self.timeout)),
            Ok(Err(join)) => Err(Failure::Transport(join.to_string())),
            Ok(Ok(Err(err))) => Err(Failure::Transport(err.to_string())),
            Ok(Ok(Ok(response))) if response.is_success() => Ok(()),
            Ok(Ok(Ok(response))) => {
                warn!(
                    event = "unexpected_status",
                    status = response.status,
                    body = %response.body
                );
                Err(Failure::Status(response.status))
            }
        }
    }

    fn run_after_submit(&self, id: FormId) {
        if let Some(hook) = &self.after_submit
            && let Err(err) = hook(id)
        {
            debug!(event = "after_submit_failed", form = %id, error = %err);
        }
    }
}

impl fmt::Debug for SubmissionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionPipeline")
            .field("destination", &self.destination)
            .field("timeout", &self.timeout)
            .field("bridge", &self.bridge)
            .finish()
    }
}

fn settle_success(form: &mut Form) {
    form.clear_filled();
    form.reset();
}
