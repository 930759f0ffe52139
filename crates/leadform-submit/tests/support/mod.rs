#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use leadform_core::{Control, Document, Form, InputType, Page, classes};
use leadform_submit::{
    FormPayload, FormSite, ModalBridge, ModalIds, ModalRegistry, RetryStore, SharedModals,
    SubmissionPipeline, SubmitError, SubmitResult, Transport, TransportResponse,
};
use reqwest::Url;

pub const DESTINATION: &str = "https://dealer.example/wp-content/themes/autoclick/assets/mail.php";

/// Scripted reply for one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    Error(String),
    Hang,
}

/// Transport returning scripted replies and recording every request.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<(Url, FormPayload)>>,
    completed: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().expect("replies").push_back(reply);
    }

    pub fn requests(&self) -> Vec<(Url, FormPayload)> {
        self.requests.lock().expect("requests").clone()
    }

    /// Requests that ran to the end, whether or not anyone still waited.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(
        &self,
        destination: &Url,
        payload: &FormPayload,
    ) -> SubmitResult<TransportResponse> {
        self.requests
            .lock()
            .expect("requests")
            .push((destination.clone(), payload.clone()));
        let reply = self
            .replies
            .lock()
            .expect("replies")
            .pop_front()
            .unwrap_or(Reply::Status(200));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        match reply {
            Reply::Status(status) => Ok(TransportResponse::new(status, "")),
            Reply::Error(message) => Err(SubmitError::Transport(message)),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(TransportResponse::new(200, ""))
            }
        }
    }
}

pub fn modals() -> SharedModals {
    ModalRegistry::with_ids(["modal-success", "modal-error", "modal-callback"]).shared()
}

pub fn pipeline(
    transport: Arc<ScriptedTransport>,
    modals: SharedModals,
    timeout: Duration,
) -> SubmissionPipeline {
    SubmissionPipeline::new(
        transport,
        Arc::new(RetryStore::new()),
        ModalBridge::new(modals, ModalIds::default()),
        Url::parse(DESTINATION).expect("destination"),
        timeout,
    )
}

pub fn lead_form() -> Form {
    Form::new(["form"])
        .with_control(Control::new(classes::NAME).with_name("name"))
        .with_control(
            Control::new(classes::SELECT)
                .with_name("contact")
                .with_type(InputType::Select),
        )
        .with_control(Control::new(classes::PHONE).with_name("phone"))
        .with_control(
            Control::new(classes::EMAIL)
                .with_name("email")
                .with_type(InputType::Email),
        )
        .with_contact_group()
        .with_submit()
}

/// Name plus email, no selector and no phone.
pub fn email_only_form() -> Form {
    Form::new(["form"])
        .with_control(Control::new(classes::NAME).with_name("name"))
        .with_control(
            Control::new(classes::EMAIL)
                .with_name("email")
                .with_type(InputType::Email),
        )
        .with_submit()
}

pub fn site(transport: Arc<ScriptedTransport>, modals: SharedModals) -> FormSite {
    site_with(vec![lead_form()], transport, modals)
}

pub fn site_with(
    forms: Vec<Form>,
    transport: Arc<ScriptedTransport>,
    modals: SharedModals,
) -> FormSite {
    let document = Document::from_page(Page { forms });
    let mut site = FormSite::new(
        document,
        pipeline(transport, modals, Duration::from_secs(15)),
    );
    site.init();
    site
}
