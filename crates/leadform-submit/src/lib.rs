//! Submission side of leadform: payloads, transport, retry, modals, and the
//! page runtime tying them to the core validators.

pub mod bridge;
pub mod config;
pub mod error;
pub mod modal;
pub mod payload;
pub mod pipeline;
pub mod retry;
pub mod site;
pub mod transport;

pub use bridge::ModalBridge;
pub use config::{
    DEFAULT_ENDPOINT_PATH, DEFAULT_TIMEOUT_MS, ERROR_MODAL, ModalIds, SUCCESS_MODAL, SubmitConfig,
};
pub use error::{ModalError, SubmitError, SubmitResult};
pub use modal::{
    FOCUS_DELAY, ModalManager, ModalRegistry, ModalSpec, PendingFocus, SharedModals, lock_modals,
};
pub use payload::FormPayload;
pub use pipeline::{AfterSubmitHook, Failure, SkipReason, SubmissionPipeline, SubmitOutcome};
pub use retry::{RetryStore, SubmissionRecord};
pub use site::{Dispatch, FormRegistration, FormSite, SiteEvent};
pub use transport::{HttpTransport, Transport, TransportResponse};
