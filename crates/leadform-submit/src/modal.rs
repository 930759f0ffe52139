//! Modal dialog collaborator and an in-memory manager implementing it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ModalError;

/// Delay before the first input of an opened modal receives focus.
pub const FOCUS_DELAY: Duration = Duration::from_millis(100);

/// Contract the submission flow needs from the modal manager.
///
/// Opening a modal while another is active closes the other first.
pub trait ModalManager: Send {
    fn open(&mut self, id: &str) -> Result<(), ModalError>;
    fn close(&mut self, id: &str) -> Result<(), ModalError>;
    fn active_modal(&self) -> Option<String>;
}

pub type SharedModals = Arc<Mutex<dyn ModalManager>>;

pub fn lock_modals(modals: &SharedModals) -> MutexGuard<'_, dyn ModalManager + 'static> {
    modals.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Declared modal on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalSpec {
    pub id: String,
    /// First focusable input inside the modal, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_input: Option<String>,
}

impl ModalSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            first_input: None,
        }
    }
}

/// Focus scheduled after a modal opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFocus {
    pub modal: String,
    pub input: String,
    pub delay: Duration,
}

#[derive(Debug, Clone)]
struct ModalEntry {
    first_input: Option<String>,
    open: bool,
}

/// Keeps at most one modal active and locks body scroll while it is.
#[derive(Debug, Default)]
pub struct ModalRegistry {
    modals: BTreeMap<String, ModalEntry>,
    active: Option<String>,
    scroll_locked: bool,
    pending_focus: Option<PendingFocus>,
}

impl ModalRegistry {
    pub fn new(specs: impl IntoIterator<Item = ModalSpec>) -> Self {
        let modals = specs
            .into_iter()
            .map(|spec| {
                (
                    spec.id,
                    ModalEntry {
                        first_input: spec.first_input,
                        open: false,
                    },
                )
            })
            .collect();
        Self {
            modals,
            ..Self::default()
        }
    }

    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ids.into_iter().map(ModalSpec::new))
    }

    pub fn shared(self) -> SharedModals {
        Arc::new(Mutex::new(self))
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.modals.get(id).is_some_and(|entry| entry.open)
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn pending_focus(&self) -> Option<&PendingFocus> {
        self.pending_focus.as_ref()
    }

    /// Escape key: close the active modal.
    pub fn handle_escape(&mut self) {
        if let Some(active) = self.active.clone() {
            self.close_known(&active);
        }
    }

    fn close_known(&mut self, id: &str) {
        let Some(entry) = self.modals.get_mut(id) else {
            return;
        };
        entry.open = false;
        if self.active.as_deref() == Some(id) {
            self.active = None;
            self.scroll_locked = false;
            self.pending_focus = None;
        }
        info!(event = "modal_closed", modal = id);
    }
}

impl ModalManager for ModalRegistry {
    fn open(&mut self, id: &str) -> Result<(), ModalError> {
        if !self.modals.contains_key(id) {
            warn!(event = "modal_missing", modal = id);
            return Err(ModalError::UnknownModal(id.to_string()));
        }

        if let Some(previous) = self.active.clone() {
            self.close_known(&previous);
        }

        let Some(entry) = self.modals.get_mut(id) else {
            return Err(ModalError::UnknownModal(id.to_string()));
        };
        entry.open = true;
        self.pending_focus = entry.first_input.clone().map(|input| PendingFocus {
            modal: id.to_string(),
            input,
            delay: FOCUS_DELAY,
        });
        self.active = Some(id.to_string());
        self.scroll_locked = true;
        info!(event = "modal_opened", modal = id);
        Ok(())
    }

    fn close(&mut self, id: &str) -> Result<(), ModalError> {
        self.close_known(id);
        Ok(())
    }

    fn active_modal(&self) -> Option<String> {
        self.active.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModalRegistry {
        ModalRegistry::new([
            ModalSpec {
                id: "modal-callback".to_string(),
                first_input: Some("input-name".to_string()),
            },
            ModalSpec::new("modal-success"),
        ])
    }

    #[test]
    fn opening_replaces_the_active_modal() {
        let mut modals = registry();
        modals.open("modal-callback").expect("open");
        assert!(modals.scroll_locked());
        assert_eq!(
            modals.pending_focus().map(|f| f.input.as_str()),
            Some("input-name")
        );

        modals.open("modal-success").expect("open");
        assert!(!modals.is_open("modal-callback"));
        assert_eq!(modals.active_modal().as_deref(), Some("modal-success"));
        assert!(modals.scroll_locked());
    }

    #[test]
    fn closing_inactive_modal_keeps_scroll_lock() {
        let mut modals = registry();
        modals.open("modal-success").expect("open");
        modals.close("modal-callback").expect("close");
        assert!(modals.scroll_locked());
        modals.handle_escape();
        assert!(!modals.scroll_locked());
        assert_eq!(modals.active_modal(), None);
    }

    #[test]
    fn unknown_modal_is_an_error() {
        let mut modals = registry();
        assert_eq!(
            modals.open("modal-missing"),
            Err(ModalError::UnknownModal("modal-missing".to_string()))
        );
        assert!(modals.close("modal-missing").is_ok());
    }
}
