//! Routes submission outcomes to the feedback modals.

use tracing::warn;

use crate::config::ModalIds;
use crate::modal::{SharedModals, lock_modals};

/// Adapter between the submission pipeline and the modal manager.
///
/// Modal failures are logged and swallowed here; they never reach the
/// submission flow.
#[derive(Clone)]
pub struct ModalBridge {
    modals: SharedModals,
    ids: ModalIds,
}

impl ModalBridge {
    pub fn new(modals: SharedModals, ids: ModalIds) -> Self {
        Self { modals, ids }
    }

    pub fn modals(&self) -> &SharedModals {
        &self.modals
    }

    pub fn ids(&self) -> &ModalIds {
        &self.ids
    }

    pub fn notify_success(&self) {
        self.show(&self.ids.success);
    }

    pub fn notify_error(&self) {
        self.show(&self.ids.error);
    }

    /// A replay went through: swap the error modal for the success one.
    pub fn replay_succeeded(&self) {
        {
            let mut modals = lock_modals(&self.modals);
            if let Err(err) = modals.close(&self.ids.error) {
                warn!(event = "modal_close_failed", modal = %self.ids.error, error = %err);
            }
        }
        self.show(&self.ids.success);
    }

    /// "OK" button: close `modal`, or the active one when none is given.
    pub fn acknowledge(&self, modal: Option<&str>) {
        let mut modals = lock_modals(&self.modals);
        let target = match modal {
            Some(id) => Some(id.to_string()),
            None => modals.active_modal(),
        };
        if let Some(id) = target
            && let Err(err) = modals.close(&id)
        {
            warn!(event = "modal_close_failed", modal = %id, error = %err);
        }
    }

    fn show(&self, target: &str) {
        let mut modals = lock_modals(&self.modals);
        if let Some(active) = modals.active_modal()
            && active != self.ids.success
            && active != self.ids.error
            && let Err(err) = modals.close(&active)
        {
            warn!(event = "modal_close_failed", modal = %active, error = %err);
        }
        if let Err(err) = modals.open(target) {
            warn!(event = "modal_open_failed", modal = %target, error = %err);
        }
    }
}

impl std::fmt::Debug for ModalBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalBridge").field("ids", &self.ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::ModalError;
    use crate::modal::{ModalManager, ModalRegistry};

    /// Records calls; fails every operation on `broken`.
    #[derive(Default)]
    struct ScriptedModals {
        calls: Vec<String>,
        active: Option<String>,
        broken: Option<String>,
    }

    impl ModalManager for ScriptedModals {
        fn open(&mut self, id: &str) -> Result<(), ModalError> {
            self.calls.push(format!("open:{id}"));
            if self.broken.as_deref() == Some(id) {
                return Err(ModalError::UnknownModal(id.to_string()));
            }
            self.active = Some(id.to_string());
            Ok(())
        }

        fn close(&mut self, id: &str) -> Result<(), ModalError> {
            self.calls.push(format!("close:{id}"));
            if self.broken.as_deref() == Some(id) {
                return Err(ModalError::Other("close failed".to_string()));
            }
            if self.active.as_deref() == Some(id) {
                self.active = None;
            }
            Ok(())
        }

        fn active_modal(&self) -> Option<String> {
            self.active.clone()
        }
    }

    #[test]
    fn closes_context_modal_before_opening_feedback() {
        let scripted = Arc::new(Mutex::new(ScriptedModals {
            active: Some("modal-callback".to_string()),
            ..ScriptedModals::default()
        }));
        let bridge = ModalBridge::new(scripted.clone(), ModalIds::default());
        bridge.notify_success();
        let calls = scripted.lock().expect("modals").calls.clone();
        assert_eq!(calls, vec!["close:modal-callback", "open:modal-success"]);
    }

    #[test]
    fn feedback_modals_are_not_closed_first() {
        let scripted = Arc::new(Mutex::new(ScriptedModals {
            active: Some("modal-error".to_string()),
            ..ScriptedModals::default()
        }));
        let bridge = ModalBridge::new(scripted.clone(), ModalIds::default());
        bridge.notify_error();
        let calls = scripted.lock().expect("modals").calls.clone();
        assert_eq!(calls, vec!["open:modal-error"]);
    }

    #[test]
    fn modal_failures_are_swallowed() {
        let scripted = Arc::new(Mutex::new(ScriptedModals {
            broken: Some("modal-error".to_string()),
            ..ScriptedModals::default()
        }));
        let bridge = ModalBridge::new(scripted.clone(), ModalIds::default());
        bridge.notify_error();
        bridge.replay_succeeded();
        let modals = scripted.lock().expect("modals");
        assert_eq!(modals.active.as_deref(), Some("modal-success"));
    }

    #[test]
    fn acknowledge_closes_active_modal() {
        let registry = ModalRegistry::with_ids(["modal-success", "modal-error"]).shared();
        let bridge = ModalBridge::new(registry.clone(), ModalIds::default());
        bridge.notify_success();
        bridge.acknowledge(None);
        assert_eq!(lock_modals(&registry).active_modal(), None);
    }
}
