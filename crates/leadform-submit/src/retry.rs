//! Single-slot store of the last submission, for manual replay.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use leadform_core::{FormId, SharedForm};
use reqwest::Url;
use uuid::Uuid;

use crate::payload::FormPayload;

/// Everything needed to replay one submission.
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub form_id: FormId,
    pub form: SharedForm,
    pub payload: FormPayload,
    pub destination: Url,
    pub captured_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub fn capture(form_id: FormId, form: SharedForm, payload: FormPayload, destination: Url) -> Self {
        Self {
            id: Uuid::new_v4(),
            form_id,
            form,
            payload,
            destination,
            captured_at: Utc::now(),
        }
    }
}

/// Last-write-wins slot shared by the pipeline and the retry handler.
///
/// Records are swapped whole; readers always get a complete copy. A retry
/// racing a fresh submission of the same form is not coordinated: whichever
/// record is in the slot when the retry reads it is what gets replayed.
#[derive(Debug, Default)]
pub struct RetryStore {
    slot: Mutex<Option<SubmissionRecord>>,
}

impl RetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<SubmissionRecord>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace whatever is stored with `record`.
    pub fn record(&self, record: SubmissionRecord) {
        *self.slot() = Some(record);
    }

    pub fn snapshot(&self) -> Option<SubmissionRecord> {
        self.slot().clone()
    }

    /// Empty the slot if it still holds record `id`.
    pub fn clear_if(&self, id: Uuid) -> bool {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|record| record.id == id) {
            *slot = None;
            true
        } else {
            false
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slot().is_none()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use leadform_core::Form;

    use super::*;

    fn record(value: &str) -> SubmissionRecord {
        let payload = [("name".to_string(), value.to_string())]
            .into_iter()
            .collect();
        SubmissionRecord::capture(
            FormId(1),
            Arc::new(Mutex::new(Form::default())),
            payload,
            Url::parse("http://localhost/mail.php").expect("url"),
        )
    }

    #[test]
    fn last_write_wins() {
        let store = RetryStore::new();
        store.record(record("first"));
        store.record(record("second"));
        let snapshot = store.snapshot().expect("record");
        assert_eq!(snapshot.payload.get("name"), Some("second"));
    }

    #[test]
    fn clear_only_removes_matching_record() {
        let store = RetryStore::new();
        let first = record("first");
        let first_id = first.id;
        store.record(first);
        store.record(record("second"));
        assert!(!store.clear_if(first_id));
        assert!(!store.is_empty());

        let current = store.snapshot().map(|r| r.id).expect("record");
        assert!(store.clear_if(current));
        assert!(store.is_empty());
    }
}
