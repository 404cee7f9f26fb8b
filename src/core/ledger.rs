//! Repeat-submission ledger
//!
//! The engine itself does not persist anything; when a form disallows
//! repeat submissions it consults a ledger supplied by the caller. The
//! trait is the seam; `MemoryLedger` is the in-process implementation
//! used by the CLI and by tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::core::submission::SubmissionId;

/// One accepted submission, as remembered by a ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Unique record id
    pub id: SubmissionId,

    /// Form name
    pub form: String,

    /// Identity that submitted
    pub identity: String,

    /// When the submission was accepted
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub fn new(form: &str, identity: &str) -> Self {
        Self {
            id: SubmissionId::new(),
            form: form.to_string(),
            identity: identity.to_string(),
            submitted_at: Utc::now(),
        }
    }
}

/// The idempotency collaborator consulted when `allow_repeat` is false
pub trait SubmissionLedger: Send + Sync {
    /// Whether this identity already has an accepted submission for the form
    fn has_submitted(&self, form: &str, identity: &str) -> bool;

    /// Remember an accepted submission
    fn record(&self, record: SubmissionRecord);
}

/// In-memory ledger
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: RwLock<Vec<SubmissionRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded submissions
    pub fn len(&self) -> usize {
        self.records.read().expect("ledger lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all records
    pub fn records(&self) -> Vec<SubmissionRecord> {
        self.records.read().expect("ledger lock poisoned").clone()
    }
}

impl SubmissionLedger for MemoryLedger {
    fn has_submitted(&self, form: &str, identity: &str) -> bool {
        self.records
            .read()
            .expect("ledger lock poisoned")
            .iter()
            .any(|r| r.form == form && r.identity == identity)
    }

    fn record(&self, record: SubmissionRecord) {
        self.records
            .write()
            .expect("ledger lock poisoned")
            .push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ledger_has_no_submissions() {
        let ledger = MemoryLedger::new();
        assert!(ledger.is_empty());
        assert!(!ledger.has_submitted("sample-form", "alice"));
    }

    #[test]
    fn test_record_and_lookup() {
        let ledger = MemoryLedger::new();
        ledger.record(SubmissionRecord::new("sample-form", "alice"));

        assert_eq!(ledger.len(), 1);
        assert!(ledger.has_submitted("sample-form", "alice"));
        assert!(!ledger.has_submitted("sample-form", "bob"));
        assert!(!ledger.has_submitted("other-form", "alice"));
    }

    #[test]
    fn test_record_serializes() {
        let record = SubmissionRecord::new("sample-form", "alice");
        let yaml = serde_yml::to_string(&record).unwrap();
        assert!(yaml.contains("sample-form"));
        let parsed: SubmissionRecord = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.id, record.id);
    }
}
