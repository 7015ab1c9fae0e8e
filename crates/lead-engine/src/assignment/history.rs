use std::sync::Mutex;

use super::domain::{AssignmentHistoryEntry, LeadId};

/// Append-only audit trail of past decisions. Entries are never mutated or
/// removed; `query` returns them in insertion order.
#[derive(Debug, Default)]
pub struct AssignmentHistoryLog {
    entries: Mutex<Vec<AssignmentHistoryEntry>>,
}

impl AssignmentHistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: AssignmentHistoryEntry) {
        self.entries
            .lock()
            .expect("history lock poisoned")
            .push(entry);
    }

    pub fn query(&self, lead_id: Option<&LeadId>) -> Vec<AssignmentHistoryEntry> {
        let entries = self.entries.lock().expect("history lock poisoned");
        match lead_id {
            Some(lead_id) => entries
                .iter()
                .filter(|entry| &entry.lead_id == lead_id)
                .cloned()
                .collect(),
            None => entries.clone(),
        }
    }
}
