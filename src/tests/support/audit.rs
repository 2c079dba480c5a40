// Audit sink that keeps notes in memory for assertions.

use std::sync::Mutex;

use crate::audit::AuditSink;

#[derive(Default)]
pub struct MemoryAudit {
    notes: Mutex<Vec<String>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> Vec<String> {
        self.notes.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AuditSink for MemoryAudit {
    async fn note(&self, note: &str) {
        self.notes.lock().unwrap().push(note.to_string());
    }
}
