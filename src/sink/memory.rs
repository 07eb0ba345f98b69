use crate::{ExportDocument, ExtractionSession, ResultSink, SinkError};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Keeps flushed documents in memory, one per flush.
#[derive(Debug, Default)]
pub struct MemorySink {
    documents: Mutex<Vec<ExportDocument>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> Vec<ExportDocument> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn flush_count(&self) -> usize {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait::async_trait]
impl ResultSink for MemorySink {
    async fn flush(&self, session: &ExtractionSession) -> Result<(), SinkError> {
        let doc = session.to_export();
        debug!("Keep {} records in memory", doc.total_records);
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(doc);
        Ok(())
    }
}
