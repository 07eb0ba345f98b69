use crate::{ProgressReporter, RunStatus};
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Reports progress as log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, status: RunStatus, count: usize) {
        info!("Status: {} [{}]", status, count);
    }
}

/// Keeps every report in memory, for hosts that poll instead of render.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<(RunStatus, usize)>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(RunStatus, usize)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<(RunStatus, usize)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, status: RunStatus, count: usize) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((status, count));
    }
}
