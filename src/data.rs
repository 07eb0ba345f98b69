use crate::utils;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// One extracted question, as produced by a page adapter.
///
/// The driver never looks inside `fields`. `merge_key` and `item_count` are
/// set by adapters that emit composite question sets and are not serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRecord {
    #[serde(flatten)]
    fields: Map<String, Value>,
    #[serde(skip)]
    merge_key: Option<String>,
    #[serde(skip)]
    item_count: usize,
}

impl ExtractionRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        ExtractionRecord {
            fields,
            merge_key: None,
            item_count: 1,
        }
    }

    /// Builds a record from a JSON value. Non-object values are stored under `value`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self::new(fields),
            other => {
                let mut fields = Map::new();
                fields.insert("value".to_string(), other);
                Self::new(fields)
            }
        }
    }

    pub fn with_merge_key<K: Into<String>>(mut self, key: K) -> Self {
        self.merge_key = Some(key.into());
        self
    }

    pub fn with_item_count(mut self, count: usize) -> Self {
        self.item_count = count;
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn merge_key(&self) -> Option<&str> {
        self.merge_key.as_deref()
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }
}

impl From<Value> for ExtractionRecord {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running,
    Paused,
    Stopped,
    Completed,
    Failed,
}

impl RunStatus {
    /// Label shown on the progress surface.
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Idle => "Ready",
            RunStatus::Running => "Running",
            RunStatus::Paused => "Paused",
            RunStatus::Stopped => "Stopped",
            RunStatus::Completed => "Completed",
            RunStatus::Failed => "Failed",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RunStatus::Running | RunStatus::Paused)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Stopped | RunStatus::Completed | RunStatus::Failed
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether the current item was answered correctly, on review pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `advance()` had nowhere to go, or failed.
    NavigationExhausted,
    /// `is_complete()` reported the last item.
    ProgressComplete,
    /// The current item has the same identity as the previous one.
    DuplicateItem,
    StopRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoData,
    AdapterError,
    Filtered,
}

#[derive(Debug, Clone)]
pub struct ExtractionSession {
    records: Vec<ExtractionRecord>,
    status: RunStatus,
    item_counter: u64,
    skipped: u64,
    started_at: Option<DateTime<FixedOffset>>,
    stop_reason: Option<StopReason>,
}

impl Default for ExtractionSession {
    fn default() -> Self {
        ExtractionSession {
            records: vec![],
            status: RunStatus::Idle,
            item_counter: 0,
            skipped: 0,
            started_at: None,
            stop_reason: None,
        }
    }
}

impl ExtractionSession {
    pub(crate) fn begin() -> Self {
        ExtractionSession {
            status: RunStatus::Running,
            started_at: Some(utils::get_now()),
            ..Default::default()
        }
    }

    pub fn records(&self) -> &[ExtractionRecord] {
        self.records.as_slice()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Number of iterations the run has gone through.
    pub fn item_counter(&self) -> u64 {
        self.item_counter
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn started_at(&self) -> Option<&DateTime<FixedOffset>> {
        self.started_at.as_ref()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Questions held across all records; composite sets count each question.
    pub fn question_count(&self) -> usize {
        self.records.iter().map(ExtractionRecord::item_count).sum()
    }

    pub(crate) fn set_status(&mut self, status: RunStatus) {
        self.status = status;
    }

    pub(crate) fn next_item(&mut self) -> u64 {
        self.item_counter += 1;
        self.item_counter
    }

    pub(crate) fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub(crate) fn finish(&mut self, status: RunStatus, reason: StopReason) {
        self.status = status;
        self.stop_reason = Some(reason);
    }

    /// Appends `record`, or replaces the buffered record with the same merge key.
    /// Returns `false` when nothing was stored because the session is not running.
    pub(crate) fn push(&mut self, record: ExtractionRecord) -> bool {
        if !self.status.is_active() {
            return false;
        }
        let existing = record
            .merge_key()
            .and_then(|key| self.records.iter().position(|r| r.merge_key() == Some(key)));
        match existing {
            Some(i) => self.records[i] = record,
            None => self.records.push(record),
        }
        true
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            status: self.status,
            stop_reason: self.stop_reason,
            records: self.records.len(),
            questions: self.question_count(),
            skipped: self.skipped,
            iterations: self.item_counter,
        }
    }

    pub fn to_export(&self) -> ExportDocument {
        ExportDocument {
            exported_at: utils::rfc3339(&utils::get_now()),
            total_records: self.records.len(),
            questions: self.records.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub status: RunStatus,
    pub stop_reason: Option<StopReason>,
    pub records: usize,
    pub questions: usize,
    pub skipped: u64,
    pub iterations: u64,
}

/// Document written by the bundled sinks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: String,
    pub total_records: usize,
    pub questions: Vec<ExtractionRecord>,
}
