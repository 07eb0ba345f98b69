//! An adapter that replays a fixed script of page states.
//!
//! Each [`Step`] describes what the page shows at one position: the record
//! (or failure) extraction yields, what `advance()` does, and the optional
//! signals the driver consults. Moving past the last step behaves like an
//! empty page with no way forward.

use crate::{AdapterError, AnswerOutcome, ExtractionRecord, PageAdapter};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

#[derive(Debug, Clone)]
enum Extraction {
    Record(ExtractionRecord),
    Missing,
    Fail(String),
}

#[derive(Debug, Clone)]
enum Advance {
    Next,
    Stay,
    End,
    Fail(String),
}

#[derive(Debug, Clone)]
pub struct Step {
    extraction: Extraction,
    advance: Advance,
    complete: bool,
    identity: Option<String>,
    outcome: AnswerOutcome,
    reveal: bool,
}

impl Step {
    fn with(extraction: Extraction) -> Self {
        Step {
            extraction,
            advance: Advance::Next,
            complete: false,
            identity: None,
            outcome: AnswerOutcome::Unknown,
            reveal: false,
        }
    }

    pub fn record<R: Into<ExtractionRecord>>(record: R) -> Self {
        Self::with(Extraction::Record(record.into()))
    }

    /// A page where the expected structure is absent.
    pub fn missing() -> Self {
        Self::with(Extraction::Missing)
    }

    pub fn failing<M: Into<String>>(message: M) -> Self {
        Self::with(Extraction::Fail(message.into()))
    }

    /// `advance()` reports that there is no next item.
    pub fn last(mut self) -> Self {
        self.advance = Advance::End;
        self
    }

    /// `advance()` claims success but the page does not change.
    pub fn stuck(mut self) -> Self {
        self.advance = Advance::Stay;
        self
    }

    pub fn advance_error<M: Into<String>>(mut self, message: M) -> Self {
        self.advance = Advance::Fail(message.into());
        self
    }

    /// `is_complete()` reports this as the final item.
    pub fn complete(mut self) -> Self {
        self.complete = true;
        self
    }

    pub fn identity<I: Into<String>>(mut self, identity: I) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn outcome(mut self, outcome: AnswerOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// The page has a "show answer" control.
    pub fn reveals(mut self) -> Self {
        self.reveal = true;
        self
    }
}

/// Counts of adapter calls, shared with the caller.
#[derive(Debug, Default)]
pub struct CallLog {
    extract: AtomicUsize,
    advance: AtomicUsize,
    complete: AtomicUsize,
    reveal: AtomicUsize,
}

impl CallLog {
    pub fn extracts(&self) -> usize {
        self.extract.load(Ordering::SeqCst)
    }

    pub fn advances(&self) -> usize {
        self.advance.load(Ordering::SeqCst)
    }

    pub fn completion_checks(&self) -> usize {
        self.complete.load(Ordering::SeqCst)
    }

    pub fn reveals(&self) -> usize {
        self.reveal.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ScriptedAdapter {
    name: String,
    steps: Vec<Step>,
    cursor: usize,
    calls: Arc<CallLog>,
}

impl ScriptedAdapter {
    pub fn new(steps: Vec<Step>) -> Self {
        ScriptedAdapter {
            name: "scripted".to_string(),
            steps,
            cursor: 0,
            calls: Arc::default(),
        }
    }

    pub fn named<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    pub fn calls(&self) -> Arc<CallLog> {
        Arc::clone(&self.calls)
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    fn current(&self) -> Option<&Step> {
        self.steps.get(self.cursor)
    }
}

#[async_trait::async_trait]
impl PageAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    async fn extract_current(&mut self) -> Result<Option<ExtractionRecord>, AdapterError> {
        self.calls.extract.fetch_add(1, Ordering::SeqCst);
        match self.current().map(|s| &s.extraction) {
            Some(Extraction::Record(record)) => Ok(Some(record.clone())),
            Some(Extraction::Fail(message)) => Err(AdapterError::Other(message.clone())),
            Some(Extraction::Missing) | None => Ok(None),
        }
    }

    async fn advance(&mut self) -> Result<bool, AdapterError> {
        self.calls.advance.fetch_add(1, Ordering::SeqCst);
        match self.current().map(|s| s.advance.clone()) {
            Some(Advance::Next) => {
                self.cursor += 1;
                Ok(true)
            }
            Some(Advance::Stay) => Ok(true),
            Some(Advance::Fail(message)) => Err(AdapterError::Navigation(message)),
            Some(Advance::End) | None => Ok(false),
        }
    }

    async fn is_complete(&self) -> Result<bool, AdapterError> {
        self.calls.complete.fetch_add(1, Ordering::SeqCst);
        Ok(self.current().map_or(false, |s| s.complete))
    }

    async fn reveal_answer(&mut self) -> Result<bool, AdapterError> {
        let reveal = self.current().map_or(false, |s| s.reveal);
        if reveal {
            self.calls.reveal.fetch_add(1, Ordering::SeqCst);
        }
        Ok(reveal)
    }

    async fn item_identity(&self) -> Option<String> {
        self.current().and_then(|s| s.identity.clone())
    }

    async fn answer_outcome(&self) -> AnswerOutcome {
        self.current().map(|s| s.outcome).unwrap_or_default()
    }
}
