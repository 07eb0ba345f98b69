use crate::{
    AnswerOutcome, DriverConfig, DriverError, ExtractionSession, PageAdapter, ProgressReporter,
    ResultSink, RunStatus, SessionSummary, SkipReason, StopReason,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use tokio::sync::Notify;
use tracing::{debug, info, instrument, warn};

/// Run state shared between the driver loop and its handles.
#[derive(Debug, Default)]
struct Control {
    session: Mutex<ExtractionSession>,
    stop_requested: AtomicBool,
    paused: AtomicBool,
    wake: Notify,
}

impl Control {
    fn session(&self) -> MutexGuard<'_, ExtractionSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn status(&self) -> RunStatus {
        self.session().status()
    }

    fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        if !self.status().is_active() {
            debug!("Stop ignored, nothing is running");
            return;
        }
        if !self.stop_requested.swap(true, Ordering::SeqCst) {
            info!("Stop requested");
        }
        self.wake.notify_waiters();
    }

    fn pause(&self) {
        if self.status().is_active() && !self.paused.swap(true, Ordering::SeqCst) {
            info!("Pause requested");
        }
    }

    fn resume(&self) {
        if self.paused.swap(false, Ordering::SeqCst) {
            info!("Resume requested");
            self.wake.notify_waiters();
        }
    }

    /// Clears pending requests. Call with the session lock held so a stop
    /// issued once the new session is visible is never lost.
    fn reset(&self) {
        self.stop_requested.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }
}

/// Controls a driver from another task.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    control: Arc<Control>,
}

impl DriverHandle {
    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn status(&self) -> RunStatus {
        self.control.status()
    }

    pub fn session(&self) -> ExtractionSession {
        self.control.session().clone()
    }
}

/// Walks a question set one item at a time: reveal, extract, check for the
/// end, advance, wait. Results are flushed to the sink once per run.
pub struct ExtractionDriver<A, S, R> {
    adapter: tokio::sync::Mutex<A>,
    sink: S,
    reporter: R,
    config: DriverConfig,
    control: Arc<Control>,
}

impl<A, S, R> ExtractionDriver<A, S, R>
where
    A: PageAdapter,
    S: ResultSink,
    R: ProgressReporter,
{
    pub fn new(adapter: A, sink: S, reporter: R) -> Self {
        Self::with_config(adapter, sink, reporter, DriverConfig::default())
    }

    pub fn with_config(adapter: A, sink: S, reporter: R, config: DriverConfig) -> Self {
        if let Err(e) = config.validate() {
            warn!("{}, clamping to the maximum", e);
        }
        reporter.report(RunStatus::Idle, 0);
        ExtractionDriver {
            adapter: tokio::sync::Mutex::new(adapter),
            sink,
            reporter,
            config,
            control: Arc::default(),
        }
    }

    pub fn handle(&self) -> DriverHandle {
        DriverHandle {
            control: Arc::clone(&self.control),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn status(&self) -> RunStatus {
        self.control.status()
    }

    pub fn session(&self) -> ExtractionSession {
        self.control.session().clone()
    }

    /// Ends the run at the next iteration boundary. No-op when not running.
    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    /// Runs a fresh session until the set is exhausted or a stop is
    /// requested, then flushes it to the sink.
    #[instrument(skip_all)]
    pub async fn start(&self) -> Result<SessionSummary, DriverError> {
        {
            let mut session = self.control.session();
            if session.status().is_active() {
                warn!("Start rejected, extraction is already running");
                return Err(DriverError::AlreadyRunning);
            }
            self.control.reset();
            *session = ExtractionSession::begin();
        }
        self.reporter.report(RunStatus::Running, 0);

        let reason = {
            let mut adapter = self.adapter.lock().await;
            info!("Start extraction with {} adapter", adapter.name());
            self.run(&mut *adapter).await
        };

        self.finish(reason).await
    }

    async fn run(&self, adapter: &mut A) -> StopReason {
        let mut last_identity: Option<String> = None;

        loop {
            if let Some(reason) = self.checkpoint().await {
                return reason;
            }

            let item = self.control.session().next_item();
            debug!("Iteration {}", item);

            match adapter.reveal_answer().await {
                Ok(true) => {
                    debug!("[{}] Answer revealed, settle {:?}", item, self.config.settle_delay());
                    tokio::time::sleep(self.config.settle_delay()).await;
                }
                Ok(false) => {}
                Err(e) => warn!("[{}] Failed to reveal answer: {}", item, e),
            }

            if let Some(reason) = self.extract(adapter, item, &mut last_identity).await {
                return reason;
            }

            if self.control.stop_requested() {
                return StopReason::StopRequested;
            }

            match adapter.is_complete().await {
                Ok(true) => {
                    info!("[{}] Last item reached", item);
                    return StopReason::ProgressComplete;
                }
                Ok(false) => {}
                Err(e) => warn!("[{}] Failed to check progress: {}", item, e),
            }

            match adapter.advance().await {
                Ok(true) => {}
                Ok(false) => {
                    info!("[{}] No next item", item);
                    return StopReason::NavigationExhausted;
                }
                Err(e) => {
                    warn!("[{}] Failed to advance: {}", item, e);
                    return StopReason::NavigationExhausted;
                }
            }

            self.wait_step().await;
        }
    }

    /// One extraction attempt. Returns a stop reason only for the duplicate guard.
    async fn extract(
        &self,
        adapter: &mut A,
        item: u64,
        last_identity: &mut Option<String>,
    ) -> Option<StopReason> {
        if self.config.incorrect_only && adapter.answer_outcome().await == AnswerOutcome::Correct {
            self.skip(item, SkipReason::Filtered);
            return None;
        }

        let record = match adapter.extract_current().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.skip(item, SkipReason::NoData);
                return None;
            }
            Err(e) => {
                warn!("[{}] Extraction failed: {}", item, e);
                self.skip(item, SkipReason::AdapterError);
                return None;
            }
        };

        let identity = adapter.item_identity().await;
        if identity.is_some() && identity == *last_identity {
            info!("[{}] Same item as before, navigation went nowhere", item);
            return Some(StopReason::DuplicateItem);
        }
        *last_identity = identity;

        let count = {
            let mut session = self.control.session();
            session.push(record);
            session.question_count()
        };
        info!("[{}] Extracted, {} questions so far", item, count);
        self.reporter.report(RunStatus::Running, count);
        None
    }

    fn skip(&self, item: u64, reason: SkipReason) {
        self.control.session().record_skip();
        debug!("[{}] Skipped: {:?}", item, reason);
    }

    /// Honors stop and pause requests between iterations.
    async fn checkpoint(&self) -> Option<StopReason> {
        if self.control.stop_requested() {
            return Some(StopReason::StopRequested);
        }
        if !self.control.is_paused() {
            return None;
        }

        let count = {
            let mut session = self.control.session();
            session.set_status(RunStatus::Paused);
            session.question_count()
        };
        info!("Paused at {} questions", count);
        self.reporter.report(RunStatus::Paused, count);

        loop {
            let woken = self.control.wake.notified();
            if self.control.stop_requested() {
                return Some(StopReason::StopRequested);
            }
            if !self.control.is_paused() {
                break;
            }
            woken.await;
        }

        self.control.session().set_status(RunStatus::Running);
        info!("Resumed");
        self.reporter.report(RunStatus::Running, count);
        None
    }

    /// Inter-iteration delay. Only a stop cuts it short; other wakeups
    /// (pause, resume) go back to waiting for the same deadline.
    async fn wait_step(&self) {
        let deadline = tokio::time::Instant::now() + self.config.step_delay();
        loop {
            let woken = self.control.wake.notified();
            if self.control.stop_requested() {
                debug!("Step delay interrupted by stop");
                return;
            }
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return,
                _ = woken => {}
            }
        }
    }

    async fn finish(&self, reason: StopReason) -> Result<SessionSummary, DriverError> {
        let status = match reason {
            StopReason::StopRequested => RunStatus::Stopped,
            _ => RunStatus::Completed,
        };

        let mut snapshot = self.control.session().clone();
        snapshot.finish(status, reason);
        info!(
            "{} with {} records ({:?}), {} skipped",
            status,
            snapshot.records().len(),
            reason,
            snapshot.skipped()
        );

        let flushed = self.sink.flush(&snapshot).await;
        let status = match &flushed {
            Ok(()) => status,
            Err(e) => {
                warn!("Failed to flush {} records: {}", snapshot.records().len(), e);
                RunStatus::Failed
            }
        };
        snapshot.set_status(status);

        let summary = {
            let mut session = self.control.session();
            session.finish(status, reason);
            session.summary()
        };
        self.reporter.report(status, snapshot.question_count());

        flushed.map(|()| summary).map_err(DriverError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingReporter;
    use crate::scripted::{ScriptedAdapter, Step};
    use crate::sink::MemorySink;
    use crate::{ExtractionRecord, SinkError};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::Instant;

    type TestDriver = ExtractionDriver<ScriptedAdapter, MemorySink, RecordingReporter>;

    fn q(id: &str) -> ExtractionRecord {
        json!({"questionLink": id, "content": {"questionText": format!("Question {}", id)}}).into()
    }

    fn driver(steps: Vec<Step>) -> TestDriver {
        ExtractionDriver::new(
            ScriptedAdapter::new(steps),
            MemorySink::new(),
            RecordingReporter::new(),
        )
    }

    fn links(session: &ExtractionSession) -> Vec<String> {
        session
            .records()
            .iter()
            .filter_map(|r| r.get_str("questionLink").map(ToString::to_string))
            .collect()
    }

    /// Lets a spawned run reach its first inter-iteration delay.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_advance_fails() {
        let adapter = ScriptedAdapter::new(vec![
            Step::record(q("A")),
            Step::record(q("B")),
            Step::record(q("C")).last(),
        ]);
        let calls = adapter.calls();
        let d = ExtractionDriver::new(adapter, MemorySink::new(), RecordingReporter::new());

        let summary = d.start().await.expect("Flushed");

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.stop_reason, Some(StopReason::NavigationExhausted));
        assert_eq!(links(&d.session()), vec!["A", "B", "C"]);
        assert_eq!(calls.advances(), 3);
        assert_eq!(calls.extracts(), 3);

        let docs = d.sink().documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].total_records, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_never_exceed_advances() {
        for n in 1..5 {
            let mut steps: Vec<Step> = (0..n).map(|i| Step::record(q(&i.to_string()))).collect();
            steps[0] = Step::missing();
            let last = steps.pop().map(Step::last).expect("Non-empty");
            steps.push(last);

            let adapter = ScriptedAdapter::new(steps);
            let calls = adapter.calls();
            let d = ExtractionDriver::new(adapter, MemorySink::new(), RecordingReporter::new());
            let summary = d.start().await.expect("Flushed");

            assert_eq!(summary.status, RunStatus::Completed);
            assert_eq!(calls.advances(), n);
            assert!(summary.records <= n);
            assert_eq!(summary.records, n - 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_signal_ends_before_advance() {
        let adapter = ScriptedAdapter::new(vec![Step::record(q("A")).complete(), Step::record(q("B"))]);
        let calls = adapter.calls();
        let d = ExtractionDriver::new(adapter, MemorySink::new(), RecordingReporter::new());

        let summary = d.start().await.expect("Flushed");

        assert_eq!(summary.stop_reason, Some(StopReason::ProgressComplete));
        assert_eq!(links(&d.session()), vec!["A"]);
        assert_eq!(calls.completion_checks(), 1);
        assert_eq!(calls.advances(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extraction_failure_is_skipped() {
        let d = driver(vec![
            Step::record(q("A")),
            Step::failing("choices not found"),
            Step::missing(),
            Step::record(q("D")).last(),
        ]);

        let summary = d.start().await.expect("Flushed");

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.iterations, 4);
        assert_eq!(links(&d.session()), vec!["A", "D"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advance_error_is_terminal() {
        let d = driver(vec![
            Step::record(q("A")).advance_error("next button detached"),
            Step::record(q("B")),
        ]);

        let summary = d.start().await.expect("Flushed");

        assert_eq!(summary.stop_reason, Some(StopReason::NavigationExhausted));
        assert_eq!(links(&d.session()), vec!["A"]);
        assert_eq!(d.sink().flush_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_counts_and_terminal_status() {
        let d = driver(vec![Step::record(q("A")), Step::record(q("B")).last()]);
        d.start().await.expect("Flushed");

        assert_eq!(
            d.reporter().events(),
            vec![
                (RunStatus::Idle, 0),
                (RunStatus::Running, 0),
                (RunStatus::Running, 1),
                (RunStatus::Running, 2),
                (RunStatus::Completed, 2),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let d = Arc::new(driver((0..10).map(|i| Step::record(q(&i.to_string()))).collect()));
        let run = tokio::spawn({
            let d = Arc::clone(&d);
            async move { d.start().await }
        });
        settle().await;

        d.stop();
        d.stop();
        let summary = run.await.expect("Joined").expect("Flushed");

        assert_eq!(summary.status, RunStatus::Stopped);
        assert_eq!(summary.stop_reason, Some(StopReason::StopRequested));
        assert_eq!(summary.records, 1);

        d.stop();
        assert_eq!(d.status(), RunStatus::Stopped);
        assert_eq!(d.sink().flush_count(), 1);
        assert_eq!(d.reporter().last(), Some((RunStatus::Stopped, 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_step_delay() {
        let d = Arc::new(driver((0..10).map(|i| Step::record(q(&i.to_string()))).collect()));
        let run = tokio::spawn({
            let d = Arc::clone(&d);
            async move { d.start().await }
        });
        settle().await;

        let requested = Instant::now();
        d.handle().stop();
        run.await.expect("Joined").expect("Flushed");

        assert!(requested.elapsed() < d.config().step_delay());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_rejected_while_running() {
        let d = Arc::new(driver((0..10).map(|i| Step::record(q(&i.to_string()))).collect()));
        let run = tokio::spawn({
            let d = Arc::clone(&d);
            async move { d.start().await }
        });
        settle().await;

        let before = links(&d.session());
        assert!(matches!(d.start().await, Err(DriverError::AlreadyRunning)));
        assert_eq!(d.status(), RunStatus::Running);
        assert_eq!(links(&d.session()), before);

        d.stop();
        run.await.expect("Joined").expect("Flushed");
        assert_eq!(d.sink().flush_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume() {
        let d = Arc::new(driver(vec![
            Step::record(q("A")),
            Step::record(q("B")),
            Step::record(q("C")).last(),
        ]));
        let handle = d.handle();
        let run = tokio::spawn({
            let d = Arc::clone(&d);
            async move { d.start().await }
        });
        settle().await;

        handle.pause();
        tokio::time::sleep(d.config().step_delay() * 3).await;
        assert_eq!(handle.status(), RunStatus::Paused);
        assert_eq!(handle.session().records().len(), 1);
        assert!(matches!(d.start().await, Err(DriverError::AlreadyRunning)));

        handle.resume();
        let summary = run.await.expect("Joined").expect("Flushed");

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(links(&d.session()), vec!["A", "B", "C"]);
        assert!(d.reporter().events().contains(&(RunStatus::Paused, 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_keeps_step_delay() {
        let adapter = ScriptedAdapter::new(vec![
            Step::record(q("A")),
            Step::record(q("B")),
            Step::record(q("C")).last(),
        ]);
        let calls = adapter.calls();
        let d = Arc::new(ExtractionDriver::new(adapter, MemorySink::new(), RecordingReporter::new()));
        let started = Instant::now();
        let run = tokio::spawn({
            let d = Arc::clone(&d);
            async move { d.start().await }
        });

        settle().await;
        d.pause();
        settle().await;
        d.resume();
        settle().await;
        assert_eq!(calls.extracts(), 1);

        tokio::time::sleep_until(started + d.config().step_delay() - Duration::from_millis(1)).await;
        assert_eq!(calls.extracts(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(calls.extracts(), 2);

        let summary = run.await.expect("Joined").expect("Flushed");
        assert_eq!(summary.records, 3);
    }

    /// Stops itself while the first item is being read.
    struct SelfStoppingAdapter {
        inner: ScriptedAdapter,
        handle: Arc<Mutex<Option<DriverHandle>>>,
    }

    #[async_trait::async_trait]
    impl PageAdapter for SelfStoppingAdapter {
        fn name(&self) -> &str {
            self.inner.name()
        }

        async fn extract_current(&mut self) -> Result<Option<ExtractionRecord>, crate::AdapterError> {
            let handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner).clone();
            if let Some(handle) = handle {
                handle.stop();
            }
            self.inner.extract_current().await
        }

        async fn advance(&mut self) -> Result<bool, crate::AdapterError> {
            self.inner.advance().await
        }

        async fn is_complete(&self) -> Result<bool, crate::AdapterError> {
            self.inner.is_complete().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_extraction_keeps_record() {
        let inner = ScriptedAdapter::new(vec![Step::record(q("A")), Step::record(q("B")).last()]);
        let calls = inner.calls();
        let slot = Arc::new(Mutex::new(None));
        let adapter = SelfStoppingAdapter {
            inner,
            handle: Arc::clone(&slot),
        };
        let d = ExtractionDriver::new(adapter, MemorySink::new(), RecordingReporter::new());
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(d.handle());

        let summary = d.start().await.expect("Flushed");

        assert_eq!(summary.status, RunStatus::Stopped);
        assert_eq!(summary.stop_reason, Some(StopReason::StopRequested));
        assert_eq!(links(&d.session()), vec!["A"]);
        assert_eq!(calls.completion_checks(), 0);
        assert_eq!(calls.advances(), 0);
        assert_eq!(d.sink().flush_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_releases_paused_run() {
        let d = Arc::new(driver((0..5).map(|i| Step::record(q(&i.to_string()))).collect()));
        let run = tokio::spawn({
            let d = Arc::clone(&d);
            async move { d.start().await }
        });
        settle().await;

        d.pause();
        tokio::time::sleep(d.config().step_delay() * 2).await;
        d.stop();
        let summary = run.await.expect("Joined").expect("Flushed");

        assert_eq!(summary.status, RunStatus::Stopped);
        assert_eq!(d.sink().flush_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_identity_ends_run() {
        let adapter = ScriptedAdapter::new(vec![
            Step::record(q("A")).identity("/q/1"),
            Step::record(q("B")).identity("/q/2").stuck(),
        ]);
        let calls = adapter.calls();
        let d = ExtractionDriver::new(adapter, MemorySink::new(), RecordingReporter::new());

        let summary = d.start().await.expect("Flushed");

        assert_eq!(summary.stop_reason, Some(StopReason::DuplicateItem));
        assert_eq!(links(&d.session()), vec!["A", "B"]);
        assert_eq!(calls.extracts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_incorrect_only_skips_correct_items() {
        let adapter = ScriptedAdapter::new(vec![
            Step::record(q("A")).outcome(AnswerOutcome::Correct),
            Step::record(q("B")).outcome(AnswerOutcome::Incorrect),
            Step::record(q("C")).last(),
        ]);
        let calls = adapter.calls();
        let d = ExtractionDriver::with_config(
            adapter,
            MemorySink::new(),
            RecordingReporter::new(),
            DriverConfig::new().incorrect_only(),
        );

        let summary = d.start().await.expect("Flushed");

        assert_eq!(links(&d.session()), vec!["B", "C"]);
        assert_eq!(summary.skipped, 1);
        assert_eq!(calls.extracts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_waits_settle_delay() {
        let adapter = ScriptedAdapter::new(vec![Step::record(q("A")).reveals().last()]);
        let calls = adapter.calls();
        let config = DriverConfig::new().with_settle_delay(Duration::from_millis(800));
        let d = ExtractionDriver::with_config(adapter, MemorySink::new(), RecordingReporter::new(), config);

        let started = Instant::now();
        d.start().await.expect("Flushed");

        assert_eq!(calls.reveals(), 1);
        assert!(started.elapsed() >= Duration::from_millis(800));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_never_exceeds_bound() {
        let adapter = ScriptedAdapter::new(vec![Step::record(q("A")).reveals().last()]);
        let config = DriverConfig {
            settle_delay_ms: 5_000,
            ..DriverConfig::default()
        };
        let d = ExtractionDriver::with_config(adapter, MemorySink::new(), RecordingReporter::new(), config);

        let started = Instant::now();
        d.start().await.expect("Flushed");

        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(started.elapsed() < Duration::from_millis(1_100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_merge_key_counts_questions() {
        let set = |n: usize| {
            ExtractionRecord::from(json!({"questionLink": "msr", "questions": n}))
                .with_merge_key("tabs:email,table")
                .with_item_count(n)
        };
        let d = driver(vec![
            Step::record(set(1)),
            Step::record(set(2)),
            Step::record(set(3)).last(),
        ]);

        let summary = d.start().await.expect("Flushed");

        assert_eq!(summary.records, 1);
        assert_eq!(summary.questions, 3);
        assert_eq!(d.reporter().last(), Some((RunStatus::Completed, 3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_session() {
        let d = driver(vec![Step::record(q("A")).last()]);
        d.start().await.expect("Flushed");
        let summary = d.start().await.expect("Flushed");

        assert_eq!(summary.records, 1);
        assert_eq!(summary.iterations, 1);
        assert_eq!(d.sink().flush_count(), 2);
    }

    struct RejectingSink;

    #[async_trait::async_trait]
    impl ResultSink for RejectingSink {
        async fn flush(&self, _session: &ExtractionSession) -> Result<(), SinkError> {
            Err(SinkError::Status {
                status: 503,
                message: "Logging API unavailable".to_string(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_failure_is_reported() {
        let d = ExtractionDriver::new(
            ScriptedAdapter::new(vec![Step::record(q("A")).last()]),
            RejectingSink,
            RecordingReporter::new(),
        );

        let res = d.start().await;

        assert!(matches!(
            res,
            Err(DriverError::SinkFlush(SinkError::Status { status: 503, .. }))
        ));
        assert_eq!(d.status(), RunStatus::Failed);
        assert_eq!(d.session().records().len(), 1);
        assert_eq!(d.reporter().last(), Some((RunStatus::Failed, 1)));
    }
}
