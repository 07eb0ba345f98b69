pub mod progress;
pub mod scripted;
pub mod sink;
pub mod snapshot;
pub mod telemetry;

mod config;
mod data;
mod driver;
mod error;
mod utils;

pub use config::DriverConfig;
pub use data::{
    AnswerOutcome, ExportDocument, ExtractionRecord, ExtractionSession, RunStatus,
    SessionSummary, SkipReason, StopReason,
};
pub use driver::{DriverHandle, ExtractionDriver};
pub use error::{AdapterError, ConfigError, DriverError, SinkError};

/// Reads questions off one page layout and navigates between them.
///
/// Implementations own whatever page state they need. The driver only calls
/// these methods in order, one extraction per advance.
#[async_trait::async_trait]
pub trait PageAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Reads the current item. `Ok(None)` when the expected structure is not
    /// there. Must leave navigation state untouched.
    async fn extract_current(&mut self) -> Result<Option<ExtractionRecord>, AdapterError>;

    /// Moves to the next item. `Ok(false)` when there is none.
    async fn advance(&mut self) -> Result<bool, AdapterError>;

    /// `true` when the adapter can tell the current item is the last one.
    async fn is_complete(&self) -> Result<bool, AdapterError>;

    /// Toggles a "show answer" control. `Ok(true)` when something was clicked
    /// and the page needs time to settle.
    async fn reveal_answer(&mut self) -> Result<bool, AdapterError> {
        Ok(false)
    }

    /// Stable identity of the current item, used to detect a no-op advance.
    async fn item_identity(&self) -> Option<String> {
        None
    }

    async fn answer_outcome(&self) -> AnswerOutcome {
        AnswerOutcome::Unknown
    }
}

/// Destination for a finished session.
#[async_trait::async_trait]
pub trait ResultSink: Send + Sync {
    async fn flush(&self, session: &ExtractionSession) -> Result<(), SinkError>;
}

/// Status surface for a run. Never influences control flow.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, status: RunStatus, count: usize);
}
