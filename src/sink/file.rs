use crate::{utils, ExtractionSession, ResultSink, SinkError};
use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;
use tracing::info;

/// Writes the export document to `{dir}/{prefix}-{section}[-{category}]-{timestamp}.json`.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
    prefix: String,
}

impl JsonFileSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        JsonFileSink {
            dir: dir.into(),
            prefix: "gmat".to_string(),
        }
    }

    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Section and category come from the first record.
    pub fn file_name(&self, session: &ExtractionSession, time: &DateTime<FixedOffset>) -> String {
        let first = session.records().first();
        let section = first
            .and_then(|r| r.get_str("section"))
            .filter(|s| !s.is_empty())
            .unwrap_or("mixed");
        let category = first
            .and_then(|r| r.get_str("category"))
            .filter(|s| !s.is_empty())
            .map(|c| format!("-{}", c.to_lowercase()))
            .unwrap_or_default();

        format!(
            "{}-{}{}-{}.json",
            self.prefix,
            section,
            category,
            utils::file_timestamp(time)
        )
    }
}

#[async_trait::async_trait]
impl ResultSink for JsonFileSink {
    async fn flush(&self, session: &ExtractionSession) -> Result<(), SinkError> {
        if session.records().is_empty() {
            info!("No questions extracted, nothing to save");
            return Ok(());
        }

        let path = self.dir.join(self.file_name(session, &utils::get_now()));
        let json = serde_json::to_vec_pretty(&session.to_export())?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, json).await?;

        info!(
            "Saved {} questions to {}",
            session.records().len(),
            path.display()
        );
        Ok(())
    }
}
