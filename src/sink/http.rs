use crate::{ExtractionSession, ResultSink, SinkError};
use serde_json::Value;
use tracing::{debug, info};

/// POSTs the export document as JSON to a logging endpoint.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new<E: Into<String>>(endpoint: E) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client<E: Into<String>>(client: reqwest::Client, endpoint: E) -> Self {
        HttpSink {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

/// Prefers the `message` field of a JSON error body.
fn rejection_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(ToString::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[async_trait::async_trait]
impl ResultSink for HttpSink {
    async fn flush(&self, session: &ExtractionSession) -> Result<(), SinkError> {
        if session.records().is_empty() {
            info!("No questions extracted, nothing to submit");
            return Ok(());
        }

        debug!("POST {} records to {}", session.records().len(), self.endpoint);
        let response = self
            .client
            .post(self.endpoint.as_str())
            .json(&session.to_export())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Submitted {} questions", session.records().len());
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Status {
            status: status.as_u16(),
            message: rejection_message(status.as_u16(), &body),
        })
    }
}
