use crate::stream::{Outcome, RequestId};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::Level;
use uuid::Uuid;

/// What the engine did with one intercepted response.
#[derive(Debug, Clone)]
pub struct RewriteRecord {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub outcome: &'static str,
    pub variant_count: Option<usize>,
    pub selected_bandwidth: Option<u64>,
    pub error_message: Option<String>,
    pub original_len: usize,
    pub final_len: usize,
    pub elapsed_ms: u64,
    pub level: Level,
}

impl RewriteRecord {
    pub fn new(request: &RequestId, url: &str) -> Self {
        Self {
            request_id: *request.as_uuid(),
            timestamp: Utc::now(),
            url: url.to_string(),
            outcome: "pending",
            variant_count: None,
            selected_bandwidth: None,
            error_message: None,
            original_len: 0,
            final_len: 0,
            elapsed_ms: 0,
            level: Level::DEBUG,
        }
    }

    pub fn with_outcome(mut self, outcome: &Outcome) -> Self {
        self.outcome = outcome.as_str();
        match outcome {
            Outcome::Rewritten {
                variant_count,
                bandwidth,
            } => {
                self.variant_count = Some(*variant_count);
                self.selected_bandwidth = Some(*bandwidth);
                self.level = Level::INFO;
            }
            Outcome::Failed(message) => {
                self.error_message = Some(message.clone());
                self.level = Level::WARN;
            }
            Outcome::Declined | Outcome::Skipped | Outcome::Passthrough => {
                self.level = Level::DEBUG;
            }
        }
        self
    }

    pub fn with_sizes(mut self, original_len: usize, final_len: usize) -> Self {
        self.original_len = original_len;
        self.final_len = final_len;
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Emit as a single tracing event.
    pub fn emit(&self) {
        macro_rules! emit_at {
            ($level:expr, $record:expr) => {
                tracing::event!(
                    $level,
                    request_id = %$record.request_id,
                    timestamp = %$record.timestamp.to_rfc3339(),
                    url = %$record.url,
                    outcome = $record.outcome,
                    variant_count = ?$record.variant_count,
                    selected_bandwidth = ?$record.selected_bandwidth,
                    error = ?$record.error_message,
                    original_len = $record.original_len,
                    final_len = $record.final_len,
                    elapsed_ms = $record.elapsed_ms,
                    "Playlist response processed"
                )
            };
        }

        // `event!` needs a constant level.
        if self.level == Level::INFO {
            emit_at!(Level::INFO, self);
        } else if self.level == Level::WARN {
            emit_at!(Level::WARN, self);
        } else {
            emit_at!(Level::DEBUG, self);
        }
    }
}
