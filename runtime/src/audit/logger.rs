//! JSONL event log: append-only record of pipeline runs and search engine
//! pings.

use crate::error::{Result, SeoError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// A single logged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub timestamp: String,
    /// `pipeline_run` or `ping`.
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub status: String,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl Event {
    pub fn new(event: &str, status: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: event.to_string(),
            run_id: None,
            entity_type: None,
            entity_id: None,
            status: status.to_string(),
            duration_ms: 0,
            detail: None,
        }
    }

    pub fn run(mut self, run_id: &str) -> Self {
        self.run_id = Some(run_id.to_string());
        self
    }

    pub fn entity(mut self, entity_type: &str, entity_id: &str) -> Self {
        self.entity_type = Some(entity_type.to_string());
        self.entity_id = Some(entity_id.to_string());
        self
    }

    pub fn duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }

    pub fn detail(mut self, detail: impl Serialize) -> Self {
        self.detail = serde_json::to_value(detail).ok();
        self
    }
}

/// Append-only JSONL event log, shareable across tasks.
pub struct EventLog {
    file: Mutex<File>,
}

impl EventLog {
    /// Open or create the event log file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                SeoError::Io(std::io::Error::new(
                    e.kind(),
                    format!("failed to open event log {}: {e}", path.display()),
                ))
            })?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Append one event as a JSON line.
    pub fn log(&self, event: &Event) -> Result<()> {
        let json = serde_json::to_string(event)?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| SeoError::Task("event log lock poisoned".to_string()))?;
        writeln!(file, "{json}")?;
        Ok(())
    }

    /// Log and swallow failures; for callers with no error channel.
    pub fn record(&self, event: Event) {
        if let Err(e) = self.log(&event) {
            tracing::warn!(event = %event.event, error = %e, "failed to write event log");
        }
    }
}
