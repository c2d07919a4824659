//! Per-session event log: one JSON array file per session id.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::hooks::HookEvent;

#[derive(Debug, Serialize)]
struct LogRecord<'a> {
    timestamp: String,
    hook_event: &'a str,
    payload: &'a Value,
}

/// Appends timestamped `(category, payload)` records to
/// `{dir}/{session_id}.json`. Only handlers call this; the runner never does.
#[derive(Debug, Clone)]
pub struct SessionLog {
    dir: PathBuf,
}

impl SessionLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SessionLog { dir: dir.into() }
    }

    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    /// Append one record, creating the directory and file as needed.
    pub async fn append(&self, session_id: &str, event: HookEvent, payload: &Value) -> Result<()> {
        let path = self.path_for(session_id);
        let mut records = read_records(&path).await;

        let record = LogRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            hook_event: event.as_str(),
            payload,
        };
        records.push(serde_json::to_value(&record).context("serializing log record")?);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating session log dir {}", self.dir.display()))?;
        let body = serde_json::to_string_pretty(&records).context("serializing session log")?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("writing session log {}", path.display()))?;
        Ok(())
    }
}

/// Existing records, or an empty array if the file is missing or corrupt.
async fn read_records(path: &Path) -> Vec<Value> {
    let Ok(body) = tokio::fs::read_to_string(path).await else {
        return Vec::new();
    };
    match serde_json::from_str(&body) {
        Ok(Value::Array(records)) => records,
        _ => {
            tracing::warn!(path = %path.display(), "session log is not a JSON array, starting over");
            Vec::new()
        }
    }
}
