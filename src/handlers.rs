//! Built-in handlers wired by the binary. Embedders can register their own.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{GuardConfig, HookshotConfig};
use crate::hooks::{
    HandlerError, HandlerRegistry, HookEvent, HookHandler, HookPayload, HookResponse,
    PayloadDetail,
};
use crate::session_log::SessionLog;
use crate::transcript::TranscriptStore;

/// PreToolUse guard: blocks configured command substrings for Bash and
/// protected path globs for Edit/Write.
pub struct CommandGuard {
    blocked_commands: Vec<String>,
    protected_paths: Vec<glob::Pattern>,
}

impl CommandGuard {
    pub fn from_config(config: &GuardConfig) -> Self {
        CommandGuard {
            blocked_commands: config.blocked_commands.clone(),
            // Patterns were validated at config load
            protected_paths: config
                .protected_paths
                .iter()
                .filter_map(|pattern| glob::Pattern::new(pattern).ok())
                .collect(),
        }
    }
}

#[async_trait]
impl HookHandler for CommandGuard {
    fn name(&self) -> &str {
        "command-guard"
    }

    async fn handle(&self, payload: HookPayload) -> Result<HookResponse, HandlerError> {
        let PayloadDetail::PreToolUse {
            tool_name,
            tool_input,
        } = &payload.detail
        else {
            return Ok(HookResponse::empty());
        };

        match tool_name.as_str() {
            "Bash" => {
                let command = tool_input["command"].as_str().unwrap_or_default();
                if self.blocked_commands.iter().any(|b| command.contains(b)) {
                    tracing::info!(command, "blocking dangerous command");
                    return Ok(HookResponse::block(format!(
                        "Dangerous command detected: {command}"
                    )));
                }
            }
            "Edit" | "Write" => {
                let file_path = tool_input["file_path"].as_str().unwrap_or_default();
                if self.protected_paths.iter().any(|p| p.matches(file_path)) {
                    tracing::info!(file_path, "blocking write to protected path");
                    return Ok(HookResponse::block(format!(
                        "Protected path: {file_path}"
                    )));
                }
            }
            _ => {}
        }
        Ok(HookResponse::empty())
    }
}

/// Records every event to the per-session log. On terminal events it also
/// attaches the session metadata derived from the transcript.
pub struct SessionRecorder {
    log: SessionLog,
    store: Arc<TranscriptStore>,
}

impl SessionRecorder {
    pub fn new(log: SessionLog, store: Arc<TranscriptStore>) -> Self {
        SessionRecorder { log, store }
    }

    fn summarize(payload: &HookPayload) -> Value {
        let mut record = json!({
            "session_id": payload.session_id,
            "transcript_path": payload.transcript_path,
            "cwd": payload.cwd,
        });
        match &payload.detail {
            PayloadDetail::PreToolUse {
                tool_name,
                tool_input,
            } => {
                record["tool_name"] = json!(tool_name);
                record["tool_input"] = tool_input.clone();
            }
            PayloadDetail::PostToolUse {
                tool_name,
                tool_input,
                tool_response,
            } => {
                record["tool_name"] = json!(tool_name);
                record["tool_input"] = tool_input.clone();
                record["tool_response"] = tool_response.clone();
            }
            PayloadDetail::Notification { message, title } => {
                record["message"] = json!(message);
                record["title"] = json!(title);
            }
            PayloadDetail::Stop { stop_hook_active }
            | PayloadDetail::SubagentStop { stop_hook_active } => {
                record["stop_hook_active"] = json!(stop_hook_active);
            }
            PayloadDetail::UserPromptSubmit { prompt } => {
                record["prompt"] = json!(prompt);
            }
            PayloadDetail::PreCompact {
                trigger,
                custom_instructions,
            } => {
                record["trigger"] = json!(trigger);
                record["custom_instructions"] = json!(custom_instructions);
            }
            PayloadDetail::SessionStart { source } => {
                record["source"] = json!(source);
            }
        }
        record
    }
}

#[async_trait]
impl HookHandler for SessionRecorder {
    fn name(&self) -> &str {
        "session-recorder"
    }

    async fn handle(&self, payload: HookPayload) -> Result<HookResponse, HandlerError> {
        let event = payload.event();
        let mut record = Self::summarize(&payload);

        if event.is_terminal() && !payload.transcript_path.is_empty() {
            let path = std::path::Path::new(&payload.transcript_path);
            if let Some(metadata) = self.store.session_metadata(path).await {
                record["session"] = json!({
                    "version": metadata.version,
                    "git_branch": metadata.git_branch,
                    "first_timestamp": metadata.first_timestamp,
                    "last_timestamp": metadata.last_timestamp,
                });
            }
        }

        self.log
            .append(&payload.session_id, event, &record)
            .await
            .map_err(|err| HandlerError::failed(format!("session log append: {err}")))?;
        Ok(HookResponse::empty())
    }
}

/// Records the event, then defers the decision to the guard. Keeps the
/// one-handler-per-category contract where both concerns apply.
pub struct RecordingGuard {
    guard: CommandGuard,
    recorder: Arc<SessionRecorder>,
}

impl RecordingGuard {
    pub fn new(guard: CommandGuard, recorder: Arc<SessionRecorder>) -> Self {
        RecordingGuard { guard, recorder }
    }
}

#[async_trait]
impl HookHandler for RecordingGuard {
    fn name(&self) -> &str {
        "recording-guard"
    }

    async fn handle(&self, payload: HookPayload) -> Result<HookResponse, HandlerError> {
        if let Err(err) = self.recorder.handle(payload.clone()).await {
            // Recording trouble must not change the permission decision.
            tracing::warn!("session recording failed: {err}");
        }
        self.guard.handle(payload).await
    }
}

/// The registry `main` runs with: the guard on PreToolUse, and (when enabled)
/// the recorder on every category, composed with the guard where they overlap.
pub fn default_registry(config: &HookshotConfig, store: Arc<TranscriptStore>) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    let guard = CommandGuard::from_config(&config.guard);

    if config.session_log.enabled {
        let recorder = Arc::new(SessionRecorder::new(
            SessionLog::new(config.session_log.dir()),
            store,
        ));
        registry.register(
            HookEvent::PreToolUse,
            Arc::new(RecordingGuard::new(guard, Arc::clone(&recorder))),
        );
        for event in HookEvent::all() {
            if event != HookEvent::PreToolUse {
                registry.register(event, Arc::clone(&recorder) as Arc<dyn HookHandler>);
            }
        }
    } else {
        registry.register(HookEvent::PreToolUse, Arc::new(guard));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn guard() -> CommandGuard {
        CommandGuard::from_config(&GuardConfig {
            blocked_commands: vec!["rm -rf /".to_string()],
            protected_paths: vec!["**/.env".to_string()],
        })
    }

    fn pre_tool_use(tool_name: &str, tool_input: Value) -> HookPayload {
        HookPayload::tag(
            HookEvent::PreToolUse,
            &json!({
                "session_id": "s1",
                "transcript_path": "t.jsonl",
                "hook_event_name": "PreToolUse",
                "tool_name": tool_name,
                "tool_input": tool_input,
            }),
        )
    }

    #[tokio::test]
    async fn test_guard_blocks_dangerous_command() {
        let payload = pre_tool_use("Bash", json!({"command": "rm -rf /"}));
        let response = guard().handle(payload).await.unwrap();
        assert_eq!(
            response,
            HookResponse::block("Dangerous command detected: rm -rf /")
        );
    }

    #[tokio::test]
    async fn test_guard_allows_benign_command() {
        let payload = pre_tool_use("Bash", json!({"command": "cargo test"}));
        let response = guard().handle(payload).await.unwrap();
        assert_eq!(response, HookResponse::empty());
    }

    #[tokio::test]
    async fn test_guard_blocks_protected_path() {
        let payload = pre_tool_use("Write", json!({"file_path": "app/.env"}));
        let response = guard().handle(payload).await.unwrap();
        assert_eq!(response, HookResponse::block("Protected path: app/.env"));
    }

    #[tokio::test]
    async fn test_guard_ignores_other_tools() {
        let payload = pre_tool_use("Read", json!({"file_path": "app/.env"}));
        let response = guard().handle(payload).await.unwrap();
        assert_eq!(response, HookResponse::empty());
    }

    #[tokio::test]
    async fn test_recorder_appends_event() {
        let dir = TempDir::new().unwrap();
        let log = SessionLog::new(dir.path());
        let recorder = SessionRecorder::new(log.clone(), Arc::new(TranscriptStore::new()));

        let payload = pre_tool_use("Bash", json!({"command": "ls"}));
        recorder.handle(payload).await.unwrap();

        let body = std::fs::read_to_string(log.path_for("s1")).unwrap();
        let records: Vec<Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["payload"]["tool_name"], "Bash");
    }

    #[tokio::test]
    async fn test_recorder_attaches_metadata_on_stop() {
        let dir = TempDir::new().unwrap();
        let transcript = dir.path().join("t.jsonl");
        std::fs::write(
            &transcript,
            r#"{"type":"user","sessionId":"s1","version":"2.0.1","timestamp":"2026-01-05T10:00:00Z","message":{"role":"user","content":"hi"}}"#,
        )
        .unwrap();

        let log = SessionLog::new(dir.path().join("sessions"));
        let recorder = SessionRecorder::new(log.clone(), Arc::new(TranscriptStore::new()));
        let payload = HookPayload::tag(
            HookEvent::Stop,
            &json!({
                "session_id": "s1",
                "transcript_path": transcript.to_string_lossy(),
                "hook_event_name": "Stop",
            }),
        );
        recorder.handle(payload).await.unwrap();

        let body = std::fs::read_to_string(log.path_for("s1")).unwrap();
        let records: Vec<Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(records[0]["payload"]["session"]["version"], "2.0.1");
    }

    #[test]
    fn test_default_registry_with_logging() {
        let mut config = HookshotConfig::default();
        config.session_log.enabled = true;
        let registry = default_registry(&config, Arc::new(TranscriptStore::new()));
        assert_eq!(registry.len(), 8);
        assert_eq!(
            registry.get(HookEvent::PreToolUse).map(|h| h.name()),
            Some("recording-guard")
        );
        assert_eq!(
            registry.get(HookEvent::Stop).map(|h| h.name()),
            Some("session-recorder")
        );
    }

    #[tokio::test]
    async fn test_recording_guard_logs_and_blocks() {
        // With logging enabled, a PreToolUse event must land in the session
        // log and still get the guard's decision.
        let dir = TempDir::new().unwrap();
        let mut config = HookshotConfig::default();
        config.session_log.enabled = true;
        config.session_log.dir = Some(dir.path().to_path_buf());
        let registry = default_registry(&config, Arc::new(TranscriptStore::new()));

        let handler = registry.get(HookEvent::PreToolUse).cloned().unwrap();
        let payload = pre_tool_use("Bash", json!({"command": "rm -rf /"}));
        let response = handler.handle(payload).await.unwrap();
        assert_eq!(
            response,
            HookResponse::block("Dangerous command detected: rm -rf /")
        );

        let body = std::fs::read_to_string(dir.path().join("s1.json")).unwrap();
        let records: Vec<Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["hook_event"], "PreToolUse");
        assert_eq!(records[0]["payload"]["tool_input"]["command"], "rm -rf /");
    }

    #[tokio::test]
    async fn test_recording_guard_allows_and_still_logs() {
        let dir = TempDir::new().unwrap();
        let guard = CommandGuard::from_config(&GuardConfig::default());
        let recorder = Arc::new(SessionRecorder::new(
            SessionLog::new(dir.path()),
            Arc::new(TranscriptStore::new()),
        ));
        let handler = RecordingGuard::new(guard, recorder);

        let payload = pre_tool_use("Bash", json!({"command": "cargo test"}));
        let response = handler.handle(payload).await.unwrap();
        assert_eq!(response, HookResponse::empty());
        assert!(dir.path().join("s1.json").exists());
    }

    #[test]
    fn test_default_registry_without_logging() {
        let registry = default_registry(&HookshotConfig::default(), Arc::new(TranscriptStore::new()));
        assert_eq!(registry.len(), 1);
    }
}
