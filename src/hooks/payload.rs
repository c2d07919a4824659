use serde::Deserialize;
use serde_json::Value;

use crate::hooks::HookEvent;

/// Input JSON from the Claude Code hook system, before tagging.
///
/// Every field is optional at the wire level so that a syntactically valid
/// payload always produces a dispatchable `HookPayload`, whatever fields it
/// carries.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawPayload {
    session_id: String,
    transcript_path: String,
    cwd: String,
    hook_event_name: String,
    tool_name: Option<String>,
    tool_input: Option<Value>,
    tool_response: Option<Value>,
    message: Option<String>,
    title: Option<String>,
    stop_hook_active: Option<bool>,
    prompt: Option<String>,
    trigger: Option<String>,
    custom_instructions: Option<String>,
    source: Option<String>,
}

/// A hook payload tagged with the category the caller passed as an argument.
///
/// The tag lives in [`PayloadDetail`]; the payload's own `hook_event_name`
/// is kept only for diagnostics and is never used for dispatch, so a payload
/// cannot spoof its way to a different handler.
#[derive(Debug, Clone)]
pub struct HookPayload {
    pub session_id: String,
    pub transcript_path: String,
    pub cwd: String,
    /// Self-reported event name from the payload body. Informational only.
    pub hook_event_name: String,
    pub detail: PayloadDetail,
}

/// Category-specific payload fields.
#[derive(Debug, Clone)]
pub enum PayloadDetail {
    PreToolUse {
        tool_name: String,
        tool_input: Value,
    },
    PostToolUse {
        tool_name: String,
        tool_input: Value,
        tool_response: Value,
    },
    Notification {
        message: String,
        title: Option<String>,
    },
    Stop {
        stop_hook_active: bool,
    },
    SubagentStop {
        stop_hook_active: bool,
    },
    UserPromptSubmit {
        prompt: String,
    },
    PreCompact {
        trigger: String,
        custom_instructions: Option<String>,
    },
    SessionStart {
        source: String,
    },
}

impl HookPayload {
    /// Tag a parsed JSON value with the externally supplied category.
    ///
    /// Category-specific fields the payload does not carry default to empty
    /// values; an unexpected payload shape degrades to defaults rather than
    /// failing, so dispatch always proceeds for syntactically valid input.
    pub fn tag(event: HookEvent, value: &Value) -> Self {
        let raw: RawPayload = match RawPayload::deserialize(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(%event, "payload fields did not decode, using defaults: {err}");
                RawPayload::default()
            }
        };

        let detail = match event {
            HookEvent::PreToolUse => PayloadDetail::PreToolUse {
                tool_name: raw.tool_name.unwrap_or_default(),
                tool_input: raw.tool_input.unwrap_or(Value::Null),
            },
            HookEvent::PostToolUse => PayloadDetail::PostToolUse {
                tool_name: raw.tool_name.unwrap_or_default(),
                tool_input: raw.tool_input.unwrap_or(Value::Null),
                tool_response: raw.tool_response.unwrap_or(Value::Null),
            },
            HookEvent::Notification => PayloadDetail::Notification {
                message: raw.message.unwrap_or_default(),
                title: raw.title,
            },
            HookEvent::Stop => PayloadDetail::Stop {
                stop_hook_active: raw.stop_hook_active.unwrap_or(false),
            },
            HookEvent::SubagentStop => PayloadDetail::SubagentStop {
                stop_hook_active: raw.stop_hook_active.unwrap_or(false),
            },
            HookEvent::UserPromptSubmit => PayloadDetail::UserPromptSubmit {
                prompt: raw.prompt.unwrap_or_default(),
            },
            HookEvent::PreCompact => PayloadDetail::PreCompact {
                trigger: raw.trigger.unwrap_or_default(),
                custom_instructions: raw.custom_instructions,
            },
            HookEvent::SessionStart => PayloadDetail::SessionStart {
                source: raw.source.unwrap_or_default(),
            },
        };

        HookPayload {
            session_id: raw.session_id,
            transcript_path: raw.transcript_path,
            cwd: raw.cwd,
            hook_event_name: raw.hook_event_name,
            detail,
        }
    }

    /// The category this payload was tagged with.
    pub fn event(&self) -> HookEvent {
        match self.detail {
            PayloadDetail::PreToolUse { .. } => HookEvent::PreToolUse,
            PayloadDetail::PostToolUse { .. } => HookEvent::PostToolUse,
            PayloadDetail::Notification { .. } => HookEvent::Notification,
            PayloadDetail::Stop { .. } => HookEvent::Stop,
            PayloadDetail::SubagentStop { .. } => HookEvent::SubagentStop,
            PayloadDetail::UserPromptSubmit { .. } => HookEvent::UserPromptSubmit,
            PayloadDetail::PreCompact { .. } => HookEvent::PreCompact,
            PayloadDetail::SessionStart { .. } => HookEvent::SessionStart,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tag_pre_tool_use() {
        let value = json!({
            "session_id": "s1",
            "transcript_path": "t.jsonl",
            "hook_event_name": "PreToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "ls"},
        });
        let payload = HookPayload::tag(HookEvent::PreToolUse, &value);
        assert_eq!(payload.session_id, "s1");
        assert_eq!(payload.transcript_path, "t.jsonl");
        match &payload.detail {
            PayloadDetail::PreToolUse {
                tool_name,
                tool_input,
            } => {
                assert_eq!(tool_name, "Bash");
                assert_eq!(tool_input["command"], "ls");
            }
            other => panic!("wrong detail: {other:?}"),
        }
    }

    #[test]
    fn test_tag_ignores_self_reported_event_name() {
        // A payload claiming to be a Stop event still dispatches as the
        // category the caller passed.
        let value = json!({
            "session_id": "s1",
            "transcript_path": "t.jsonl",
            "hook_event_name": "Stop",
            "prompt": "hello",
        });
        let payload = HookPayload::tag(HookEvent::UserPromptSubmit, &value);
        assert_eq!(payload.event(), HookEvent::UserPromptSubmit);
        assert_eq!(payload.hook_event_name, "Stop");
        match &payload.detail {
            PayloadDetail::UserPromptSubmit { prompt } => assert_eq!(prompt, "hello"),
            other => panic!("wrong detail: {other:?}"),
        }
    }

    #[test]
    fn test_tag_missing_fields_default() {
        let value = json!({"session_id": "s1"});
        let payload = HookPayload::tag(HookEvent::PostToolUse, &value);
        match &payload.detail {
            PayloadDetail::PostToolUse {
                tool_name,
                tool_input,
                tool_response,
            } => {
                assert_eq!(tool_name, "");
                assert!(tool_input.is_null());
                assert!(tool_response.is_null());
            }
            other => panic!("wrong detail: {other:?}"),
        }
    }

    #[test]
    fn test_tag_non_object_payload_degrades() {
        let payload = HookPayload::tag(HookEvent::Stop, &json!([1, 2, 3]));
        assert_eq!(payload.session_id, "");
        match payload.detail {
            PayloadDetail::Stop { stop_hook_active } => assert!(!stop_hook_active),
            other => panic!("wrong detail: {other:?}"),
        }
    }
}
