use std::fmt;

/// The hook categories Claude Code emits, one per process invocation.
///
/// The category always comes from the positional argument the caller passes
/// when spawning the hook process. The payload's own `hook_event_name` field
/// is never consulted for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    Notification,
    Stop,
    SubagentStop,
    UserPromptSubmit,
    PreCompact,
    SessionStart,
}

impl HookEvent {
    /// Parse a category argument. Returns `None` for unrecognized categories,
    /// which the runner treats as "no handler registered".
    pub fn parse(category: &str) -> Option<Self> {
        match category {
            "PreToolUse" => Some(HookEvent::PreToolUse),
            "PostToolUse" => Some(HookEvent::PostToolUse),
            "Notification" => Some(HookEvent::Notification),
            "Stop" => Some(HookEvent::Stop),
            "SubagentStop" => Some(HookEvent::SubagentStop),
            "UserPromptSubmit" => Some(HookEvent::UserPromptSubmit),
            "PreCompact" => Some(HookEvent::PreCompact),
            "SessionStart" => Some(HookEvent::SessionStart),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::PreToolUse => "PreToolUse",
            HookEvent::PostToolUse => "PostToolUse",
            HookEvent::Notification => "Notification",
            HookEvent::Stop => "Stop",
            HookEvent::SubagentStop => "SubagentStop",
            HookEvent::UserPromptSubmit => "UserPromptSubmit",
            HookEvent::PreCompact => "PreCompact",
            HookEvent::SessionStart => "SessionStart",
        }
    }

    /// Whether the process must exit immediately after the response line.
    pub fn is_terminal(&self) -> bool {
        matches!(self, HookEvent::Stop | HookEvent::SubagentStop)
    }

    /// All known categories, in dispatch-table order.
    pub fn all() -> [HookEvent; 8] {
        [
            HookEvent::PreToolUse,
            HookEvent::PostToolUse,
            HookEvent::Notification,
            HookEvent::Stop,
            HookEvent::SubagentStop,
            HookEvent::UserPromptSubmit,
            HookEvent::PreCompact,
            HookEvent::SessionStart,
        ]
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
