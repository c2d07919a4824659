use serde::Serialize;

/// The single JSON value a hook invocation writes to stdout.
///
/// The legal field set depends on the category: tool and stop events carry a
/// decision/reason pair, UserPromptSubmit can additionally attach context
/// files or rewrite the prompt, and everything else answers with the empty
/// object. The empty object doubles as the safe default substituted when a
/// handler fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HookResponse {
    /// Block/approve decision for PreToolUse, PostToolUse, Stop, SubagentStop.
    Decision {
        #[serde(skip_serializing_if = "Option::is_none")]
        decision: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// UserPromptSubmit outcome.
    #[serde(rename_all = "camelCase")]
    Prompt {
        #[serde(skip_serializing_if = "Option::is_none")]
        decision: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        context_files: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        updated_prompt: Option<String>,
    },
    /// `{}`, no opinion. Also the fixed safe default on handler failure.
    Empty {},
}

impl HookResponse {
    pub fn empty() -> Self {
        HookResponse::Empty {}
    }

    pub fn block(reason: impl Into<String>) -> Self {
        HookResponse::Decision {
            decision: Some("block".to_string()),
            reason: Some(reason.into()),
        }
    }

    pub fn approve() -> Self {
        HookResponse::Decision {
            decision: Some("approve".to_string()),
            reason: None,
        }
    }

    pub fn block_prompt(reason: impl Into<String>) -> Self {
        HookResponse::Prompt {
            decision: Some("block".to_string()),
            reason: Some(reason.into()),
            context_files: None,
            updated_prompt: None,
        }
    }

    pub fn with_context(files: Vec<String>) -> Self {
        HookResponse::Prompt {
            decision: None,
            reason: None,
            context_files: Some(files),
            updated_prompt: None,
        }
    }

    pub fn rewrite_prompt(prompt: impl Into<String>) -> Self {
        HookResponse::Prompt {
            decision: None,
            reason: None,
            context_files: None,
            updated_prompt: Some(prompt.into()),
        }
    }
}

impl Default for HookResponse {
    fn default() -> Self {
        HookResponse::empty()
    }
}
