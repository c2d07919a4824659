use serde::Deserialize;
use serde_json::Value;

/// One line of a transcript file.
///
/// Lines whose `type` is not one of these, or whose shape does not match,
/// are dropped by the reader.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TranscriptMessage {
    Summary(SummaryRecord),
    User(ChatRecord),
    Assistant(ChatRecord),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SummaryRecord {
    pub summary: String,
    #[serde(rename = "leafUuid", default)]
    pub leaf_uuid: Option<String>,
}

/// Envelope shared by user and assistant lines.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub message: ChatMessage,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: MessageContent,
}

/// Message content is either a plain string or an array of typed blocks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        #[serde(default)]
        content: Value,
    },
    /// Block types this crate does not interpret (thinking, images, ...).
    #[serde(other)]
    Other,
}

impl TranscriptMessage {
    pub fn is_user(&self) -> bool {
        matches!(self, TranscriptMessage::User(_))
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, TranscriptMessage::Assistant(_))
    }

    /// The chat envelope, if this is a user or assistant line.
    pub fn record(&self) -> Option<&ChatRecord> {
        match self {
            TranscriptMessage::Summary(_) => None,
            TranscriptMessage::User(record) | TranscriptMessage::Assistant(record) => Some(record),
        }
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.record().and_then(|r| r.timestamp.as_deref())
    }

    /// Textual content: the summary text, the plain string content, or all
    /// text blocks joined with newlines.
    pub fn text(&self) -> String {
        match self {
            TranscriptMessage::Summary(summary) => summary.summary.clone(),
            TranscriptMessage::User(record) | TranscriptMessage::Assistant(record) => {
                match &record.message.content {
                    MessageContent::Text(text) => text.clone(),
                    MessageContent::Blocks(blocks) => blocks
                        .iter()
                        .filter_map(|block| match block {
                            ContentBlock::Text { text } => Some(text.as_str()),
                            _ => None,
                        })
                        .collect::<Vec<_>>()
                        .join("\n"),
                }
            }
        }
    }

    /// The `tool_use` blocks of an assistant line, in content order.
    pub fn tool_uses(&self) -> Vec<(&str, &Value)> {
        let TranscriptMessage::Assistant(record) = self else {
            return Vec::new();
        };
        match &record.message.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { name, input, .. } => Some((name.as_str(), input)),
                    _ => None,
                })
                .collect(),
        }
    }
}
