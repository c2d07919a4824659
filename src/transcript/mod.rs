//! Streaming reader, cache, and query API over Claude Code transcript files.
//!
//! A transcript is an append-only JSONL log. Everything here reads it in a
//! single forward pass with bounded memory; a line that does not parse as a
//! known record is skipped, never fatal.

mod message;
mod reader;
mod store;

pub use message::{
    ChatMessage, ChatRecord, ContentBlock, MessageContent, SummaryRecord, TranscriptMessage,
};
pub use reader::MessageReader;
pub use store::{
    SearchOptions, SessionMetadata, SweeperHandle, ToolUsage, TranscriptStore, DEFAULT_CACHE_TTL,
};
