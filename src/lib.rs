//! Per-event hook execution for Claude Code, plus a streaming transcript
//! query engine.
//!
//! One process handles one lifecycle event: the category arrives as a
//! positional argument, the payload as JSON on stdin, and exactly one JSON
//! response line leaves on stdout. Handlers may query the transcript store
//! through the payload's transcript path.

pub mod config;
pub mod handlers;
pub mod hooks;
pub mod runner;
pub mod session_log;
pub mod transcript;

pub use hooks::{HandlerRegistry, HookEvent, HookPayload, HookResponse};
pub use runner::{run_hook, HookOutcome, RunnerError};
pub use transcript::TranscriptStore;
