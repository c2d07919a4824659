//! Hook event categories, payloads, responses, and the handler registry.

mod event;
mod payload;
mod registry;
mod response;

pub use event::HookEvent;
pub use payload::{HookPayload, PayloadDetail};
pub use registry::{FnHandler, HandlerError, HandlerRegistry, HookHandler};
pub use response::HookResponse;
