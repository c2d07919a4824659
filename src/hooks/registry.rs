//! Registry mapping hook categories to handlers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::hooks::{HookEvent, HookPayload, HookResponse};

/// Handler execution errors.
///
/// The runner catches these, logs them, and substitutes the safe default
/// response; they never escape a hook invocation.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("handler execution failed: {reason}")]
    Failed { reason: String },
}

impl HandlerError {
    pub fn failed(reason: impl Into<String>) -> Self {
        HandlerError::Failed {
            reason: reason.into(),
        }
    }
}

/// A callback for one hook category.
///
/// Handlers receive the payload already tagged with the category the caller
/// passed and may query the transcript store through the payload's
/// `transcript_path`.
#[async_trait]
pub trait HookHandler: Send + Sync {
    /// A short name for diagnostics.
    fn name(&self) -> &str {
        "handler"
    }

    async fn handle(&self, payload: HookPayload) -> Result<HookResponse, HandlerError>;
}

/// Adapter implementing [`HookHandler`] for an async closure.
pub struct FnHandler<F> {
    name: String,
    func: F,
}

impl<F> FnHandler<F> {
    pub fn new(name: impl Into<String>, func: F) -> Self {
        FnHandler {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F, Fut> HookHandler for FnHandler<F>
where
    F: Fn(HookPayload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HookResponse, HandlerError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, payload: HookPayload) -> Result<HookResponse, HandlerError> {
        (self.func)(payload).await
    }
}

/// At most one handler per category. Categories without a handler answer `{}`.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<HookEvent, Arc<dyn HookHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous handler for the category.
    pub fn register(&mut self, event: HookEvent, handler: Arc<dyn HookHandler>) {
        if let Some(previous) = self.handlers.insert(event, handler) {
            tracing::debug!(%event, replaced = previous.name(), "replaced handler");
        }
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, event: HookEvent, handler: Arc<dyn HookHandler>) -> Self {
        self.register(event, handler);
        self
    }

    pub fn get(&self, event: HookEvent) -> Option<&Arc<dyn HookHandler>> {
        self.handlers.get(&event)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::PayloadDetail;
    use serde_json::json;

    fn stop_payload() -> HookPayload {
        HookPayload::tag(HookEvent::Stop, &json!({"session_id": "s1"}))
    }

    #[tokio::test]
    async fn test_fn_handler_invoked() {
        let handler = FnHandler::new("echo-session", |payload: HookPayload| async move {
            Ok::<_, HandlerError>(HookResponse::block(payload.session_id))
        });
        let response = handler.handle(stop_payload()).await.unwrap();
        assert_eq!(response, HookResponse::block("s1"));
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = HandlerRegistry::new().with(
            HookEvent::Stop,
            Arc::new(FnHandler::new("noop", |_| async {
                Ok::<_, HandlerError>(HookResponse::empty())
            })),
        );

        assert_eq!(registry.len(), 1);
        assert!(registry.get(HookEvent::Stop).is_some());
        assert!(registry.get(HookEvent::PreToolUse).is_none());
    }

    #[tokio::test]
    async fn test_register_replaces_existing() {
        let mut registry = HandlerRegistry::new();
        registry.register(
            HookEvent::Stop,
            Arc::new(FnHandler::new("first", |_| async {
                Ok::<_, HandlerError>(HookResponse::block("first"))
            })),
        );
        registry.register(
            HookEvent::Stop,
            Arc::new(FnHandler::new("second", |_| async {
                Ok::<_, HandlerError>(HookResponse::block("second"))
            })),
        );

        assert_eq!(registry.len(), 1);
        let handler = registry.get(HookEvent::Stop).cloned().unwrap();
        let response = handler.handle(stop_payload()).await.unwrap();
        assert_eq!(response, HookResponse::block("second"));
    }

    #[test]
    fn test_payload_detail_matches_category() {
        let payload = stop_payload();
        assert!(matches!(payload.detail, PayloadDetail::Stop { .. }));
    }
}
