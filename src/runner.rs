//! Per-process hook execution: buffer stdin, tag, dispatch, respond.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::hooks::{HandlerRegistry, HookEvent, HookPayload, HookResponse};

const READ_CHUNK: usize = 8192;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Stdin closed before the buffer parsed as one JSON value. No response
    /// line is emitted; the caller must treat stdout silence as failure.
    #[error("malformed input: {detail}")]
    MalformedInput { detail: String },
    #[error("failed to read input")]
    Read(#[source] std::io::Error),
    #[error("failed to write response")]
    Write(#[source] std::io::Error),
}

/// What one invocation produced, after the response line was written.
#[derive(Debug)]
pub struct HookOutcome {
    /// The recognized category, if any.
    pub event: Option<HookEvent>,
    pub response: HookResponse,
    /// When true, the process must exit now with status 0.
    pub terminal: bool,
}

/// Execute one hook event end to end.
///
/// `category` is the positional argument the caller passed; it alone decides
/// dispatch. Exactly one JSON line is written to `output` for every
/// syntactically valid input: the handler's response, `{}` when no handler is
/// registered or the category is unknown, or the safe default `{}` when the
/// handler fails.
pub async fn run_hook<R, W>(
    category: &str,
    registry: &HandlerRegistry,
    input: R,
    mut output: W,
) -> Result<HookOutcome, RunnerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let value = read_payload(input).await?;

    let event = HookEvent::parse(category);
    let response = match event {
        None => {
            tracing::warn!(category, "unknown hook category, answering with default");
            HookResponse::empty()
        }
        Some(event) => {
            let payload = HookPayload::tag(event, &value);
            dispatch(registry, event, payload).await
        }
    };

    let line = serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
    output
        .write_all(line.as_bytes())
        .await
        .map_err(RunnerError::Write)?;
    output.write_all(b"\n").await.map_err(RunnerError::Write)?;
    output.flush().await.map_err(RunnerError::Write)?;

    Ok(HookOutcome {
        event,
        terminal: event.is_some_and(|event| event.is_terminal()),
        response,
    })
}

async fn dispatch(
    registry: &HandlerRegistry,
    event: HookEvent,
    payload: HookPayload,
) -> HookResponse {
    let Some(handler) = registry.get(event) else {
        tracing::debug!(%event, "no handler registered");
        return HookResponse::empty();
    };

    match handler.handle(payload).await {
        Ok(response) => response,
        Err(err) => {
            // A failing handler must never crash the process or leave the
            // caller without parseable output.
            tracing::error!(%event, handler = handler.name(), "handler failed: {err}");
            HookResponse::empty()
        }
    }
}

/// Accumulate stdin chunks until the buffer parses as one JSON value.
///
/// A parse failure mid-stream only means the value is incomplete, so the
/// buffer keeps growing; EOF with a still-unparseable buffer is malformed
/// input.
async fn read_payload<R>(mut input: R) -> Result<serde_json::Value, RunnerError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = input.read(&mut chunk).await.map_err(RunnerError::Read)?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if let Ok(value) = serde_json::from_slice(&buffer) {
            return Ok(value);
        }
    }

    let detail = if buffer.is_empty() {
        "stdin closed without any input".to_string()
    } else {
        format!("stdin closed with {} unparseable bytes", buffer.len())
    };
    Err(RunnerError::MalformedInput { detail })
}
