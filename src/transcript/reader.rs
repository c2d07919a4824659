use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::transcript::TranscriptMessage;

/// A lazy, forward-only cursor over the messages of a transcript.
///
/// One line is read per pull, so scanning a prefix of a large file costs only
/// the lines actually consumed. Blank and unparseable lines are skipped. Not
/// restartable; reopen the source to scan again.
pub struct MessageReader<R> {
    lines: Lines<R>,
    lines_read: u64,
}

impl<R: AsyncBufRead + Unpin> MessageReader<R> {
    pub fn new(reader: R) -> Self {
        MessageReader {
            lines: reader.lines(),
            lines_read: 0,
        }
    }

    /// Pull the next parseable message, or `None` at end of input.
    ///
    /// A read error mid-file ends the sequence: the messages scanned so far
    /// are all the caller gets, matching the degrade-to-empty contract.
    pub async fn next_message(&mut self) -> Option<TranscriptMessage> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    self.lines_read += 1;
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str(&line) {
                        Ok(message) => return Some(message),
                        Err(err) => {
                            tracing::trace!(line = self.lines_read, "skipping line: {err}");
                        }
                    }
                }
                Ok(None) => return None,
                Err(err) => {
                    tracing::warn!("transcript read failed after {} lines: {err}", self.lines_read);
                    return None;
                }
            }
        }
    }

    /// Number of lines consumed so far, parseable or not.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(input: &str) -> MessageReader<&[u8]> {
        MessageReader::new(input.as_bytes())
    }

    #[tokio::test]
    async fn test_reads_messages_in_order() {
        let input = concat!(
            r#"{"type":"summary","summary":"one"}"#,
            "\n",
            r#"{"type":"user","message":{"role":"user","content":"two"}}"#,
            "\n",
        );
        let mut cursor = reader(input);
        assert_eq!(cursor.next_message().await.map(|m| m.text()), Some("one".to_string()));
        assert_eq!(cursor.next_message().await.map(|m| m.text()), Some("two".to_string()));
        assert!(cursor.next_message().await.is_none());
    }

    #[tokio::test]
    async fn test_skips_blank_and_malformed_lines() {
        let input = concat!(
            "\n",
            "not json at all\n",
            r#"{"type":"system","subtype":"init"}"#,
            "\n",
            r#"{"type":"user","message":{"content":"kept"}}"#,
            "\n",
        );
        let mut cursor = reader(input);
        assert_eq!(cursor.next_message().await.map(|m| m.text()), Some("kept".to_string()));
        assert!(cursor.next_message().await.is_none());
        assert_eq!(cursor.lines_read(), 4);
    }

    #[tokio::test]
    async fn test_stops_counting_when_caller_stops_pulling() {
        let input = concat!(
            r#"{"type":"user","message":{"content":"first"}}"#,
            "\n",
            r#"{"type":"user","message":{"content":"second"}}"#,
            "\n",
            r#"{"type":"user","message":{"content":"third"}}"#,
            "\n",
        );
        let mut cursor = reader(input);
        let _ = cursor.next_message().await;
        // Only the consumed prefix was read from the source.
        assert_eq!(cursor.lines_read(), 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let mut cursor = reader("");
        assert!(cursor.next_message().await.is_none());
        assert_eq!(cursor.lines_read(), 0);
    }
}
