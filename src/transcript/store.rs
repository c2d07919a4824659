use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::transcript::{MessageReader, TranscriptMessage};

/// How long a cached transcript read stays valid.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    messages: Arc<Vec<TranscriptMessage>>,
    fetched_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() >= ttl
    }
}

/// One tool invocation recorded in an assistant message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolUsage {
    pub tool_name: String,
    pub input: Value,
    pub timestamp: Option<String>,
}

/// Session facts derived from a full transcript scan.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionMetadata {
    pub session_id: Option<String>,
    pub version: Option<String>,
    pub cwd: Option<String>,
    pub git_branch: Option<String>,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    /// Stop scanning once this many matches have been collected.
    pub limit: Option<usize>,
}

/// Query API over transcript files, with a per-path TTL cache for full reads.
///
/// Every operation degrades to an empty result when the file cannot be opened
/// or read; transcript unavailability never fails the hook invocation that
/// asked.
pub struct TranscriptStore {
    ttl: Duration,
    cache: Mutex<HashMap<PathBuf, CacheEntry>>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        TranscriptStore {
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn open(&self, path: &Path) -> Option<MessageReader<BufReader<File>>> {
        match File::open(path).await {
            Ok(file) => Some(MessageReader::new(BufReader::new(file))),
            Err(err) => {
                tracing::warn!(path = %path.display(), "cannot open transcript: {err}");
                None
            }
        }
    }

    /// Text of the first user message, scanning no further than the match.
    pub async fn initial_message(&self, path: &Path) -> Option<String> {
        let mut reader = self.open(path).await?;
        first_user_text(&mut reader).await
    }

    /// Every message in the file, in order.
    ///
    /// With `use_cache`, a read for the same path within the TTL window is
    /// served from memory. Either way a fresh scan replaces any prior cache
    /// entry for the path.
    pub async fn all_messages(&self, path: &Path, use_cache: bool) -> Arc<Vec<TranscriptMessage>> {
        if use_cache {
            if let Some(messages) = self.cached(path) {
                tracing::debug!(path = %path.display(), "transcript cache hit");
                return messages;
            }
        }

        let Some(mut reader) = self.open(path).await else {
            return Arc::new(Vec::new());
        };
        let mut messages = Vec::new();
        while let Some(message) = reader.next_message().await {
            messages.push(message);
        }
        let messages = Arc::new(messages);

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(
                path.to_path_buf(),
                CacheEntry {
                    messages: Arc::clone(&messages),
                    fetched_at: Instant::now(),
                },
            );
        }
        messages
    }

    /// The final `min(n, total)` messages, in original order. Memory is O(n)
    /// regardless of file size.
    pub async fn last_n_messages(&self, path: &Path, n: usize) -> Vec<TranscriptMessage> {
        if n == 0 {
            return Vec::new();
        }
        let Some(mut reader) = self.open(path).await else {
            return Vec::new();
        };
        let mut window = VecDeque::with_capacity(n + 1);
        while let Some(message) = reader.next_message().await {
            window.push_back(message);
            if window.len() > n {
                window.pop_front();
            }
        }
        window.into_iter().collect()
    }

    /// Messages whose text contains `needle`, case-insensitive unless asked
    /// otherwise. With a limit, the scan halts at the limit-th match.
    pub async fn search_messages(
        &self,
        path: &Path,
        needle: &str,
        options: SearchOptions,
    ) -> Vec<TranscriptMessage> {
        if let Some(0) = options.limit {
            return Vec::new();
        }
        let Some(mut reader) = self.open(path).await else {
            return Vec::new();
        };
        let needle = if options.case_sensitive {
            needle.to_string()
        } else {
            needle.to_lowercase()
        };

        let mut matches = Vec::new();
        while let Some(message) = reader.next_message().await {
            let haystack = if options.case_sensitive {
                message.text()
            } else {
                message.text().to_lowercase()
            };
            if haystack.contains(&needle) {
                matches.push(message);
                if options.limit.is_some_and(|limit| matches.len() >= limit) {
                    break;
                }
            }
        }
        matches
    }

    /// Every tool invocation recorded in assistant messages, in log order.
    pub async fn tool_usage(&self, path: &Path) -> Vec<ToolUsage> {
        let Some(mut reader) = self.open(path).await else {
            return Vec::new();
        };
        let mut usage = Vec::new();
        while let Some(message) = reader.next_message().await {
            let timestamp = message.timestamp().map(String::from);
            for (name, input) in message.tool_uses() {
                usage.push(ToolUsage {
                    tool_name: name.to_string(),
                    input: input.clone(),
                    timestamp: timestamp.clone(),
                });
            }
        }
        usage
    }

    /// Identity fields from the first user-or-assistant message plus the
    /// first and last timestamps of the log. `None` when the file has no chat
    /// messages (the last timestamp is only known once the file is exhausted).
    pub async fn session_metadata(&self, path: &Path) -> Option<SessionMetadata> {
        let mut reader = self.open(path).await?;
        let mut metadata: Option<SessionMetadata> = None;

        while let Some(message) = reader.next_message().await {
            let Some(record) = message.record() else {
                continue;
            };
            let entry = metadata.get_or_insert_with(|| SessionMetadata {
                session_id: record.session_id.clone(),
                version: record.version.clone(),
                cwd: record.cwd.clone(),
                git_branch: record.git_branch.clone(),
                ..SessionMetadata::default()
            });
            if let Some(timestamp) = &record.timestamp {
                if entry.first_timestamp.is_none() {
                    entry.first_timestamp = Some(timestamp.clone());
                }
                entry.last_timestamp = Some(timestamp.clone());
            }
        }
        metadata
    }

    /// Evict one cache entry, or everything if no path is given.
    pub fn clear_cache(&self, path: Option<&Path>) {
        if let Ok(mut cache) = self.cache.lock() {
            match path {
                Some(path) => {
                    cache.remove(path);
                }
                None => cache.clear(),
            }
        }
    }

    /// Start the periodic sweep that evicts expired entries at TTL
    /// granularity. Dropping (or stopping) the handle ends the sweep.
    pub fn start_sweeper(self: &Arc<Self>) -> SweeperHandle {
        let store = Arc::clone(self);
        let ttl = self.ttl;
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(ttl);
            // The immediate first tick; entries cannot have expired yet.
            tick.tick().await;
            loop {
                tick.tick().await;
                store.evict_expired();
            }
        });
        SweeperHandle { handle }
    }

    fn evict_expired(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            let before = cache.len();
            cache.retain(|_, entry| !entry.is_expired(self.ttl));
            let evicted = before - cache.len();
            if evicted > 0 {
                tracing::debug!(evicted, "swept expired transcript cache entries");
            }
        }
    }

    fn cached(&self, path: &Path) -> Option<Arc<Vec<TranscriptMessage>>> {
        let mut cache = self.cache.lock().ok()?;
        let entry = cache.get(path)?;
        if !entry.is_expired(self.ttl) {
            return Some(Arc::clone(&entry.messages));
        }
        // Lazy eviction on access; the sweep handles the rest.
        cache.remove(path);
        None
    }

    #[cfg(test)]
    fn cache_len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

/// The scan behind [`TranscriptStore::initial_message`]: stop pulling lines
/// the moment a user message turns up.
async fn first_user_text<R>(reader: &mut MessageReader<R>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(message) = reader.next_message().await {
        if message.is_user() {
            return Some(message.text());
        }
    }
    None
}

impl Default for TranscriptStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the background sweep task; aborts it on drop.
pub struct SweeperHandle {
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
