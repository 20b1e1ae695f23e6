//! JSONL transcript of pipeline events.
//!
//! Each [`ConversationEvent`] becomes one line carrying its payload fields
//! plus `type`, `seq` and an RFC3339 `timestamp`. Lines from concurrent
//! questions interleave; `question_id` in the payload tells them apart.

use retail_application::{ConversationEvent, ConversationLogger};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::warn;

/// Append-only JSONL conversation logger.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Every line is flushed as it is
/// written; a failed write is reported once through `tracing` and then
/// ignored.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    seq: AtomicU64,
    write_failed: AtomicBool,
}

impl JsonlConversationLogger {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
            seq: AtomicU64::new(0),
            write_failed: Default::default(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&self, event: ConversationEvent) -> serde_json::Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);

        let mut map = match event.payload {
            serde_json::Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.insert("type".to_string(), event.event_type.into());
        map.insert("seq".to_string(), seq.into());
        map.insert("timestamp".to_string(), timestamp.into());
        serde_json::Value::Object(map)
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let record = self.record(event);
        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        let result = writeln!(writer, "{}", line).and_then(|_| writer.flush());
        if let Err(e) = result
            && !self.write_failed.swap(true, Ordering::Relaxed)
        {
            warn!(
                "Conversation log {} is no longer being written: {}",
                self.path.display(),
                e
            );
        }
    }
}
