use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::images::ImageRecord;

/// Lifecycle transitions written to the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageEvent {
    ImageCreated,
    ImageApproved,
    ImageRegenerated,
}

#[derive(Serialize)]
struct JournalLine<'a> {
    #[serde(rename = "type")]
    event: ImageEvent,
    session_id: &'a str,
    ts: String,
    #[serde(flatten)]
    record: Map<String, Value>,
}

/// Append-only JSONL journal of image lifecycle events.
///
/// Each line carries `type`, `session_id`, `ts` and the record's fields,
/// with the record id renamed to `image_id`. Clones share one file handle.
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<JournalInner>,
}

#[derive(Debug)]
struct JournalInner {
    session_id: String,
    file: Mutex<File>,
}

impl EventWriter {
    /// Opens `path` for appending, creating parent directories as needed.
    pub fn open(path: impl Into<PathBuf>, session_id: impl Into<String>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open event journal {}", path.display()))?;
        Ok(Self {
            inner: Arc::new(JournalInner {
                session_id: session_id.into(),
                file: Mutex::new(file),
            }),
        })
    }

    pub fn record(&self, event: ImageEvent, record: &ImageRecord) -> anyhow::Result<()> {
        let mut fields = match serde_json::to_value(record)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Some(id) = fields.remove("id") {
            fields.insert("image_id".to_string(), id);
        }
        let line = JournalLine {
            event,
            session_id: &self.inner.session_id,
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            record: fields,
        };
        let mut encoded = serde_json::to_vec(&line)?;
        encoded.push(b'\n');

        let mut file = self
            .inner
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("event journal lock poisoned"))?;
        file.write_all(&encoded)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::thread;

    use chrono::DateTime;
    use serde_json::Value;

    use super::{EventWriter, ImageEvent};
    use crate::images::ImageRecord;

    fn record(id: &str) -> ImageRecord {
        ImageRecord {
            id: id.to_string(),
            prompt: "a red cube".to_string(),
            height: 512,
            width: 512,
            steps: 20,
            model: "fluently-xl".to_string(),
            explicit_model: false,
            image_url: "https://images.example/1.png".to_string(),
            degraded: false,
            approved: true,
            regenerated_from: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    fn read_lines(path: &std::path::Path) -> anyhow::Result<Vec<Value>> {
        let raw = fs::read_to_string(path)?;
        raw.lines()
            .map(|line| serde_json::from_str(line).map_err(anyhow::Error::from))
            .collect()
    }

    #[test]
    fn writes_one_flattened_line_per_event() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let writer = EventWriter::open(&path, "session-1")?;

        writer.record(ImageEvent::ImageApproved, &record("img-1"))?;

        let rows = read_lines(&path)?;
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["type"], Value::String("image_approved".to_string()));
        assert_eq!(row["session_id"], Value::String("session-1".to_string()));
        assert_eq!(row["image_id"], Value::String("img-1".to_string()));
        assert_eq!(row["approved"], Value::Bool(true));
        assert!(row.get("id").is_none());
        DateTime::parse_from_rfc3339(row["ts"].as_str().unwrap_or(""))?;
        Ok(())
    }

    #[test]
    fn open_creates_parent_dirs_and_appends_to_existing_file() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("events.jsonl");

        EventWriter::open(&path, "first")?.record(ImageEvent::ImageCreated, &record("a"))?;
        EventWriter::open(&path, "second")?.record(ImageEvent::ImageRegenerated, &record("b"))?;

        let sessions = read_lines(&path)?
            .iter()
            .filter_map(|row| row["session_id"].as_str().map(str::to_string))
            .collect::<Vec<String>>();
        assert_eq!(sessions, vec!["first", "second"]);
        Ok(())
    }

    #[test]
    fn concurrent_writers_never_interleave_lines() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let writer = EventWriter::open(&path, "session-1")?;

        let handles = (0..4)
            .map(|worker| {
                let writer = writer.clone();
                thread::spawn(move || {
                    for idx in 0..25 {
                        let _ = writer
                            .record(ImageEvent::ImageCreated, &record(&format!("{worker}-{idx}")));
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("writer thread panicked"))?;
        }

        assert_eq!(read_lines(&path)?.len(), 100);
        Ok(())
    }
}
