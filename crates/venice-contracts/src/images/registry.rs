use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

use super::record::{ImageDraft, ImageRecord};

/// Storage for generated image records.
///
/// Implementations must make every method atomic with respect to concurrent
/// callers and must never hand out an id twice.
pub trait ImageStore: Send + Sync {
    fn create(&self, draft: ImageDraft) -> anyhow::Result<ImageRecord>;
    fn get(&self, id: &str) -> anyhow::Result<Option<ImageRecord>>;
    /// Marks the record approved. Returns `None` when the id is unknown.
    fn approve(&self, id: &str) -> anyhow::Result<Option<ImageRecord>>;
    /// All records in creation order.
    fn snapshot(&self) -> anyhow::Result<Vec<ImageRecord>>;
}

/// Process-lifetime registry guarded by a single mutex.
#[derive(Debug, Default)]
pub struct InMemoryImageRegistry {
    records: Mutex<IndexMap<String, ImageRecord>>,
}

impl InMemoryImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, IndexMap<String, ImageRecord>>> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("image registry lock poisoned"))
    }
}

impl ImageStore for InMemoryImageRegistry {
    fn create(&self, draft: ImageDraft) -> anyhow::Result<ImageRecord> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut records = self.lock()?;
        let mut id = Uuid::new_v4().to_string();
        while records.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }
        let record = ImageRecord::from_draft(id.clone(), draft, created_at);
        records.insert(id, record.clone());
        Ok(record)
    }

    fn get(&self, id: &str) -> anyhow::Result<Option<ImageRecord>> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn approve(&self, id: &str) -> anyhow::Result<Option<ImageRecord>> {
        let mut records = self.lock()?;
        Ok(records.get_mut(id).map(|record| {
            record.approved = true;
            record.clone()
        }))
    }

    fn snapshot(&self) -> anyhow::Result<Vec<ImageRecord>> {
        Ok(self.lock()?.values().cloned().collect())
    }
}
