pub mod record;

pub use record::ActivityRecord;

use crate::registry::ActivityType;
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_STORAGE_KEY: &str = "babyActivities";

/// Opaque string key-value persistence, the same contract a browser's local
/// storage offers.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Insertion-ordered activity collection persisted as one JSON array.
///
/// Every mutation swaps in a new sequence and rewrites the whole entry, so a
/// snapshot taken before a mutation stays intact.
pub struct ActivityStore {
    backend: Box<dyn KeyValueStore>,
    key: String,
    records: Arc<Vec<ActivityRecord>>,
}

impl ActivityStore {
    pub fn load(backend: Box<dyn KeyValueStore>, key: &str) -> Result<Self> {
        let mut store = Self {
            backend,
            key: key.to_string(),
            records: Arc::new(Vec::new()),
        };
        store.refresh()?;

        Ok(store)
    }

    /// Re-reads the persisted entry. Other processes may share the backend,
    /// so every mutation starts from what is stored, not from memory.
    pub fn refresh(&mut self) -> Result<()> {
        let raw = self
            .backend
            .get(&self.key)
            .with_context(|| format!("Failed to read activity entry: {}", self.key))?;
        self.records = Arc::new(raw.as_deref().map(parse_records).unwrap_or_default());

        Ok(())
    }

    pub fn all(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn snapshot(&self) -> Arc<Vec<ActivityRecord>> {
        Arc::clone(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn find(&self, id: &str) -> Option<&ActivityRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn add(&mut self, record: ActivityRecord) -> Result<()> {
        self.refresh()?;
        if self.find(&record.id).is_some() {
            bail!("Activity id already exists: {}", record.id);
        }

        info!(
            id = %record.id,
            activity_type = %record.activity_type,
            "activity added"
        );

        let next = self
            .records
            .iter()
            .cloned()
            .chain(std::iter::once(record))
            .collect::<Vec<_>>();
        self.replace(next)
    }

    pub fn remove_by_id(&mut self, id: &str) -> Result<Option<ActivityRecord>> {
        self.refresh()?;
        let Some(removed) = self.find(id).cloned() else {
            return Ok(None);
        };

        let next = self
            .records
            .iter()
            .filter(|record| record.id != id)
            .cloned()
            .collect::<Vec<_>>();
        self.replace(next)?;

        info!(id, activity_type = %removed.activity_type, "activity removed");
        Ok(Some(removed))
    }

    pub fn remove_by_type(&mut self, activity_type: ActivityType) -> Result<usize> {
        self.refresh()?;
        let next = self
            .records
            .iter()
            .filter(|record| record.activity_type != activity_type)
            .cloned()
            .collect::<Vec<_>>();
        let removed = self.records.len() - next.len();
        self.replace(next)?;

        info!(activity_type = %activity_type, count = removed, "activities cleared by type");
        Ok(removed)
    }

    /// Drops every record and the persisted entry itself.
    pub fn clear(&mut self) -> Result<usize> {
        let removed = self.records.len();
        self.backend
            .remove(&self.key)
            .with_context(|| format!("Failed to remove activity entry: {}", self.key))?;
        self.records = Arc::new(Vec::new());

        info!(count = removed, "all activities cleared");
        Ok(removed)
    }

    fn replace(&mut self, next: Vec<ActivityRecord>) -> Result<()> {
        let content =
            serde_json::to_string(&next).context("Failed to serialize activity records")?;
        self.backend
            .set(&self.key, &content)
            .with_context(|| format!("Failed to write activity entry: {}", self.key))?;
        self.records = Arc::new(next);

        Ok(())
    }
}

fn parse_records(raw: &str) -> Vec<ActivityRecord> {
    serde_json::from_str(raw).unwrap_or_else(|error| {
        warn!(error = %error, "stored activities are malformed; starting with an empty list");
        Vec::new()
    })
}
