use super::PresetError;
use crate::clock::Clock;
use crate::state::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const HISTORY_KEY: &str = "searchHistory";
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub result_count: usize,
}

/// Bounded search log, newest entry first.
pub struct SearchHistory<S: KeyValueStore> {
    store: S,
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl<S: KeyValueStore> SearchHistory<S> {
    /// Load the persisted log. `limit` is at least one.
    pub fn load(store: S, limit: usize) -> Result<Self, PresetError> {
        let limit = limit.max(1);
        let mut entries: Vec<HistoryEntry> = match store.get(HISTORY_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discarding unreadable search history");
                Vec::new()
            }),
            None => Vec::new(),
        };
        entries.truncate(limit);
        Ok(Self {
            store,
            entries,
            limit,
        })
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a search; the oldest entries beyond the limit are dropped.
    /// On a storage error the log is left as it was.
    pub fn add_to_history(
        &mut self,
        query: &str,
        result_count: usize,
        clock: &dyn Clock,
    ) -> Result<&HistoryEntry, PresetError> {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            query: query.to_string(),
            timestamp: clock.now(),
            result_count,
        };
        let entries: Vec<HistoryEntry> = std::iter::once(entry)
            .chain(self.entries.iter().take(self.limit - 1).cloned())
            .collect();

        self.write(&entries)?;
        self.entries = entries;
        Ok(&self.entries[0])
    }

    /// Empty the log and drop the persisted copy.
    pub fn clear_history(&mut self) -> Result<(), PresetError> {
        self.entries.clear();
        self.store.remove(HISTORY_KEY)?;
        Ok(())
    }

    fn write(&mut self, entries: &[HistoryEntry]) -> Result<(), PresetError> {
        let json = serde_json::to_string(entries).map_err(PresetError::Serialize)?;
        self.store.set(HISTORY_KEY, &json)?;
        Ok(())
    }
}
