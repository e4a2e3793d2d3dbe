//! Saved filter presets and the search history log, both kept in local
//! storage under fixed keys.

mod history;
mod share;

pub use history::{DEFAULT_HISTORY_LIMIT, HISTORY_KEY, HistoryEntry, SearchHistory};
pub use share::{SharedFilter, decode_share_link, share_link};

use crate::clock::Clock;
use crate::export::Artifact;
use crate::state::{FilterState, KeyValueStore, StorageError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const PRESETS_KEY: &str = "savedFilters";

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("Not a valid filter preset: {0}")]
    InvalidPreset(#[source] serde_json::Error),
    #[error("No saved filter with id '{0}'")]
    NotFound(String),
    #[error("Invalid share link: {0}")]
    InvalidShareLink(String),
    #[error("Failed to serialize presets: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Named snapshot of a full filter state. Edit by saving a new preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPreset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub query: FilterState,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FilterPreset {
    pub fn new(name: impl Into<String>, query: FilterState, clock: &dyn Clock) -> Self {
        let now = clock.now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            query,
            is_public: false,
            created_by: String::new(),
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn created_by(mut self, user: impl Into<String>) -> Self {
        self.created_by = user.into();
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Saved presets, persisted after every change.
pub struct PresetStore<S: KeyValueStore> {
    store: S,
    presets: Vec<FilterPreset>,
}

impl<S: KeyValueStore> PresetStore<S> {
    /// Load saved presets. Corrupt data is logged and treated as empty.
    pub fn load(store: S) -> Result<Self, PresetError> {
        let presets = match store.get(PRESETS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discarding unreadable saved filters");
                Vec::new()
            }),
            None => Vec::new(),
        };
        Ok(Self { store, presets })
    }

    pub fn presets(&self) -> &[FilterPreset] {
        &self.presets
    }

    pub fn get(&self, id: &str) -> Option<&FilterPreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Append `preset`. Names need not be unique.
    pub fn save_filter(&mut self, preset: FilterPreset) -> Result<&FilterPreset, PresetError> {
        self.presets.push(preset);
        if let Err(e) = self.persist() {
            self.presets.pop();
            return Err(e);
        }
        let idx = self.presets.len() - 1;
        Ok(&self.presets[idx])
    }

    /// Remove by id; returns whether anything was removed.
    pub fn delete_filter(&mut self, id: &str) -> Result<bool, PresetError> {
        let before = self.presets.len();
        self.presets.retain(|p| p.id != id);
        if self.presets.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Standalone JSON file for one preset.
    pub fn export_preset(&self, id: &str) -> Result<Artifact, PresetError> {
        let preset = self
            .get(id)
            .ok_or_else(|| PresetError::NotFound(id.to_string()))?;
        let body = serde_json::to_vec_pretty(preset).map_err(PresetError::Serialize)?;
        Ok(Artifact {
            filename: format!("filter-{}.json", slug(&preset.name)),
            mime_type: "application/json".to_string(),
            bytes: body,
        })
    }

    /// Append a preset read from an exported file. Either the preset is
    /// added and persisted, or the saved list is left untouched.
    pub fn import_preset(&mut self, bytes: &[u8]) -> Result<&FilterPreset, PresetError> {
        let preset: FilterPreset =
            serde_json::from_slice(bytes).map_err(PresetError::InvalidPreset)?;
        self.save_filter(preset)
    }

    fn persist(&mut self) -> Result<(), PresetError> {
        let json = serde_json::to_string(&self.presets).map_err(PresetError::Serialize)?;
        self.store.set(PRESETS_KEY, &json)?;
        Ok(())
    }
}

fn slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "preset".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_file_name_safe() {
        assert_eq!(slug("Mail / MX (prod)"), "mail---mx--prod");
        assert_eq!(slug("***"), "preset");
    }
}
