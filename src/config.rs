use crate::export::{DateFormat, Delimiter, ExportOptions};
use crate::presets::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub storage: StorageRules,
    pub history: HistoryRules,
    pub export: ExportRules,
    pub share: ShareRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageRules {
    /// Directory of the file-backed key/value store.
    pub dir: PathBuf,
    /// Key the active filter state is persisted under.
    pub state_key: String,
    /// Mirror the filter state into the `filter` URL parameter.
    pub url_persistence: bool,
}

impl Default for StorageRules {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".dns-query-filter"),
            state_key: "recordFilters".to_string(),
            url_persistence: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryRules {
    pub limit: usize,
}

impl Default for HistoryRules {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRules {
    pub delimiter: Delimiter,
    pub date_format: DateFormat,
    pub include_headers: bool,
    pub include_metadata: bool,
    pub out_dir: PathBuf,
}

impl Default for ExportRules {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            date_format: DateFormat::Iso,
            include_headers: true,
            include_metadata: false,
            out_dir: PathBuf::from("."),
        }
    }
}

impl ExportRules {
    pub fn to_options(&self) -> ExportOptions {
        ExportOptions::new()
            .delimiter(self.delimiter)
            .date_format(self.date_format)
            .include_headers(self.include_headers)
            .include_metadata(self.include_metadata)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareRules {
    pub origin: String,
    pub path: String,
}

impl Default for ShareRules {
    fn default() -> Self {
        Self {
            origin: "http://localhost:5380".to_string(),
            path: String::new(),
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FilterConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<FilterConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<FilterConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static FilterConfig {
    static DEFAULT_CONFIG: LazyLock<FilterConfig> = LazyLock::new(FilterConfig::default);
    &DEFAULT_CONFIG
}
